//! Dalvik executable (dex) container model.
//!
//! This module reads the parts of a dex file needed to list and describe its
//! classes:
//!
//! 1. The header locates the id tables (strings, types, protos, fields,
//!    methods) and the class definitions
//! 2. [`Dex::classes`] walks the class definitions lazily, resolving only
//!    the class name
//! 3. [`ClassDef::load`] resolves the full [`DexClass`] (members,
//!    annotations and code) when a writer actually needs it
//!
//! Bytecode is kept as raw code units; nothing here interprets instructions.

mod model;
mod reader;

#[cfg(test)]
pub(crate) mod fixture;

use crate::error::{Error, Result};
use reader::ByteReader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

pub use model::{
    descriptor_to_java, AccessFlags, CodeItem, DexClass, DexField, DexMethod, MemberKind, NO_INDEX,
};

/// Magic prefix of every dex file; followed by a three digit version and NUL
const DEX_MAGIC: &[u8; 4] = b"dex\n";

/// Size of the fixed header
const HEADER_SIZE: usize = 0x70;

const STRING_ID_SIZE: usize = 4;
const TYPE_ID_SIZE: usize = 4;
const PROTO_ID_SIZE: usize = 12;
const FIELD_ID_SIZE: usize = 8;
const METHOD_ID_SIZE: usize = 8;
const CLASS_DEF_SIZE: usize = 32;

/// Location of one id table
#[derive(Debug, Clone, Copy)]
struct Section {
    size: u32,
    offset: u32,
}

impl Section {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            size: reader.u32()?,
            offset: reader.u32()?,
        })
    }

    fn validate(&self, name: &str, item_size: usize, data_len: usize) -> Result<()> {
        let end = (self.size as usize)
            .checked_mul(item_size)
            .and_then(|len| len.checked_add(self.offset as usize));
        match end {
            Some(end) if end <= data_len => Ok(()),
            _ => Err(Error::invalid_container(
                self.offset as usize,
                format!("{} table ({} entries) exceeds file size", name, self.size),
            )),
        }
    }

    fn item_offset(&self, name: &str, index: u32, item_size: usize) -> Result<usize> {
        if index >= self.size {
            return Err(Error::invalid_container(
                self.offset as usize,
                format!("{} index {} out of range ({} entries)", name, index, self.size),
            ));
        }
        Ok(self.offset as usize + index as usize * item_size)
    }
}

#[derive(Debug, Clone)]
struct Header {
    version: String,
    string_ids: Section,
    type_ids: Section,
    proto_ids: Section,
    field_ids: Section,
    method_ids: Section,
    class_defs: Section,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::invalid_container(
                0,
                format!("file too small for a dex header ({} bytes)", data.len()),
            ));
        }
        if &data[..4] != DEX_MAGIC || data[7] != 0 {
            return Err(Error::invalid_container(0, "bad dex magic"));
        }
        let version = String::from_utf8_lossy(&data[4..7]).into_owned();

        let mut reader = ByteReader::at(data, 0x38)?;
        let header = Self {
            version,
            string_ids: Section::read(&mut reader)?,
            type_ids: Section::read(&mut reader)?,
            proto_ids: Section::read(&mut reader)?,
            field_ids: Section::read(&mut reader)?,
            method_ids: Section::read(&mut reader)?,
            class_defs: Section::read(&mut reader)?,
        };

        header.string_ids.validate("string_ids", STRING_ID_SIZE, data.len())?;
        header.type_ids.validate("type_ids", TYPE_ID_SIZE, data.len())?;
        header.proto_ids.validate("proto_ids", PROTO_ID_SIZE, data.len())?;
        header.field_ids.validate("field_ids", FIELD_ID_SIZE, data.len())?;
        header.method_ids.validate("method_ids", METHOD_ID_SIZE, data.len())?;
        header.class_defs.validate("class_defs", CLASS_DEF_SIZE, data.len())?;

        Ok(header)
    }
}

/// Raw class_def_item
#[derive(Debug, Clone, Copy)]
struct RawClassDef {
    class_idx: u32,
    access_flags: u32,
    superclass_idx: u32,
    interfaces_off: u32,
    source_file_idx: u32,
    annotations_off: u32,
    class_data_off: u32,
}

/// A parsed dex file
///
/// The whole image is held in memory; the file handle used to read it is
/// released as soon as [`Dex::open`] returns.
#[derive(Debug, Clone)]
pub struct Dex {
    data: Vec<u8>,
    header: Header,
}

impl Dex {
    /// Reads and parses a dex file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_reader(file).map_err(|e| match e {
            Error::FileRead { source, .. } => Error::file_read(path, source),
            other => other,
        })
    }

    /// Reads and parses a dex image from any byte source
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| Error::file_read("<stream>", e))?;
        Self::from_bytes(data)
    }

    /// Parses a dex image held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let header = Header::parse(&data)?;
        debug!(
            "Parsed dex v{} header: {} strings, {} types, {} classes",
            header.version, header.string_ids.size, header.type_ids.size, header.class_defs.size
        );
        Ok(Self { data, header })
    }

    /// The format version from the magic, e.g. `035`
    pub fn version(&self) -> &str {
        &self.header.version
    }

    /// Number of class definitions
    pub fn class_count(&self) -> usize {
        self.header.class_defs.size as usize
    }

    /// Iterates over the class definitions in file order
    pub fn classes(&self) -> Classes<'_> {
        Classes {
            dex: self,
            next: 0,
        }
    }

    fn reader_at(&self, offset: usize) -> Result<ByteReader<'_>> {
        ByteReader::at(&self.data, offset)
    }

    /// Resolves a string by index
    pub fn string(&self, index: u32) -> Result<String> {
        let id_off = self
            .header
            .string_ids
            .item_offset("string", index, STRING_ID_SIZE)?;
        let data_off = self.reader_at(id_off)?.u32()? as usize;

        let mut reader = self.reader_at(data_off)?;
        let _utf16_len = reader.uleb128()?;
        reader.mutf8()
    }

    /// Resolves the raw descriptor of a type, e.g. `Lcom/a/B;`
    pub fn type_descriptor(&self, index: u32) -> Result<String> {
        let off = self.header.type_ids.item_offset("type", index, TYPE_ID_SIZE)?;
        let string_idx = self.reader_at(off)?.u32()?;
        self.string(string_idx)
    }

    /// Resolves a type to its dotted Java name
    pub fn type_name(&self, index: u32) -> Result<String> {
        Ok(descriptor_to_java(&self.type_descriptor(index)?))
    }

    fn optional_type_name(&self, index: u32) -> Result<Option<String>> {
        if index == NO_INDEX {
            return Ok(None);
        }
        self.type_name(index).map(Some)
    }

    fn optional_string(&self, index: u32) -> Result<Option<String>> {
        if index == NO_INDEX {
            return Ok(None);
        }
        self.string(index).map(Some)
    }

    /// Reads a type_list (u32 count followed by u16 type indices)
    fn type_list(&self, offset: u32) -> Result<Vec<String>> {
        if offset == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader_at(offset as usize)?;
        let size = reader.u32()?;
        let mut indices = Vec::new();
        for _ in 0..size {
            indices.push(reader.u16()?);
        }
        indices
            .into_iter()
            .map(|idx| self.type_name(idx as u32))
            .collect()
    }

    /// Returns (return type, parameter types) of a prototype
    fn proto(&self, index: u32) -> Result<(String, Vec<String>)> {
        let off = self.header.proto_ids.item_offset("proto", index, PROTO_ID_SIZE)?;
        let mut reader = self.reader_at(off)?;
        let _shorty_idx = reader.u32()?;
        let return_type_idx = reader.u32()?;
        let parameters_off = reader.u32()?;
        Ok((self.type_name(return_type_idx)?, self.type_list(parameters_off)?))
    }

    /// Returns (name, type) of a field id
    fn field_id(&self, index: u32) -> Result<(String, String)> {
        let off = self.header.field_ids.item_offset("field", index, FIELD_ID_SIZE)?;
        let mut reader = self.reader_at(off)?;
        let _class_idx = reader.u16()?;
        let type_idx = reader.u16()?;
        let name_idx = reader.u32()?;
        Ok((self.string(name_idx)?, self.type_name(type_idx as u32)?))
    }

    /// Returns (name, proto index) of a method id
    fn method_id(&self, index: u32) -> Result<(String, u32)> {
        let off = self.header.method_ids.item_offset("method", index, METHOD_ID_SIZE)?;
        let mut reader = self.reader_at(off)?;
        let _class_idx = reader.u16()?;
        let proto_idx = reader.u16()?;
        let name_idx = reader.u32()?;
        Ok((self.string(name_idx)?, proto_idx as u32))
    }

    fn raw_class_def(&self, index: u32) -> Result<RawClassDef> {
        let off = self
            .header
            .class_defs
            .item_offset("class_def", index, CLASS_DEF_SIZE)?;
        let mut reader = self.reader_at(off)?;
        Ok(RawClassDef {
            class_idx: reader.u32()?,
            access_flags: reader.u32()?,
            superclass_idx: reader.u32()?,
            interfaces_off: reader.u32()?,
            source_file_idx: reader.u32()?,
            annotations_off: reader.u32()?,
            class_data_off: reader.u32()?,
        })
    }

    /// Reads an annotation_set_item and returns the annotation type names
    fn annotation_set(&self, offset: u32) -> Result<Vec<String>> {
        if offset == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader_at(offset as usize)?;
        let size = reader.u32()?;
        let mut item_offsets = Vec::new();
        for _ in 0..size {
            item_offsets.push(reader.u32()?);
        }

        item_offsets
            .into_iter()
            .map(|item_off| {
                let mut item = self.reader_at(item_off as usize)?;
                let _visibility = item.u8()?;
                let type_idx = item.uleb128()?;
                self.type_name(type_idx)
            })
            .collect()
    }

    /// Reads an annotations_directory_item.
    ///
    /// Returns the class annotations and (method index, annotations) pairs.
    fn annotations_directory(&self, offset: u32) -> Result<(Vec<String>, Vec<(u32, Vec<String>)>)> {
        if offset == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut reader = self.reader_at(offset as usize)?;
        let class_annotations_off = reader.u32()?;
        let fields_size = reader.u32()?;
        let methods_size = reader.u32()?;
        let _parameters_size = reader.u32()?;

        // field_annotation entries are (field_idx, annotations_off)
        reader.bytes(fields_size as usize * 8)?;

        let mut method_annotations = Vec::new();
        for _ in 0..methods_size {
            let method_idx = reader.u32()?;
            let annotations_off = reader.u32()?;
            method_annotations.push((method_idx, self.annotation_set(annotations_off)?));
        }

        Ok((self.annotation_set(class_annotations_off)?, method_annotations))
    }

    fn code_item(&self, offset: u32) -> Result<Option<CodeItem>> {
        if offset == 0 {
            return Ok(None);
        }
        let mut reader = self.reader_at(offset as usize)?;
        let registers = reader.u16()?;
        let _ins = reader.u16()?;
        let _outs = reader.u16()?;
        let _tries = reader.u16()?;
        let _debug_info_off = reader.u32()?;
        let insns_size = reader.u32()? as usize;

        let byte_len = insns_size
            .checked_mul(2)
            .ok_or_else(|| Error::invalid_container(reader.position(), "code item too large"))?;
        let raw = reader.bytes(byte_len)?;
        let instructions = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Some(CodeItem {
            registers,
            instructions,
        }))
    }

    fn load_class(&self, index: u32) -> Result<DexClass> {
        let raw = self.raw_class_def(index)?;
        trace!("Loading class_def {} (type {})", index, raw.class_idx);

        let (annotations, method_annotations) = self.annotations_directory(raw.annotations_off)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        if raw.class_data_off != 0 {
            let mut reader = self.reader_at(raw.class_data_off as usize)?;
            let static_fields = reader.uleb128()?;
            let instance_fields = reader.uleb128()?;
            let direct_methods = reader.uleb128()?;
            let virtual_methods = reader.uleb128()?;

            for count in [static_fields, instance_fields] {
                let mut field_idx = 0u32;
                for _ in 0..count {
                    field_idx = field_idx.wrapping_add(reader.uleb128()?);
                    let access_flags = AccessFlags(reader.uleb128()?);
                    let (name, type_name) = self.field_id(field_idx)?;
                    fields.push(DexField {
                        name,
                        type_name,
                        access_flags,
                    });
                }
            }

            for count in [direct_methods, virtual_methods] {
                let mut method_idx = 0u32;
                for _ in 0..count {
                    method_idx = method_idx.wrapping_add(reader.uleb128()?);
                    let access_flags = AccessFlags(reader.uleb128()?);
                    let code_off = reader.uleb128()?;

                    let (name, proto_idx) = self.method_id(method_idx)?;
                    let (return_type, parameters) = self.proto(proto_idx)?;
                    let annotations = method_annotations
                        .iter()
                        .find(|(idx, _)| *idx == method_idx)
                        .map(|(_, names)| names.clone())
                        .unwrap_or_default();

                    methods.push(DexMethod {
                        name,
                        return_type,
                        parameters,
                        access_flags,
                        annotations,
                        code: self.code_item(code_off)?,
                    });
                }
            }
        }

        Ok(DexClass {
            name: self.type_name(raw.class_idx)?,
            access_flags: AccessFlags(raw.access_flags),
            superclass: self.optional_type_name(raw.superclass_idx)?,
            interfaces: self.type_list(raw.interfaces_off)?,
            source_file: self.optional_string(raw.source_file_idx)?,
            annotations,
            fields,
            methods,
        })
    }
}

/// Handle to one class definition with its name already resolved
#[derive(Debug, Clone)]
pub struct ClassDef<'a> {
    dex: &'a Dex,
    index: u32,
    name: String,
}

impl ClassDef<'_> {
    /// Fully qualified, dotted class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the full class definition
    pub fn load(&self) -> Result<DexClass> {
        self.dex.load_class(self.index)
    }
}

/// Lazy iterator over the classes of a [`Dex`]
#[derive(Debug, Clone)]
pub struct Classes<'a> {
    dex: &'a Dex,
    next: u32,
}

impl<'a> Iterator for Classes<'a> {
    type Item = Result<ClassDef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dex.header.class_defs.size {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let class = self.dex.raw_class_def(index).and_then(|raw| {
            Ok(ClassDef {
                dex: self.dex,
                index,
                name: self.dex.type_name(raw.class_idx)?,
            })
        });
        Some(class)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dex.header.class_defs.size.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::DexBuilder;
    use super::*;

    fn sample() -> Dex {
        let mut builder = DexBuilder::new();
        builder.class("Lx/Y;");
        builder.field("Lx/Y;", "count", "I", AccessFlags::PRIVATE);
        builder.method(
            "Lx/Y;",
            "run",
            "V",
            &["Ljava/lang/String;", "I"],
            AccessFlags::PUBLIC,
            Some(vec![0x1012, 0x000e]),
        );
        builder.class("Lx/Z;");
        builder.class("Lq/R;");
        Dex::from_bytes(builder.build()).unwrap()
    }

    #[test]
    fn test_class_names_in_order() {
        let dex = sample();
        let names: Vec<String> = dex
            .classes()
            .map(|c| c.unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x.Y", "x.Z", "q.R"]);
        assert_eq!(dex.class_count(), 3);
        assert_eq!(dex.version(), "035");
    }

    #[test]
    fn test_load_class_members() {
        let dex = sample();
        let class = dex.classes().next().unwrap().unwrap().load().unwrap();

        assert_eq!(class.name, "x.Y");
        assert_eq!(class.superclass.as_deref(), Some("java.lang.Object"));
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].name, "count");
        assert_eq!(class.fields[0].type_name, "int");

        assert_eq!(class.methods.len(), 1);
        let method = &class.methods[0];
        assert_eq!(method.name, "run");
        assert_eq!(method.return_type, "void");
        assert_eq!(method.parameters, vec!["java.lang.String", "int"]);
        assert_eq!(
            method.code.as_ref().unwrap().instructions,
            vec![0x1012, 0x000e]
        );
    }

    #[test]
    fn test_classes_are_restartable() {
        let dex = sample();
        assert_eq!(dex.classes().count(), 3);
        assert_eq!(dex.classes().count(), 3);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = DexBuilder::new().build();
        bytes[0] = b'x';
        assert!(matches!(
            Dex::from_bytes(bytes),
            Err(Error::InvalidContainer { offset: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        assert!(Dex::from_bytes(b"dex\n035\0".to_vec()).is_err());

        let mut builder = DexBuilder::new();
        builder.class("Lx/Y;");
        let mut bytes = builder.build();
        bytes.truncate(HEADER_SIZE + 4);
        assert!(Dex::from_bytes(bytes).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let err = Dex::open("/definitely/not/here.dex").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.is_recoverable());
    }
}
