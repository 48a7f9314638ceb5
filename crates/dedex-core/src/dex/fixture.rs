//! Builds small but well-formed dex images for tests.

use super::model::{AccessFlags, NO_INDEX};
use super::HEADER_SIZE;

struct MethodDraft {
    method_idx: u32,
    access: u32,
    code: Option<Vec<u16>>,
    annotations: Vec<u32>,
}

struct ClassDraft {
    descriptor: String,
    type_idx: u32,
    superclass: u32,
    access: u32,
    source_file: u32,
    annotations: Vec<u32>,
    fields: Vec<(u32, u32)>,
    methods: Vec<MethodDraft>,
}

/// Assembles a dex image from classes, fields and methods
#[derive(Default)]
pub(crate) struct DexBuilder {
    strings: Vec<String>,
    types: Vec<u32>,
    protos: Vec<(u32, Vec<u32>)>,
    fields: Vec<(u32, u32, u32)>,
    methods: Vec<(u32, u32, u32)>,
    classes: Vec<ClassDraft>,
}

impl DexBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn string(&mut self, s: &str) -> u32 {
        if let Some(idx) = self.strings.iter().position(|existing| existing == s) {
            return idx as u32;
        }
        self.strings.push(s.to_string());
        (self.strings.len() - 1) as u32
    }

    fn type_id(&mut self, descriptor: &str) -> u32 {
        let string_idx = self.string(descriptor);
        if let Some(idx) = self.types.iter().position(|&s| s == string_idx) {
            return idx as u32;
        }
        self.types.push(string_idx);
        (self.types.len() - 1) as u32
    }

    fn class_mut(&mut self, descriptor: &str) -> &mut ClassDraft {
        self.classes
            .iter_mut()
            .find(|c| c.descriptor == descriptor)
            .expect("class must be added before its members")
    }

    /// Adds a public class extending `java.lang.Object`
    pub(crate) fn class(&mut self, descriptor: &str) -> &mut Self {
        let type_idx = self.type_id(descriptor);
        let superclass = self.type_id("Ljava/lang/Object;");
        self.classes.push(ClassDraft {
            descriptor: descriptor.to_string(),
            type_idx,
            superclass,
            access: AccessFlags::PUBLIC,
            source_file: NO_INDEX,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        });
        self
    }

    pub(crate) fn source_file(&mut self, class: &str, name: &str) -> &mut Self {
        let idx = self.string(name);
        self.class_mut(class).source_file = idx;
        self
    }

    pub(crate) fn class_annotation(&mut self, class: &str, annotation: &str) -> &mut Self {
        let idx = self.type_id(annotation);
        self.class_mut(class).annotations.push(idx);
        self
    }

    pub(crate) fn field(&mut self, class: &str, name: &str, type_desc: &str, access: u32) -> &mut Self {
        let class_idx = self.type_id(class);
        let type_idx = self.type_id(type_desc);
        let name_idx = self.string(name);
        self.fields.push((class_idx, type_idx, name_idx));
        let field_idx = (self.fields.len() - 1) as u32;
        self.class_mut(class).fields.push((field_idx, access));
        self
    }

    pub(crate) fn method(
        &mut self,
        class: &str,
        name: &str,
        return_desc: &str,
        params: &[&str],
        access: u32,
        code: Option<Vec<u16>>,
    ) -> &mut Self {
        let class_idx = self.type_id(class);
        let return_idx = self.type_id(return_desc);
        let param_idx: Vec<u32> = params.iter().map(|p| self.type_id(p)).collect();
        self.protos.push((return_idx, param_idx));
        let proto_idx = (self.protos.len() - 1) as u32;
        let name_idx = self.string(name);
        self.methods.push((class_idx, proto_idx, name_idx));
        let method_idx = (self.methods.len() - 1) as u32;
        self.class_mut(class).methods.push(MethodDraft {
            method_idx,
            access,
            code,
            annotations: Vec::new(),
        });
        self
    }

    /// Annotates the most recently added method of `class`
    pub(crate) fn method_annotation(&mut self, class: &str, annotation: &str) -> &mut Self {
        let idx = self.type_id(annotation);
        if let Some(method) = self.class_mut(class).methods.last_mut() {
            method.annotations.push(idx);
        }
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let string_ids_off = HEADER_SIZE;
        let type_ids_off = string_ids_off + 4 * self.strings.len();
        let proto_ids_off = type_ids_off + 4 * self.types.len();
        let field_ids_off = proto_ids_off + 12 * self.protos.len();
        let method_ids_off = field_ids_off + 8 * self.fields.len();
        let class_defs_off = method_ids_off + 8 * self.methods.len();
        let data_off = class_defs_off + 32 * self.classes.len();

        let mut out = vec![0u8; data_off];
        out[..8].copy_from_slice(b"dex\n035\0");
        let tables = [
            (self.strings.len(), string_ids_off),
            (self.types.len(), type_ids_off),
            (self.protos.len(), proto_ids_off),
            (self.fields.len(), field_ids_off),
            (self.methods.len(), method_ids_off),
            (self.classes.len(), class_defs_off),
        ];
        for (i, (size, off)) in tables.iter().enumerate() {
            put_u32(&mut out, 0x38 + i * 8, *size as u32);
            put_u32(&mut out, 0x3C + i * 8, *off as u32);
        }

        for (i, s) in self.strings.iter().enumerate() {
            let off = out.len();
            push_uleb(&mut out, s.encode_utf16().count() as u32);
            out.extend_from_slice(s.as_bytes());
            out.push(0);
            put_u32(&mut out, string_ids_off + 4 * i, off as u32);
        }

        for (i, &string_idx) in self.types.iter().enumerate() {
            put_u32(&mut out, type_ids_off + 4 * i, string_idx);
        }

        for (i, (return_idx, params)) in self.protos.iter().enumerate() {
            let params_off = if params.is_empty() {
                0
            } else {
                align4(&mut out);
                let off = out.len();
                push_u32(&mut out, params.len() as u32);
                for &p in params {
                    push_u16(&mut out, p as u16);
                }
                off
            };
            let base = proto_ids_off + 12 * i;
            put_u32(&mut out, base, 0);
            put_u32(&mut out, base + 4, *return_idx);
            put_u32(&mut out, base + 8, params_off as u32);
        }

        for (i, &(class_idx, type_idx, name_idx)) in self.fields.iter().enumerate() {
            let base = field_ids_off + 8 * i;
            put_u16(&mut out, base, class_idx as u16);
            put_u16(&mut out, base + 2, type_idx as u16);
            put_u32(&mut out, base + 4, name_idx);
        }

        for (i, &(class_idx, proto_idx, name_idx)) in self.methods.iter().enumerate() {
            let base = method_ids_off + 8 * i;
            put_u16(&mut out, base, class_idx as u16);
            put_u16(&mut out, base + 2, proto_idx as u16);
            put_u32(&mut out, base + 4, name_idx);
        }

        for (i, class) in self.classes.iter().enumerate() {
            let code_offsets: Vec<u32> = class
                .methods
                .iter()
                .map(|m| match &m.code {
                    Some(units) => write_code(&mut out, units),
                    None => 0,
                })
                .collect();

            let annotations_off = write_annotations(&mut out, class);

            let is_static = |access: u32| access & AccessFlags::STATIC != 0;
            let is_direct = |access: u32| {
                access & (AccessFlags::STATIC | AccessFlags::PRIVATE | AccessFlags::CONSTRUCTOR) != 0
            };

            let static_fields: Vec<_> = class.fields.iter().filter(|f| is_static(f.1)).collect();
            let instance_fields: Vec<_> = class.fields.iter().filter(|f| !is_static(f.1)).collect();
            let methods: Vec<_> = class.methods.iter().zip(code_offsets).collect();
            let direct: Vec<_> = methods.iter().filter(|(m, _)| is_direct(m.access)).collect();
            let virtual_: Vec<_> = methods.iter().filter(|(m, _)| !is_direct(m.access)).collect();

            let class_data_off = if class.fields.is_empty() && class.methods.is_empty() {
                0
            } else {
                let off = out.len();
                push_uleb(&mut out, static_fields.len() as u32);
                push_uleb(&mut out, instance_fields.len() as u32);
                push_uleb(&mut out, direct.len() as u32);
                push_uleb(&mut out, virtual_.len() as u32);
                for list in [&static_fields, &instance_fields] {
                    let mut prev = 0;
                    for &&(idx, access) in list.iter() {
                        push_uleb(&mut out, idx - prev);
                        push_uleb(&mut out, access);
                        prev = idx;
                    }
                }
                for list in [&direct, &virtual_] {
                    let mut prev = 0;
                    for (method, code_off) in list.iter() {
                        push_uleb(&mut out, method.method_idx - prev);
                        push_uleb(&mut out, method.access);
                        push_uleb(&mut out, *code_off);
                        prev = method.method_idx;
                    }
                }
                off as u32
            };

            let base = class_defs_off + 32 * i;
            put_u32(&mut out, base, class.type_idx);
            put_u32(&mut out, base + 4, class.access);
            put_u32(&mut out, base + 8, class.superclass);
            put_u32(&mut out, base + 12, 0);
            put_u32(&mut out, base + 16, class.source_file);
            put_u32(&mut out, base + 20, annotations_off);
            put_u32(&mut out, base + 24, class_data_off);
            put_u32(&mut out, base + 28, 0);
        }

        out
    }
}

fn write_code(out: &mut Vec<u8>, units: &[u16]) -> u32 {
    align4(out);
    let off = out.len();
    push_u16(out, 4); // registers
    push_u16(out, 1); // ins
    push_u16(out, 0); // outs
    push_u16(out, 0); // tries
    push_u32(out, 0); // debug info
    push_u32(out, units.len() as u32);
    for &unit in units {
        push_u16(out, unit);
    }
    off as u32
}

fn write_annotation_set(out: &mut Vec<u8>, types: &[u32]) -> u32 {
    if types.is_empty() {
        return 0;
    }
    let items: Vec<u32> = types
        .iter()
        .map(|&type_idx| {
            let off = out.len();
            out.push(1); // runtime visibility
            push_uleb(out, type_idx);
            push_uleb(out, 0); // no elements
            off as u32
        })
        .collect();

    align4(out);
    let off = out.len();
    push_u32(out, items.len() as u32);
    for item in items {
        push_u32(out, item);
    }
    off as u32
}

fn write_annotations(out: &mut Vec<u8>, class: &ClassDraft) -> u32 {
    let annotated: Vec<&MethodDraft> = class
        .methods
        .iter()
        .filter(|m| !m.annotations.is_empty())
        .collect();
    if class.annotations.is_empty() && annotated.is_empty() {
        return 0;
    }

    let class_set = write_annotation_set(out, &class.annotations);
    let method_sets: Vec<(u32, u32)> = annotated
        .iter()
        .map(|m| (m.method_idx, write_annotation_set(out, &m.annotations)))
        .collect();

    align4(out);
    let off = out.len();
    push_u32(out, class_set);
    push_u32(out, 0); // fields
    push_u32(out, method_sets.len() as u32);
    push_u32(out, 0); // parameters
    for (method_idx, set_off) in method_sets {
        push_u32(out, method_idx);
        push_u32(out, set_off);
    }
    off as u32
}

fn align4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_uleb(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn put_u16(out: &mut [u8], at: usize, value: u16) {
    out[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
