//! Resolved class data handed to writers.

/// Sentinel for "no index" in dex tables
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// What an access flag word belongs to; some bits mean different things
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A class definition
    Class,
    /// A field
    Field,
    /// A method
    Method,
}

/// Dex access flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(pub u32);

impl AccessFlags {
    /// `public`
    pub const PUBLIC: u32 = 0x1;
    /// `private`
    pub const PRIVATE: u32 = 0x2;
    /// `protected`
    pub const PROTECTED: u32 = 0x4;
    /// `static`
    pub const STATIC: u32 = 0x8;
    /// `final`
    pub const FINAL: u32 = 0x10;
    /// `synchronized` on methods
    pub const SYNCHRONIZED: u32 = 0x20;
    /// `volatile` on fields, bridge on methods
    pub const VOLATILE: u32 = 0x40;
    /// `transient` on fields, varargs on methods
    pub const TRANSIENT: u32 = 0x80;
    /// `native`
    pub const NATIVE: u32 = 0x100;
    /// `interface`
    pub const INTERFACE: u32 = 0x200;
    /// `abstract`
    pub const ABSTRACT: u32 = 0x400;
    /// `strictfp`
    pub const STRICT: u32 = 0x800;
    /// Compiler generated
    pub const SYNTHETIC: u32 = 0x1000;
    /// Annotation type
    pub const ANNOTATION: u32 = 0x2000;
    /// Enum type or constant
    pub const ENUM: u32 = 0x4000;
    /// Constructor method
    pub const CONSTRUCTOR: u32 = 0x1_0000;

    /// Returns true if every bit of `flag` is set
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Java source modifiers for these flags, in conventional order
    pub fn modifiers(self, kind: MemberKind) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut push = |flag: u32, word: &'static str| {
            if self.contains(flag) {
                out.push(word);
            }
        };

        push(Self::PUBLIC, "public");
        push(Self::PRIVATE, "private");
        push(Self::PROTECTED, "protected");
        push(Self::STATIC, "static");
        if kind != MemberKind::Class || !self.contains(Self::INTERFACE) {
            push(Self::ABSTRACT, "abstract");
        }
        push(Self::FINAL, "final");
        match kind {
            MemberKind::Field => {
                push(Self::VOLATILE, "volatile");
                push(Self::TRANSIENT, "transient");
            }
            MemberKind::Method => {
                push(Self::SYNCHRONIZED, "synchronized");
                push(Self::NATIVE, "native");
            }
            MemberKind::Class => {}
        }
        push(Self::STRICT, "strictfp");
        out
    }

    /// The Java keyword introducing a class with these flags
    pub fn class_keyword(self) -> &'static str {
        if self.contains(Self::ANNOTATION) {
            "@interface"
        } else if self.contains(Self::INTERFACE) {
            "interface"
        } else if self.contains(Self::ENUM) {
            "enum"
        } else {
            "class"
        }
    }
}

/// A field declared by a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexField {
    /// Field name
    pub name: String,
    /// Field type, dotted
    pub type_name: String,
    /// Access flags
    pub access_flags: AccessFlags,
}

/// Method bytecode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeItem {
    /// Number of registers used
    pub registers: u16,
    /// Raw 16-bit code units
    pub instructions: Vec<u16>,
}

/// A method declared by a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexMethod {
    /// Method name
    pub name: String,
    /// Return type, dotted
    pub return_type: String,
    /// Parameter types, dotted
    pub parameters: Vec<String>,
    /// Access flags
    pub access_flags: AccessFlags,
    /// Annotation type names
    pub annotations: Vec<String>,
    /// Bytecode, absent for abstract and native methods
    pub code: Option<CodeItem>,
}

impl DexMethod {
    /// Returns true for `<init>` and `<clinit>`
    pub fn is_constructor(&self) -> bool {
        self.access_flags.contains(AccessFlags::CONSTRUCTOR)
            || self.name == "<init>"
            || self.name == "<clinit>"
    }
}

/// A fully resolved class definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexClass {
    /// Fully qualified, dotted class name
    pub name: String,
    /// Access flags
    pub access_flags: AccessFlags,
    /// Superclass, if any
    pub superclass: Option<String>,
    /// Implemented interfaces
    pub interfaces: Vec<String>,
    /// Source file recorded by the compiler
    pub source_file: Option<String>,
    /// Class annotation type names
    pub annotations: Vec<String>,
    /// Static then instance fields
    pub fields: Vec<DexField>,
    /// Direct then virtual methods
    pub methods: Vec<DexMethod>,
}

impl DexClass {
    /// The class name without its package
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The package, empty for the default package
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }
}

/// Convert a type descriptor to its dotted Java spelling.
///
/// `Lcom/a/B;` becomes `com.a.B`, `[I` becomes `int[]`. Unknown descriptors
/// are returned unchanged.
pub fn descriptor_to_java(descriptor: &str) -> String {
    let dims = descriptor.bytes().take_while(|&b| b == b'[').count();
    let element = &descriptor[dims..];

    let base = match element {
        "V" => "void".to_string(),
        "Z" => "boolean".to_string(),
        "B" => "byte".to_string(),
        "S" => "short".to_string(),
        "C" => "char".to_string(),
        "I" => "int".to_string(),
        "J" => "long".to_string(),
        "F" => "float".to_string(),
        "D" => "double".to_string(),
        _ => match element.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
            Some(name) => name.replace('/', "."),
            None => element.to_string(),
        },
    };

    format!("{}{}", base, "[]".repeat(dims))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_to_java() {
        assert_eq!(descriptor_to_java("Lcom/example/Main;"), "com.example.Main");
        assert_eq!(descriptor_to_java("I"), "int");
        assert_eq!(descriptor_to_java("[[J"), "long[][]");
        assert_eq!(descriptor_to_java("[Ljava/lang/String;"), "java.lang.String[]");
        assert_eq!(descriptor_to_java("LNoPackage;"), "NoPackage");
        assert_eq!(descriptor_to_java("weird"), "weird");
    }

    #[test]
    fn test_modifiers() {
        let flags = AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL);
        assert_eq!(flags.modifiers(MemberKind::Field), vec!["public", "static", "final"]);

        let iface = AccessFlags(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT);
        assert_eq!(iface.modifiers(MemberKind::Class), vec!["public"]);
        assert_eq!(iface.class_keyword(), "interface");

        let volatile = AccessFlags(AccessFlags::VOLATILE);
        assert_eq!(volatile.modifiers(MemberKind::Field), vec!["volatile"]);
        assert!(volatile.modifiers(MemberKind::Method).is_empty());
    }

    #[test]
    fn test_is_constructor() {
        let method = |name: &str, access: u32| DexMethod {
            name: name.into(),
            return_type: "void".into(),
            parameters: vec![],
            access_flags: AccessFlags(access),
            annotations: vec![],
            code: None,
        };
        assert!(method("<init>", AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR).is_constructor());
        assert!(method("<clinit>", AccessFlags::STATIC).is_constructor());
        assert!(!method("init", AccessFlags::PUBLIC).is_constructor());
    }

    #[test]
    fn test_class_name_parts() {
        let class = DexClass {
            name: "com.example.Main".into(),
            access_flags: AccessFlags::default(),
            superclass: None,
            interfaces: vec![],
            source_file: None,
            annotations: vec![],
            fields: vec![],
            methods: vec![],
        };
        assert_eq!(class.simple_name(), "Main");
        assert_eq!(class.package(), "com.example");
    }
}
