use std::{collections::HashSet, path::Path};

use crate::{
    error::WireError,
    generator::{
        ArmPlan, ConstPlan, DefinitionPlan, GenerationPlan, MemberPlan, Operation, Shape,
        SizeStrategy, TypeClass, TypeRef,
    },
    types::ConstValue,
    utils::quote,
};

/// Crate path the generated code imports its runtime from by default.
pub const DEFAULT_RUNTIME: &str = "brine_wire_schema";

const LINTS: &str = "non_camel_case_types, non_snake_case, non_upper_case_globals, dead_code, clippy::all";

/// Settings for the emitted Rust source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustOptions {
    /// One level of indentation in the emitted source.
    pub indent:  String,
    /// Path of the runtime crate, as seen from the generated module.
    pub runtime: String,
    /// Wrap everything in `pub mod <name> { ... }`. Required when the output
    /// is pulled in with `include!`, which rejects inner attributes.
    pub module:  Option<String>,
}

impl Default for RustOptions {
    fn default() -> RustOptions {
        RustOptions {
            indent:  "    ".to_owned(),
            runtime: DEFAULT_RUNTIME.to_owned(),
            module:  None,
        }
    }
}

macro_rules! emit {
    ($e:expr, $level:expr, $($arg:tt)*) => {
        $e.line($level, &format!($($arg)*))
    };
}

struct Emitter<'o> {
    lines: Vec<String>,
    unit:  &'o str,
    base:  usize,
}

impl<'o> Emitter<'o> {
    fn line(&mut self, level: usize, text: &str) {
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", self.unit.repeat(self.base + level), text));
        }
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Maps a schema type to the Rust type that represents it.
fn map_type(type_: &TypeRef) -> String {
    match type_.name.as_str() {
        "astring" => "Vec<u8>".to_string(),
        "ustring" => "String".to_string(),
        "uint8"   => "u8".to_string(),
        "uint16"  => "u16".to_string(),
        "uint32"  => "u32".to_string(),
        "uint64"  => "u64".to_string(),
        "int8"    => "i8".to_string(),
        "int16"   => "i16".to_string(),
        "int32"   => "i32".to_string(),
        "int64"   => "i64".to_string(),
        "bool"    => "bool".to_string(),
        "float32" => "f32".to_string(),
        "float64" => "f64".to_string(),
        "void"    => "()".to_string(),
        other     => escape_rust_keyword(other),
    }
}

/// The module an included schema file is expected to be generated into.
fn module_stem(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    escape_rust_keyword(&name)
}

fn byte_string_literal(text: &str) -> String {
    let escaped: String = text
        .bytes()
        .flat_map(std::ascii::escape_default)
        .map(char::from)
        .collect();
    format!("b\"{}\"", escaped)
}

fn field(name: &str) -> String {
    escape_rust_keyword(name)
}

/// The expression a union's arms are matched against.
fn tag(discriminant: &TypeRef, discriminant_name: &str) -> String {
    match discriminant.class {
        TypeClass::Enum { .. } => format!("self.{}.0", field(discriminant_name)),
        _ => format!("self.{}", field(discriminant_name)),
    }
}

/// Compiles a generation plan into Rust source. Only definitions at include
/// level 0 are rendered; level-1 includes become `use super::<stem>::*`.
pub fn compile_schema_to_rust(plan: &GenerationPlan, options: &RustOptions) -> Result<String, WireError> {
    if let Some(module) = &options.module {
        if !is_identifier(module) {
            return Err(WireError::Generate(format!("invalid module name {}", quote(module))));
        }
    }

    let mut e = Emitter {
        lines: Vec::new(),
        unit:  &options.indent,
        base:  0,
    };

    e.line(0, "// Generated by brine-wire. Do not edit.");
    match &options.module {
        Some(module) => {
            emit!(e, 0, "#[allow({})]", LINTS);
            emit!(e, 0, "pub mod {} {{", escape_rust_keyword(module));
            e.base = 1;
        }
        None => emit!(e, 0, "#![allow({})]", LINTS),
    }
    e.blank();

    e.line(0, "#[allow(unused_imports)]");
    emit!(e, 0, "use {}::{{stream, ByteBuffer, ByteBufferMut, FixedSize, Indent, Stream, Wire}};", options.runtime);
    for import in plan.imports.iter().filter(|import| import.level == 1) {
        e.line(0, "#[allow(unused_imports)]");
        emit!(e, 0, "use super::{}::*;", module_stem(&import.path));
    }

    let constants: Vec<&ConstPlan> = plan.constants.iter().filter(|c| c.level == 0).collect();
    if !constants.is_empty() {
        e.blank();
        for constant in constants {
            generate_const(&mut e, constant);
        }
    }

    for definition in plan.definitions.iter().filter(|d| d.level == 0) {
        e.blank();
        generate_definition(&mut e, definition);
    }

    if options.module.is_some() {
        e.base = 0;
        e.line(0, "}");
    }

    let mut source = e.lines.join("\n");
    source.push('\n');
    Ok(source)
}

fn generate_const(e: &mut Emitter, constant: &ConstPlan) {
    let (rust_type, literal) = match (&constant.type_.class, &constant.value) {
        (TypeClass::AString, ConstValue::Str(text)) => ("&[u8]".to_string(), byte_string_literal(text)),
        (TypeClass::UString, ConstValue::Str(text)) => ("&str".to_string(), format!("{:?}", text)),
        (_, ConstValue::Int(value)) => (map_type(&constant.type_), value.to_string()),
        (_, ConstValue::Float(value)) => (map_type(&constant.type_), format!("{:?}", value)),
        (_, ConstValue::Bool(value)) => (map_type(&constant.type_), value.to_string()),
        (class, ConstValue::Str(_)) => panic!("string constant {} has type class {:?}", constant.name, class),
    };
    emit!(e, 0, "pub const {}: {} = {};", escape_rust_keyword(&constant.name), rust_type, literal);
}

fn generate_definition(e: &mut Emitter, plan: &DefinitionPlan) {
    let name = escape_rust_keyword(&plan.name);

    match &plan.shape {
        Shape::Alias { target } => {
            emit!(e, 0, "pub type {} = {};", name, map_type(target));
            return;
        }
        Shape::Array { item, item_name, .. } => {
            e.line(0, "#[derive(Debug, Clone, PartialEq, Default)]");
            emit!(e, 0, "pub struct {} {{", name);
            emit!(e, 1, "pub {}: Vec<{}>,", field(item_name), map_type(item));
            e.line(0, "}");
        }
        Shape::Struct { members } => {
            e.line(0, "#[derive(Debug, Clone, PartialEq, Default)]");
            emit!(e, 0, "pub struct {} {{", name);
            for member in members {
                if member.optional {
                    emit!(e, 1, "pub {}: Option<Box<{}>>,", field(&member.name), map_type(&member.type_));
                } else {
                    emit!(e, 1, "pub {}: {},", field(&member.name), map_type(&member.type_));
                }
            }
            e.line(0, "}");
        }
        Shape::Enum { .. } => {
            e.line(0, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]");
            emit!(e, 0, "pub struct {}(pub u32);", name);
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            e.line(0, "#[derive(Debug, Clone, PartialEq, Default)]");
            emit!(e, 0, "pub struct {} {{", name);
            emit!(e, 1, "pub {}: {},", field(discriminant_name), map_type(discriminant));
            let mut seen = HashSet::new();
            for payload in arms.iter().filter_map(|arm| arm.payload.as_ref()) {
                if seen.insert(payload.name.as_str()) {
                    emit!(e, 1, "pub {}: {},", field(&payload.name), map_type(&payload.type_));
                }
            }
            e.line(0, "}");
        }
    }

    e.blank();
    emit!(e, 0, "impl {} {{", name);
    let mut first = true;

    if let Shape::Enum { items, .. } = &plan.shape {
        for item in items {
            emit!(e, 1, "pub const {}: Self = Self({});", escape_rust_keyword(&item.name), item.value);
        }
        first = items.is_empty();
    }

    for operation in &plan.operations {
        if !first {
            e.blank();
        }
        first = false;
        match operation {
            Operation::Size        => generate_size(e, plan),
            Operation::Serialize   => generate_pack(e, plan),
            Operation::Deserialize => generate_unpack(e, plan),
            Operation::Wrap        => generate_to_bytes(e),
            Operation::Unwrap      => generate_from_bytes(e),
            Operation::ReadStream  => generate_read_from(e, plan),
            Operation::WriteStream => generate_write_to(e),
            Operation::Print       => generate_print(e, plan),
            Operation::Create      => generate_new(e, plan),
            Operation::Set         => generate_set(e, plan),
            Operation::Copy        => generate_copy(e, plan),
            Operation::Dup         => generate_dup(e),
            Operation::Clear       => generate_clear(e, plan),
            Operation::Destroy     => generate_destroy(e),
        }
    }
    e.line(0, "}");

    if let (true, Some(size)) = (plan.has(Operation::Size), plan.constant_size) {
        e.blank();
        emit!(e, 0, "impl FixedSize for {} {{", name);
        emit!(e, 1, "const PACKED_SIZE: usize = {};", size);
        e.line(0, "}");
    }

    let wire = [
        Operation::Size,
        Operation::Serialize,
        Operation::Deserialize,
        Operation::Print,
        Operation::Copy,
        Operation::Clear,
    ];
    if wire.iter().all(|operation| plan.has(*operation)) {
        e.blank();
        generate_wire_impl(e, &name);
    }

    if plan.has(Operation::ReadStream) && plan.has(Operation::WriteStream) {
        e.blank();
        generate_stream_impl(e, &name);
    }
}

fn generate_wire_impl(e: &mut Emitter, name: &str) {
    emit!(e, 0, "impl Wire for {} {{", name);
    e.line(1, "fn packed_size(&self) -> usize {");
    emit!(e, 2, "{}::packed_size(self)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn pack(&self, bb: &mut ByteBufferMut) {");
    emit!(e, 2, "{}::pack(self, bb)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {");
    emit!(e, 2, "{}::unpack(self, bb)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn print(&self, out: &mut String, indent: &Indent, level: usize) {");
    emit!(e, 2, "{}::print(self, out, indent, level)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn copy_from(&mut self, src: &Self) {");
    emit!(e, 2, "{}::copy_from(self, src)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn clear(&mut self) {");
    emit!(e, 2, "{}::clear(self)", name);
    e.line(1, "}");
    e.line(0, "}");
}

fn generate_stream_impl(e: &mut Emitter, name: &str) {
    emit!(e, 0, "impl Stream for {} {{", name);
    e.line(1, "fn read_from<R: std::io::Read>(&mut self, r: &mut R) -> std::io::Result<()> {");
    emit!(e, 2, "{}::read_from(self, r)", name);
    e.line(1, "}");
    e.blank();
    e.line(1, "fn write_to<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {");
    emit!(e, 2, "{}::write_to(self, w)", name);
    e.line(1, "}");
    e.line(0, "}");
}

/// Starts `match <tag> {` over the arms of a union, calling `arm` for the
/// expression of each non-void arm. Void and unknown values do nothing.
fn generate_arms<F>(e: &mut Emitter, level: usize, tag: &str, arms: &[ArmPlan], empty: &str, arm: F)
where
    F: Fn(&MemberPlan) -> String,
{
    emit!(e, level, "match {} {{", tag);
    for case in arms {
        match &case.payload {
            Some(payload) => emit!(e, level + 1, "{} => {},", case.value, arm(payload)),
            None => emit!(e, level + 1, "{} => {},", case.value, empty),
        }
    }
    emit!(e, level + 1, "_ => {},", empty);
    e.line(level, "}");
}

fn generate_size(e: &mut Emitter, plan: &DefinitionPlan) {
    if let Some(size) = plan.constant_size {
        emit!(e, 1, "pub const PACKED_SIZE: usize = {};", size);
        e.blank();
        e.line(1, "pub fn packed_size(&self) -> usize {");
        e.line(2, "Self::PACKED_SIZE");
        e.line(1, "}");
        return;
    }

    e.line(1, "pub fn packed_size(&self) -> usize {");
    match &plan.shape {
        Shape::Array { item, item_name, size } => match size {
            SizeStrategy::Multiply(_) => {
                emit!(e, 2, "4 + self.{}.len() * <{}>::PACKED_SIZE", field(item_name), map_type(item));
            }
            SizeStrategy::Loop => {
                emit!(e, 2, "4 + self.{}.iter().map(|item| item.packed_size()).sum::<usize>()", field(item_name));
            }
        },
        Shape::Struct { members } => {
            e.line(2, "let mut size = 0;");
            for member in members {
                let name = field(&member.name);
                if member.optional {
                    e.line(2, "size += 1;");
                    emit!(e, 2, "if let Some(value) = &self.{} {{", name);
                    e.line(3, "size += value.packed_size();");
                    e.line(2, "}");
                } else if member.type_.constant_size.is_some() {
                    emit!(e, 2, "size += <{}>::PACKED_SIZE;", map_type(&member.type_));
                } else {
                    emit!(e, 2, "size += self.{}.packed_size();", name);
                }
            }
            e.line(2, "size");
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            e.line(2, "let payload = {");
            generate_arms(e, 3, &tag(discriminant, discriminant_name), arms, "0", |payload| {
                format!("self.{}.packed_size()", field(&payload.name))
            });
            e.line(2, "};");
            emit!(e, 2, "<{}>::PACKED_SIZE + payload", map_type(discriminant));
        }
        Shape::Alias { .. } | Shape::Enum { .. } => unreachable!("{} has a constant size", plan.name),
    }
    e.line(1, "}");
}

fn generate_pack(e: &mut Emitter, plan: &DefinitionPlan) {
    e.line(1, "pub fn pack(&self, bb: &mut ByteBufferMut) {");
    match &plan.shape {
        Shape::Array { item_name, .. } => {
            let name = field(item_name);
            emit!(e, 2, "bb.write_u32(self.{}.len() as u32);", name);
            emit!(e, 2, "for item in &self.{} {{", name);
            e.line(3, "item.pack(bb);");
            e.line(2, "}");
        }
        Shape::Struct { members } => {
            if members.is_empty() {
                e.line(2, "let _ = bb;");
            }
            for member in members {
                let name = field(&member.name);
                if member.optional {
                    emit!(e, 2, "bb.write_bool(self.{}.is_some());", name);
                    emit!(e, 2, "if let Some(value) = &self.{} {{", name);
                    e.line(3, "value.pack(bb);");
                    e.line(2, "}");
                } else {
                    emit!(e, 2, "self.{}.pack(bb);", name);
                }
            }
        }
        Shape::Enum { num_bytes, .. } => {
            emit!(e, 2, "bb.write_uint(self.0 as u64, {});", num_bytes);
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            emit!(e, 2, "self.{}.pack(bb);", field(discriminant_name));
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                format!("self.{}.pack(bb)", field(&payload.name))
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(1, "}");
}

fn generate_unpack(e: &mut Emitter, plan: &DefinitionPlan) {
    e.line(1, "pub fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {");
    match &plan.shape {
        Shape::Array { item_name, size, .. } => {
            let name = field(item_name);
            e.line(2, "let count = bb.read_u32()? as usize;");
            // Refuse counts the remaining input cannot possibly hold before
            // allocating for them. Every variable-size item takes a byte.
            match size {
                SizeStrategy::Multiply(0) => {}
                SizeStrategy::Multiply(item_size) => {
                    emit!(e, 2, "if count > bb.remaining() / {} {{", item_size);
                    e.line(3, "return Err(());");
                    e.line(2, "}");
                }
                SizeStrategy::Loop => {
                    e.line(2, "if count > bb.remaining() {");
                    e.line(3, "return Err(());");
                    e.line(2, "}");
                }
            }
            emit!(e, 2, "self.{}.resize_with(count, Default::default);", name);
            emit!(e, 2, "for item in self.{}.iter_mut() {{", name);
            e.line(3, "item.unpack(bb)?;");
            e.line(2, "}");
        }
        Shape::Struct { members } => {
            if members.is_empty() {
                e.line(2, "let _ = bb;");
            }
            for member in members {
                let name = field(&member.name);
                if member.optional {
                    e.line(2, "if bb.read_bool()? {");
                    emit!(e, 3, "self.{}.get_or_insert_with(Default::default).unpack(bb)?;", name);
                    e.line(2, "} else {");
                    emit!(e, 3, "self.{} = None;", name);
                    e.line(2, "}");
                } else {
                    emit!(e, 2, "self.{}.unpack(bb)?;", name);
                }
            }
        }
        Shape::Enum { num_bytes, .. } => {
            emit!(e, 2, "self.0 = bb.read_uint({})? as u32;", num_bytes);
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            emit!(e, 2, "self.{}.unpack(bb)?;", field(discriminant_name));
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                format!("self.{}.unpack(bb)?", field(&payload.name))
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(2, "Ok(())");
    e.line(1, "}");
}

fn generate_to_bytes(e: &mut Emitter) {
    e.line(1, "pub fn to_bytes(&self) -> Vec<u8> {");
    e.line(2, "let mut bb = ByteBufferMut::new();");
    e.line(2, "self.pack(&mut bb);");
    e.line(2, "bb.data()");
    e.line(1, "}");
}

fn generate_from_bytes(e: &mut Emitter) {
    e.line(1, "/// Decodes a value from the front of `bytes`. Also returns how many");
    e.line(1, "/// bytes it took.");
    e.line(1, "pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), ()> {");
    e.line(2, "let mut value = Self::default();");
    e.line(2, "let mut bb = ByteBuffer::new(bytes);");
    e.line(2, "value.unpack(&mut bb)?;");
    e.line(2, "Ok((value, bb.index()))");
    e.line(1, "}");
}

fn generate_read_from(e: &mut Emitter, plan: &DefinitionPlan) {
    e.line(1, "pub fn read_from<R: std::io::Read>(&mut self, r: &mut R) -> std::io::Result<()> {");
    match &plan.shape {
        Shape::Array { item_name, .. } => {
            let name = field(item_name);
            // Grow one item at a time; the count has not been backed by
            // any input yet.
            e.line(2, "let count = stream::read_u32(r)? as usize;");
            emit!(e, 2, "self.{}.truncate(count);", name);
            e.line(2, "for index in 0..count {");
            emit!(e, 3, "if index == self.{}.len() {{", name);
            emit!(e, 4, "self.{}.push(Default::default());", name);
            e.line(3, "}");
            emit!(e, 3, "self.{}[index].read_from(r)?;", name);
            e.line(2, "}");
        }
        Shape::Struct { members } => {
            if members.is_empty() {
                e.line(2, "let _ = r;");
            }
            for member in members {
                let name = field(&member.name);
                if member.optional {
                    e.line(2, "if stream::read_bool(r)? {");
                    emit!(e, 3, "self.{}.get_or_insert_with(Default::default).read_from(r)?;", name);
                    e.line(2, "} else {");
                    emit!(e, 3, "self.{} = None;", name);
                    e.line(2, "}");
                } else {
                    emit!(e, 2, "self.{}.read_from(r)?;", name);
                }
            }
        }
        Shape::Enum { num_bytes, .. } => {
            emit!(e, 2, "self.0 = stream::read_uint(r, {})? as u32;", num_bytes);
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            emit!(e, 2, "self.{}.read_from(r)?;", field(discriminant_name));
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                format!("self.{}.read_from(r)?", field(&payload.name))
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(2, "Ok(())");
    e.line(1, "}");
}

fn generate_write_to(e: &mut Emitter) {
    e.line(1, "pub fn write_to<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {");
    e.line(2, "let mut bb = ByteBufferMut::new();");
    e.line(2, "self.pack(&mut bb);");
    e.line(2, "w.write_all(&bb.data())");
    e.line(1, "}");
}

fn generate_print(e: &mut Emitter, plan: &DefinitionPlan) {
    match &plan.shape {
        Shape::Array { item_name, .. } => {
            e.line(1, "pub fn print(&self, out: &mut String, indent: &Indent, level: usize) {");
            e.line(2, r#"out.push_str("{\n");"#);
            emit!(e, 2, "for item in &self.{} {{", field(item_name));
            e.line(3, "indent.write(out, level + 1);");
            emit!(e, 3, "out.push_str(\"{}: \");", item_name);
            e.line(3, "item.print(out, indent, level + 1);");
            e.line(3, "out.push('\\n');");
            e.line(2, "}");
            e.line(2, "indent.write(out, level);");
            e.line(2, "out.push('}');");
        }
        Shape::Struct { members } => {
            e.line(1, "pub fn print(&self, out: &mut String, indent: &Indent, level: usize) {");
            e.line(2, r#"out.push_str("{\n");"#);
            for member in members {
                let name = field(&member.name);
                e.line(2, "indent.write(out, level + 1);");
                emit!(e, 2, "out.push_str(\"{}: \");", member.name);
                if member.optional {
                    emit!(e, 2, "match &self.{} {{", name);
                    e.line(3, "Some(value) => value.print(out, indent, level + 1),");
                    e.line(3, "None => out.push_str(\"<none>\"),");
                    e.line(2, "}");
                } else {
                    emit!(e, 2, "self.{}.print(out, indent, level + 1);", name);
                }
                e.line(2, "out.push('\\n');");
            }
            e.line(2, "indent.write(out, level);");
            e.line(2, "out.push('}');");
        }
        Shape::Enum { items, .. } => {
            e.line(1, "pub fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {");
            e.line(2, "out.push_str(match self.0 {");
            let mut seen = HashSet::new();
            for item in items.iter().filter(|item| seen.insert(item.value)) {
                emit!(e, 3, "{} => \"{}\",", item.value, item.name);
            }
            e.line(3, "_ => \"\",");
            e.line(2, "});");
        }
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            e.line(1, "pub fn print(&self, out: &mut String, indent: &Indent, level: usize) {");
            emit!(e, 2, "self.{}.print(out, indent, level);", field(discriminant_name));
            e.line(2, "out.push(' ');");
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                format!("self.{}.print(out, indent, level)", field(&payload.name))
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(1, "}");
}

fn generate_new(e: &mut Emitter, plan: &DefinitionPlan) {
    let members = match &plan.shape {
        Shape::Struct { members } => members,
        _ => unreachable!("only structs are created from their members"),
    };

    let params: Vec<String> = members
        .iter()
        .map(|member| {
            if member.optional {
                format!("{}: Option<{}>", field(&member.name), map_type(&member.type_))
            } else {
                format!("{}: {}", field(&member.name), map_type(&member.type_))
            }
        })
        .collect();

    emit!(e, 1, "pub fn new({}) -> Self {{", params.join(", "));
    e.line(2, "Self {");
    for member in members {
        if member.optional {
            emit!(e, 3, "{0}: {0}.map(Box::new),", field(&member.name));
        } else {
            emit!(e, 3, "{},", field(&member.name));
        }
    }
    e.line(2, "}");
    e.line(1, "}");
}

/// Scalars are taken by value, everything else is borrowed and deep-copied.
fn generate_set(e: &mut Emitter, plan: &DefinitionPlan) {
    let members = match &plan.shape {
        Shape::Struct { members } => members,
        _ => unreachable!("only structs are set from their members"),
    };

    let mut params = vec!["&mut self".to_string()];
    for member in members {
        let rust_type = map_type(&member.type_);
        let param = match (member.optional, member.type_.scalar) {
            (true, true) => format!("Option<{}>", rust_type),
            (true, false) => format!("Option<&{}>", rust_type),
            (false, true) => rust_type,
            (false, false) => format!("&{}", rust_type),
        };
        params.push(format!("{}: {}", field(&member.name), param));
    }

    emit!(e, 1, "pub fn set({}) {{", params.join(", "));
    for member in members {
        let name = field(&member.name);
        match (member.optional, member.type_.scalar) {
            (true, true) => emit!(e, 2, "self.{0} = {0}.map(Box::new);", name),
            (true, false) => {
                emit!(e, 2, "self.{0} = {0}.map(|value| {{", name);
                emit!(e, 3, "let mut copy = Box::<{}>::default();", map_type(&member.type_));
                e.line(3, "copy.copy_from(value);");
                e.line(3, "copy");
                e.line(2, "});");
            }
            (false, true) => emit!(e, 2, "self.{0} = {0};", name),
            (false, false) => emit!(e, 2, "self.{0}.copy_from({0});", name),
        }
    }
    e.line(1, "}");
}

fn generate_copy(e: &mut Emitter, plan: &DefinitionPlan) {
    e.line(1, "pub fn copy_from(&mut self, src: &Self) {");
    e.line(2, "self.clear();");
    match &plan.shape {
        Shape::Array { item, item_name, .. } => {
            let name = field(item_name);
            if item.scalar {
                emit!(e, 2, "self.{0}.extend_from_slice(&src.{0});", name);
            } else {
                emit!(e, 2, "self.{0}.resize_with(src.{0}.len(), Default::default);", name);
                emit!(e, 2, "for (item, src_item) in self.{0}.iter_mut().zip(&src.{0}) {{", name);
                e.line(3, "item.copy_from(src_item);");
                e.line(2, "}");
            }
        }
        Shape::Struct { members } => {
            if members.is_empty() {
                e.line(2, "let _ = src;");
            }
            for member in members {
                let name = field(&member.name);
                match (member.optional, member.type_.scalar) {
                    (true, true) => emit!(e, 2, "self.{0} = src.{0}.clone();", name),
                    (true, false) => {
                        emit!(e, 2, "self.{0} = src.{0}.as_ref().map(|value| {{", name);
                        emit!(e, 3, "let mut copy = Box::<{}>::default();", map_type(&member.type_));
                        e.line(3, "copy.copy_from(value);");
                        e.line(3, "copy");
                        e.line(2, "});");
                    }
                    (false, true) => emit!(e, 2, "self.{0} = src.{0};", name),
                    (false, false) => emit!(e, 2, "self.{0}.copy_from(&src.{0});", name),
                }
            }
        }
        Shape::Enum { .. } => e.line(2, "self.0 = src.0;"),
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            emit!(e, 2, "self.{0} = src.{0};", field(discriminant_name));
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                let name = field(&payload.name);
                if payload.type_.scalar {
                    format!("self.{0} = src.{0}", name)
                } else {
                    format!("self.{0}.copy_from(&src.{0})", name)
                }
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(1, "}");
}

fn generate_dup(e: &mut Emitter) {
    e.line(1, "pub fn dup(&self) -> Box<Self> {");
    e.line(2, "let mut copy = Box::<Self>::default();");
    e.line(2, "copy.copy_from(self);");
    e.line(2, "copy");
    e.line(1, "}");
}

fn generate_clear(e: &mut Emitter, plan: &DefinitionPlan) {
    e.line(1, "pub fn clear(&mut self) {");
    match &plan.shape {
        Shape::Array { item, item_name, .. } => {
            let name = field(item_name);
            if !item.scalar {
                emit!(e, 2, "for item in self.{}.iter_mut() {{", name);
                e.line(3, "item.clear();");
                e.line(2, "}");
            }
            emit!(e, 2, "self.{} = Vec::new();", name);
        }
        Shape::Struct { members } => {
            for member in members {
                if member.optional {
                    emit!(e, 2, "self.{} = None;", field(&member.name));
                } else {
                    emit!(e, 2, "self.{}.clear();", field(&member.name));
                }
            }
        }
        Shape::Enum { .. } => e.line(2, "self.0 = 0;"),
        // Only the arm selected right now is released. Payloads left behind
        // by an earlier discriminant stay where they are.
        Shape::Union {
            discriminant,
            discriminant_name,
            arms,
        } => {
            generate_arms(e, 2, &tag(discriminant, discriminant_name), arms, "{}", |payload| {
                format!("self.{}.clear()", field(&payload.name))
            });
        }
        Shape::Alias { .. } => unreachable!("aliases have no methods"),
    }
    e.line(1, "}");
}

fn generate_destroy(e: &mut Emitter) {
    e.line(1, "pub fn destroy(mut self: Box<Self>) {");
    e.line(2, "self.clear();");
    e.line(1, "}");
}
