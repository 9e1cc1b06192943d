use std::{fs::File, path::Path, process::Command};

use brine_wire_schema::{Arm, Def, DefKind, EnumItem, Field, Schema};
use log::debug;

use crate::{
    error::WireError,
    parser::parse_schema,
    tokenizer::{tokenize_reader, tokenize_str, Token},
    types::{Builtin, DefinitionKind, TypeId, TypeTable},
};

/// Resolve an already tokenized schema into a [TypeTable](../types/struct.TypeTable.html).
pub fn compile_tokens(tokens: &[Token]) -> Result<TypeTable, WireError> {
    debug!("parsing {} tokens", tokens.len());
    let table = parse_schema(tokens)?;
    debug!("type table holds {} definitions", table.len());
    Ok(table)
}

/// Compile schema text that needs no preprocessing.
/// `filename` is what diagnostics report as the source.
pub fn compile_schema(text: &str, filename: &str) -> Result<TypeTable, WireError> {
    let tokens = tokenize_str(text, filename)?;
    compile_tokens(&tokens)
}

/// Run the C preprocessor over `path` and return what it printed.
pub fn preprocess_file(path: &Path) -> Result<String, WireError> {
    debug!("preprocessing {}", path.display());
    let output = Command::new("cpp")
        .arg("-x")
        .arg("c++")
        .arg("-traditional-cpp")
        .arg(path)
        .output()
        .map_err(|e| WireError::Preprocess(format!("could not run cpp: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WireError::Preprocess(format!("{} ({})", stderr.trim_end(), output.status)));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| WireError::Preprocess("output is not valid UTF-8".to_owned()))
}

/// Compile the schema file at `path`, through cpp when `use_cpp` is set.
pub fn compile_file(path: &Path, use_cpp: bool) -> Result<TypeTable, WireError> {
    let filename = path.to_string_lossy();
    let tokens = if use_cpp {
        let text = preprocess_file(path)?;
        tokenize_str(&text, &filename)?
    } else {
        tokenize_reader(File::open(path)?, &filename)?
    };
    debug!("{}: {} tokens", filename, tokens.len());
    compile_tokens(&tokens)
}

/// Lower a resolved table into the runtime's type descriptors. Constants
/// and include markers have no runtime shape and are left out, so type ids
/// are renumbered. Builtins keep their `TYPE_*` indices.
pub fn to_runtime_schema(table: &TypeTable) -> Schema {
    let mut schema = Schema::new(Vec::new());
    let mut ids: Vec<Option<TypeId>> = Vec::with_capacity(table.len());

    for definition in table.definitions() {
        let map = |id: TypeId| ids[id].unwrap_or_else(|| panic!("{} refers to a non-type", definition.name));
        let kind = match &definition.kind {
            DefinitionKind::Builtin(builtin) => match *builtin {
                Builtin::Int { size, signed } => DefKind::Int { size, signed },
                Builtin::Float { size } => DefKind::Float { size },
                Builtin::Bool => DefKind::Bool,
                Builtin::AString => DefKind::AString,
                Builtin::UString => DefKind::UString,
                Builtin::Void => DefKind::Void,
            },
            DefinitionKind::Const { .. } | DefinitionKind::Include { .. } => {
                ids.push(None);
                continue;
            }
            DefinitionKind::Alias { target } => DefKind::Alias { target: map(*target) },
            DefinitionKind::Array { item, item_name } => DefKind::Array {
                item:      map(*item),
                item_name: item_name.clone(),
            },
            DefinitionKind::Struct { members } => DefKind::Struct {
                fields: members
                    .iter()
                    .map(|member| Field {
                        name:     member.name.clone(),
                        type_id:  map(member.type_id),
                        optional: member.optional,
                    })
                    .collect(),
            },
            DefinitionKind::Enum { items, num_bytes } => DefKind::Enum {
                items:     items
                    .iter()
                    .map(|item| EnumItem {
                        name:  item.name.clone(),
                        value: item.value,
                    })
                    .collect(),
                num_bytes: *num_bytes,
            },
            DefinitionKind::Union {
                discriminant,
                discriminant_name,
                arms,
            } => DefKind::Union {
                discriminant:      map(*discriminant),
                discriminant_name: discriminant_name.clone(),
                arms:              arms
                    .iter()
                    .map(|arm| Arm {
                        value:   arm.value,
                        type_id: map(arm.type_id),
                        name:    arm.name.clone(),
                    })
                    .collect(),
            },
        };
        let id = schema.push(Def::new(definition.name.clone(), kind));
        ids.push(Some(id));
    }

    debug!("lowered {} runtime definitions", schema.defs.len());
    schema
}
