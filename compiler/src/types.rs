use std::collections::HashMap;

use serde::Serialize;

/// Position of a definition in the [TypeTable](struct.TypeTable.html).
pub type TypeId = usize;

/// File name recorded on the pre-seeded builtin definitions.
pub const BUILTIN_FILE: &str = "<builtin>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Builtin {
    Int { size: usize, signed: bool },
    Float { size: usize },
    Bool,
    AString,
    UString,
    Void,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructMember {
    pub name:     String,
    pub type_id:  TypeId,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumItem {
    pub name:  String,
    pub value: u32,
}

/// One case of a union. `label` is the literal as written in the schema,
/// `value` what it resolved to. `name` is `None` exactly for void payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionArm {
    pub label:   String,
    pub value:   i64,
    pub type_id: TypeId,
    pub name:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefinitionKind {
    Builtin(Builtin),
    Const {
        type_id: TypeId,
        value:   ConstValue,
    },
    Alias {
        target: TypeId,
    },
    Array {
        item:      TypeId,
        item_name: String,
    },
    Struct {
        members: Vec<StructMember>,
    },
    Enum {
        items:     Vec<EnumItem>,
        num_bytes: usize,
    },
    Union {
        discriminant:      TypeId,
        discriminant_name: String,
        arms:              Vec<UnionArm>,
    },
    Include {
        path: String,
    },
}

impl DefinitionKind {
    /// Short name of the kind, as used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Builtin(Builtin::Int { .. })   => "integer",
            DefinitionKind::Builtin(Builtin::Float { .. }) => "float",
            DefinitionKind::Builtin(Builtin::Bool)         => "bool",
            DefinitionKind::Builtin(Builtin::AString)      => "astring",
            DefinitionKind::Builtin(Builtin::UString)      => "ustring",
            DefinitionKind::Builtin(Builtin::Void)         => "void",
            DefinitionKind::Const { .. }                   => "const",
            DefinitionKind::Alias { .. }                   => "alias",
            DefinitionKind::Array { .. }                   => "array",
            DefinitionKind::Struct { .. }                  => "struct",
            DefinitionKind::Enum { .. }                    => "enum",
            DefinitionKind::Union { .. }                   => "union",
            DefinitionKind::Include { .. }                 => "include",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name:   String,
    pub file:   String,
    pub line:   usize,
    pub column: usize,
    pub level:  usize,
    pub kind:   DefinitionKind,
}

/// Every definition of a compilation unit in insertion order, builtins
/// first. Grows by appending only; references always point backwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeTable {
    definitions: Vec<Definition>,
    #[serde(skip)]
    index:       HashMap<String, TypeId>,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable::default()
    }

    /// A table holding the fourteen builtins.
    pub fn with_builtins() -> TypeTable {
        let mut table = TypeTable::new();
        let mut builtin = |name: &str, builtin: Builtin| {
            table.insert(Definition {
                name:   name.to_owned(),
                file:   BUILTIN_FILE.to_owned(),
                line:   0,
                column: 0,
                level:  0,
                kind:   DefinitionKind::Builtin(builtin),
            });
        };

        builtin("astring", Builtin::AString);
        builtin("ustring", Builtin::UString);
        for (name, size) in [("uint8", 1), ("uint16", 2), ("uint32", 4), ("uint64", 8)] {
            builtin(name, Builtin::Int { size, signed: false });
        }
        for (name, size) in [("int8", 1), ("int16", 2), ("int32", 4), ("int64", 8)] {
            builtin(name, Builtin::Int { size, signed: true });
        }
        builtin("bool", Builtin::Bool);
        builtin("float32", Builtin::Float { size: 4 });
        builtin("float64", Builtin::Float { size: 8 });
        builtin("void", Builtin::Void);
        table
    }

    /// Appends a definition. Includes are keyed by path and never shadow or
    /// collide with named definitions.
    pub fn insert(&mut self, definition: Definition) -> TypeId {
        let id = self.definitions.len();
        if !matches!(definition.kind, DefinitionKind::Include { .. }) {
            debug_assert!(!self.index.contains_key(&definition.name), "duplicate {}", definition.name);
            self.index.insert(definition.name.clone(), id);
        }
        self.definitions.push(definition);
        id
    }

    /// Looks up a named definition (types and constants, not includes).
    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    pub fn has_include(&self, path: &str) -> bool {
        self.definitions
            .iter()
            .any(|def| matches!(&def.kind, DefinitionKind::Include { path: p } if p == path))
    }

    pub fn get(&self, id: TypeId) -> &Definition {
        &self.definitions[id]
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Follows aliases to the definition that gives `id` its shape.
    pub fn effective(&self, mut id: TypeId) -> TypeId {
        while let DefinitionKind::Alias { target } = self.definitions[id].kind {
            id = target;
        }
        id
    }

    /// Plain integers and enums, looking through aliases.
    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(
            self.definitions[self.effective(id)].kind,
            DefinitionKind::Builtin(Builtin::Int { .. }) | DefinitionKind::Enum { .. }
        )
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(
            self.definitions[self.effective(id)].kind,
            DefinitionKind::Builtin(Builtin::Void)
        )
    }

    pub fn is_type(&self, id: TypeId) -> bool {
        !matches!(
            self.definitions[id].kind,
            DefinitionKind::Const { .. } | DefinitionKind::Include { .. }
        )
    }
}

/// Number of bytes an enum whose largest value is `max` is encoded in.
pub fn enum_width(max: u32) -> usize {
    if max >= 1 << 24 {
        4
    } else if max >= 1 << 16 {
        3
    } else if max >= 1 << 8 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, kind: DefinitionKind) -> Definition {
        Definition {
            name:   name.to_owned(),
            file:   "<string>".to_owned(),
            line:   1,
            column: 1,
            level:  0,
            kind,
        }
    }

    #[test]
    fn builtins_in_order() {
        let table = TypeTable::with_builtins();
        let names: Vec<&str> = table.definitions().iter().map(|def| def.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "astring", "ustring", "uint8", "uint16", "uint32", "uint64", "int8", "int16",
                "int32", "int64", "bool", "float32", "float64", "void",
            ]
        );
        assert!(table.definitions().iter().all(|def| def.file == BUILTIN_FILE));
    }

    #[test]
    fn aliases_resolve() {
        let mut table = TypeTable::with_builtins();
        let int32 = table.find("int32").unwrap();
        let id = table.insert(user("Id", DefinitionKind::Alias { target: int32 }));
        let key = table.insert(user("Key", DefinitionKind::Alias { target: id }));
        let nothing = table.insert(user("Nothing", DefinitionKind::Alias { target: table.find("void").unwrap() }));

        assert_eq!(table.effective(key), int32);
        assert!(table.is_integer(key));
        assert!(!table.is_integer(table.find("float32").unwrap()));
        assert!(table.is_void(nothing));
    }

    #[test]
    fn includes_are_not_names() {
        let mut table = TypeTable::with_builtins();
        table.insert(Definition {
            level: 1,
            ..user("common.wire", DefinitionKind::Include { path: "common.wire".to_owned() })
        });
        assert!(table.has_include("common.wire"));
        assert_eq!(table.find("common.wire"), None);
    }

    #[test]
    fn enum_widths() {
        assert_eq!(enum_width(0), 1);
        assert_eq!(enum_width(200), 1);
        assert_eq!(enum_width(255), 1);
        assert_eq!(enum_width(256), 2);
        assert_eq!(enum_width(1000), 2);
        assert_eq!(enum_width(65535), 2);
        assert_eq!(enum_width(65536), 3);
        assert_eq!(enum_width((1 << 24) - 1), 3);
        assert_eq!(enum_width(16_777_300), 4);
    }
}
