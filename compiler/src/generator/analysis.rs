use crate::types::{Builtin, DefinitionKind, TypeId, TypeTable};

/// Derived facts about one definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Properties {
    /// A single number or flag at the value level: integers, floats, bools
    /// and enums.
    pub scalar:        bool,
    /// Encoded length when it does not depend on the value.
    pub constant_size: Option<usize>,
    /// Passed by value rather than by reference in generated signatures.
    pub by_value:      bool,
}

/// Properties of every definition in a table, computed once.
///
/// References only ever point at earlier definitions, so a single forward
/// pass sees every dependency before the definitions that use it.
#[derive(Debug, Clone)]
pub struct Analysis {
    properties: Vec<Properties>,
}

impl Analysis {
    pub fn new(table: &TypeTable) -> Analysis {
        let mut properties: Vec<Properties> = Vec::with_capacity(table.len());
        for definition in table.definitions() {
            let derived = derive(&properties, &definition.kind);
            properties.push(derived);
        }
        Analysis { properties }
    }

    pub fn properties(&self, id: TypeId) -> Properties {
        self.properties[id]
    }

    pub fn is_scalar(&self, id: TypeId) -> bool {
        self.properties[id].scalar
    }

    pub fn constant_size(&self, id: TypeId) -> Option<usize> {
        self.properties[id].constant_size
    }

    pub fn has_constant_size(&self, id: TypeId) -> bool {
        self.properties[id].constant_size.is_some()
    }

    pub fn is_by_value(&self, id: TypeId) -> bool {
        self.properties[id].by_value
    }
}

fn derive(done: &[Properties], kind: &DefinitionKind) -> Properties {
    let scalar = |size: usize| Properties {
        scalar:        true,
        constant_size: Some(size),
        by_value:      true,
    };

    match kind {
        DefinitionKind::Builtin(Builtin::Int { size, .. }) => scalar(*size),
        DefinitionKind::Builtin(Builtin::Float { size }) => scalar(*size),
        DefinitionKind::Builtin(Builtin::Bool) => scalar(1),
        DefinitionKind::Builtin(Builtin::AString | Builtin::UString) => Properties {
            scalar:        false,
            constant_size: None,
            by_value:      true,
        },
        DefinitionKind::Builtin(Builtin::Void) => Properties {
            scalar:        false,
            constant_size: Some(0),
            by_value:      false,
        },
        DefinitionKind::Alias { target } => done[*target],
        DefinitionKind::Enum { num_bytes, .. } => scalar(*num_bytes),
        DefinitionKind::Struct { members } => Properties {
            scalar:        false,
            constant_size: members.iter().try_fold(0, |total, member| {
                if member.optional {
                    None
                } else {
                    done[member.type_id].constant_size.map(|size| total + size)
                }
            }),
            by_value:      false,
        },
        DefinitionKind::Array { .. } | DefinitionKind::Union { .. } => Properties::default(),
        // Never consulted: nothing can reference a constant or an include
        // as a type.
        DefinitionKind::Const { .. } | DefinitionKind::Include { .. } => Properties::default(),
    }
}
