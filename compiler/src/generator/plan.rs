use log::debug;
use serde::Serialize;

use super::{
    analysis::Analysis,
    switches::{Operation, Switches},
};
use crate::types::{Builtin, ConstValue, Definition, DefinitionKind, EnumItem, TypeId, TypeTable};

/// The shape class of a referenced type, with aliases looked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeClass {
    Int { size: usize, signed: bool },
    Float { size: usize },
    Bool,
    AString,
    UString,
    Void,
    Enum { num_bytes: usize },
    Array,
    Struct,
    Union,
}

/// A reference to a type as a backend needs to see it: by its declared
/// name, plus the derived facts that drive each decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub id:            TypeId,
    pub name:          String,
    pub class:         TypeClass,
    pub scalar:        bool,
    pub constant_size: Option<usize>,
    pub by_value:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPlan {
    pub name:     String,
    pub type_:    TypeRef,
    pub optional: bool,
}

/// How an array's encoded size is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeStrategy {
    /// Every item has this size, so one multiplication suffices.
    Multiply(usize),
    /// Items are visited one by one.
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmPlan {
    pub label:   String,
    pub value:   i64,
    /// `None` for a void arm.
    pub payload: Option<MemberPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Alias {
        target: TypeRef,
    },
    Array {
        item:      TypeRef,
        item_name: String,
        size:      SizeStrategy,
    },
    Struct {
        members: Vec<MemberPlan>,
    },
    Enum {
        items:     Vec<EnumItem>,
        num_bytes: usize,
    },
    Union {
        discriminant:      TypeRef,
        discriminant_name: String,
        arms:              Vec<ArmPlan>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionPlan {
    pub id:            TypeId,
    pub name:          String,
    pub level:         usize,
    pub constant_size: Option<usize>,
    pub operations:    Vec<Operation>,
    pub shape:         Shape,
}

impl DefinitionPlan {
    pub fn has(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstPlan {
    pub name:  String,
    pub level: usize,
    pub type_: TypeRef,
    pub value: ConstValue,
}

/// A file pulled in at include level 1, which a backend turns into an
/// import of that file's generated module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    pub path:  String,
    pub level: usize,
}

/// Everything a backend needs to render one schema, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPlan {
    pub imports:     Vec<ImportPlan>,
    pub constants:   Vec<ConstPlan>,
    pub definitions: Vec<DefinitionPlan>,
}

impl GenerationPlan {
    pub fn new(table: &TypeTable, switches: Switches) -> GenerationPlan {
        let planner = Planner {
            table,
            analysis: Analysis::new(table),
            operations: switches.operations(),
        };

        let mut plan = GenerationPlan {
            imports:     Vec::new(),
            constants:   Vec::new(),
            definitions: Vec::new(),
        };

        for (id, definition) in table.definitions().iter().enumerate() {
            match &definition.kind {
                DefinitionKind::Builtin(_) => {}
                DefinitionKind::Include { path } => plan.imports.push(ImportPlan {
                    path:  path.clone(),
                    level: definition.level,
                }),
                DefinitionKind::Const { type_id, value } => plan.constants.push(ConstPlan {
                    name:  definition.name.clone(),
                    level: definition.level,
                    type_: planner.type_ref(*type_id),
                    value: value.clone(),
                }),
                _ => plan.definitions.push(planner.definition(id, definition)),
            }
        }

        debug!(
            "planned {} definitions, {} constants, {} imports",
            plan.definitions.len(),
            plan.constants.len(),
            plan.imports.len()
        );
        plan
    }
}

struct Planner<'a> {
    table:      &'a TypeTable,
    analysis:   Analysis,
    operations: Vec<Operation>,
}

impl<'a> Planner<'a> {
    fn type_ref(&self, id: TypeId) -> TypeRef {
        let properties = self.analysis.properties(id);
        TypeRef {
            id,
            name:          self.table.get(id).name.clone(),
            class:         self.class(id),
            scalar:        properties.scalar,
            constant_size: properties.constant_size,
            by_value:      properties.by_value,
        }
    }

    fn class(&self, id: TypeId) -> TypeClass {
        let definition = self.table.get(self.table.effective(id));
        match &definition.kind {
            DefinitionKind::Builtin(Builtin::Int { size, signed }) => TypeClass::Int { size: *size, signed: *signed },
            DefinitionKind::Builtin(Builtin::Float { size }) => TypeClass::Float { size: *size },
            DefinitionKind::Builtin(Builtin::Bool) => TypeClass::Bool,
            DefinitionKind::Builtin(Builtin::AString) => TypeClass::AString,
            DefinitionKind::Builtin(Builtin::UString) => TypeClass::UString,
            DefinitionKind::Builtin(Builtin::Void) => TypeClass::Void,
            DefinitionKind::Enum { num_bytes, .. } => TypeClass::Enum { num_bytes: *num_bytes },
            DefinitionKind::Array { .. } => TypeClass::Array,
            DefinitionKind::Struct { .. } => TypeClass::Struct,
            DefinitionKind::Union { .. } => TypeClass::Union,
            DefinitionKind::Alias { .. } | DefinitionKind::Const { .. } | DefinitionKind::Include { .. } => {
                panic!("{} ({}) cannot be used as a type", definition.name, definition.kind.label())
            }
        }
    }

    fn member(&self, name: &str, type_id: TypeId, optional: bool) -> MemberPlan {
        MemberPlan {
            name: name.to_owned(),
            type_: self.type_ref(type_id),
            optional,
        }
    }

    fn definition(&self, id: TypeId, definition: &Definition) -> DefinitionPlan {
        let shape = match &definition.kind {
            DefinitionKind::Alias { target } => Shape::Alias {
                target: self.type_ref(*target),
            },
            DefinitionKind::Array { item, item_name } => Shape::Array {
                item:      self.type_ref(*item),
                item_name: item_name.clone(),
                size:      match self.analysis.constant_size(*item) {
                    Some(size) => SizeStrategy::Multiply(size),
                    None => SizeStrategy::Loop,
                },
            },
            DefinitionKind::Struct { members } => Shape::Struct {
                members: members
                    .iter()
                    .map(|member| self.member(&member.name, member.type_id, member.optional))
                    .collect(),
            },
            DefinitionKind::Enum { items, num_bytes } => Shape::Enum {
                items:     items.clone(),
                num_bytes: *num_bytes,
            },
            DefinitionKind::Union {
                discriminant,
                discriminant_name,
                arms,
            } => Shape::Union {
                discriminant:      self.type_ref(*discriminant),
                discriminant_name: discriminant_name.clone(),
                arms:              arms
                    .iter()
                    .map(|arm| ArmPlan {
                        label:   arm.label.clone(),
                        value:   arm.value,
                        payload: arm.name.as_ref().map(|name| self.member(name, arm.type_id, false)),
                    })
                    .collect(),
            },
            DefinitionKind::Builtin(_) | DefinitionKind::Const { .. } | DefinitionKind::Include { .. } => {
                panic!("{} ({}) has no generated operations", definition.name, definition.kind.label())
            }
        };

        let is_struct = matches!(shape, Shape::Struct { .. });
        DefinitionPlan {
            id,
            name: definition.name.clone(),
            level: definition.level,
            constant_size: self.analysis.constant_size(id),
            operations: self
                .operations
                .iter()
                .copied()
                .filter(|operation| is_struct || !operation.struct_only())
                .collect(),
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_str};

    fn plan(text: &str, switches: Switches) -> GenerationPlan {
        let table = parse_schema(&tokenize_str(text, "main.wire").unwrap()).unwrap();
        GenerationPlan::new(&table, switches)
    }

    #[test]
    fn shapes() {
        let plan = plan(
            "MAX = const uint8 9\n\
             Point = struct { int32 x int32 y }\n\
             Points = array(Point point)\n\
             Names = array(astring name)\n\
             Name = struct { opt astring nickname }\n\
             Kind = enum { A B }\n\
             Shape = union (Kind kind) { A: Point at B: void }",
            Switches::all(),
        );

        assert_eq!(plan.constants.len(), 1);
        assert_eq!(plan.constants[0].type_.class, TypeClass::Int { size: 1, signed: false });
        assert_eq!(plan.constants[0].value, ConstValue::Int(9));

        let names: Vec<&str> = plan.definitions.iter().map(|def| def.name.as_str()).collect();
        assert_eq!(names, ["Point", "Points", "Names", "Name", "Kind", "Shape"]);

        assert_eq!(plan.definitions[0].constant_size, Some(8));
        match &plan.definitions[1].shape {
            Shape::Array { size, item, .. } => {
                assert_eq!(*size, SizeStrategy::Multiply(8));
                assert_eq!(item.class, TypeClass::Struct);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &plan.definitions[2].shape {
            Shape::Array { size, .. } => assert_eq!(*size, SizeStrategy::Loop),
            other => panic!("unexpected {:?}", other),
        }
        match &plan.definitions[3].shape {
            Shape::Struct { members } => {
                assert!(members[0].optional);
                assert!(members[0].type_.by_value);
                assert!(!members[0].type_.scalar);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &plan.definitions[5].shape {
            Shape::Union { discriminant, arms, .. } => {
                assert_eq!(discriminant.class, TypeClass::Enum { num_bytes: 1 });
                assert_eq!(arms[0].payload.as_ref().map(|p| p.name.as_str()), Some("at"));
                assert_eq!(arms[1].payload, None);
                assert_eq!(arms[1].value, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn member_operations_only_for_structs() {
        let plan = plan("Point = struct { int32 x }\nKind = enum { A }", Switches::all());
        for operation in [Operation::Create, Operation::Set, Operation::Wrap, Operation::Unwrap] {
            assert!(plan.definitions[0].has(operation));
            assert!(!plan.definitions[1].has(operation));
        }
        assert!(plan.definitions[1].has(Operation::Print));
        assert!(plan.definitions[1].has(Operation::ReadStream));
        assert!(plan.definitions[1].has(Operation::WriteStream));
    }

    #[test]
    fn resolved_operations() {
        let plan = plan("Point = struct { int32 x }", Switches { dup: true, ..Switches::default() });
        assert_eq!(plan.definitions[0].operations, [Operation::Copy, Operation::Dup, Operation::Clear]);
    }

    #[test]
    fn imports_and_levels() {
        let plan = plan(
            "# 1 \"main.wire\"\n# 1 \"base.wire\" 1\nId = uint16\n# 2 \"main.wire\" 2\nUser = struct { Id id }\n",
            Switches::all(),
        );
        assert_eq!(plan.imports, [ImportPlan { path: "base.wire".to_owned(), level: 1 }]);
        let levels: Vec<(&str, usize)> = plan.definitions.iter().map(|def| (def.name.as_str(), def.level)).collect();
        assert_eq!(levels, [("Id", 1), ("User", 0)]);
    }
}
