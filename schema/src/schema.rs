use std::collections::HashMap;

/// Index of a [Def](struct.Def.html) inside a [Schema](struct.Schema.html).
pub type TypeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum DefKind {
    Int { size: usize, signed: bool },
    Float { size: usize },
    Bool,
    AString,
    UString,
    Void,
    Alias { target: TypeId },
    Array { item: TypeId, item_name: String },
    Struct { fields: Vec<Field> },
    Enum { items: Vec<EnumItem>, num_bytes: usize },
    Union {
        discriminant:      TypeId,
        discriminant_name: String,
        arms:              Vec<Arm>,
    },
}

/// A struct member.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name:     String,
    pub type_id:  TypeId,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub name:  String,
    pub value: u32,
}

/// One case of a union. `name` is `None` exactly when the payload is void.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub value:   i64,
    pub type_id: TypeId,
    pub name:    Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Def {
    pub name: String,
    pub kind: DefKind,
}

impl Def {
    pub fn new(name: String, kind: DefKind) -> Def {
        Def { name, kind }
    }
}

/// Holds the contents of a compiled schema: every builtin followed by the
/// user definitions, in declaration order. Definitions only reference
/// definitions that come before them.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub defs: Vec<Def>,
    pub def_name_to_index: HashMap<String, TypeId>,
}

impl Schema {
    pub fn new(defs: Vec<Def>) -> Schema {
        let mut def_name_to_index = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            def_name_to_index.insert(def.name.clone(), i);
        }
        Schema {
            defs,
            def_name_to_index,
        }
    }

    /// A schema holding only the builtin scalars, in their canonical order.
    /// Their indices match the `TYPE_*` constants.
    pub fn builtins() -> Schema {
        let mut defs = vec![
            Def::new("astring".to_owned(), DefKind::AString),
            Def::new("ustring".to_owned(), DefKind::UString),
        ];
        for signed in [false, true] {
            for size in [1, 2, 4, 8] {
                let name = format!("{}int{}", if signed { "" } else { "u" }, size * 8);
                defs.push(Def::new(name, DefKind::Int { size, signed }));
            }
        }
        defs.push(Def::new("bool".to_owned(), DefKind::Bool));
        defs.push(Def::new("float32".to_owned(), DefKind::Float { size: 4 }));
        defs.push(Def::new("float64".to_owned(), DefKind::Float { size: 8 }));
        defs.push(Def::new("void".to_owned(), DefKind::Void));
        Schema::new(defs)
    }

    /// Appends a definition and returns its index.
    pub fn push(&mut self, def: Def) -> TypeId {
        let index = self.defs.len();
        self.def_name_to_index.insert(def.name.clone(), index);
        self.defs.push(def);
        index
    }

    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.def_name_to_index.get(name).copied()
    }

    pub fn def(&self, type_id: TypeId) -> &Def {
        &self.defs[type_id]
    }

    /// Follows aliases until a non-alias definition is reached.
    pub fn resolve(&self, mut type_id: TypeId) -> TypeId {
        while let DefKind::Alias { target } = self.defs[type_id].kind {
            type_id = target;
        }
        type_id
    }

    pub fn is_scalar(&self, type_id: TypeId) -> bool {
        matches!(
            self.defs[self.resolve(type_id)].kind,
            DefKind::Int { .. } | DefKind::Float { .. } | DefKind::Bool | DefKind::Enum { .. }
        )
    }

    /// The encoded size of `type_id` if it does not depend on the value.
    /// Unions, strings, arrays and structs with optional members never have
    /// one.
    pub fn constant_size(&self, type_id: TypeId) -> Option<usize> {
        match &self.defs[type_id].kind {
            DefKind::Int { size, .. } | DefKind::Float { size } => Some(*size),
            DefKind::Bool => Some(1),
            DefKind::Enum { num_bytes, .. } => Some(*num_bytes),
            DefKind::Alias { target } => self.constant_size(*target),
            DefKind::Struct { fields } => fields.iter().try_fold(0, |total, field| {
                if field.optional {
                    None
                } else {
                    self.constant_size(field.type_id).map(|size| total + size)
                }
            }),
            DefKind::Void => Some(0),
            DefKind::AString | DefKind::UString | DefKind::Array { .. } | DefKind::Union { .. } => {
                None
            }
        }
    }

    /// The symbolic name of an enum value, looking through aliases.
    pub fn enum_item_name(&self, type_id: TypeId, value: u32) -> Option<&str> {
        match &self.defs[self.resolve(type_id)].kind {
            DefKind::Enum { items, .. } => items
                .iter()
                .find(|item| item.value == value)
                .map(|item| item.name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    #[test]
    fn builtin_indices() {
        let schema = Schema::builtins();
        assert_eq!(schema.defs.len(), 14);
        assert_eq!(schema.find("astring"), Some(TYPE_ASTRING));
        assert_eq!(schema.find("ustring"), Some(TYPE_USTRING));
        assert_eq!(schema.find("uint8"), Some(TYPE_UINT8));
        assert_eq!(schema.find("uint64"), Some(TYPE_UINT64));
        assert_eq!(schema.find("int8"), Some(TYPE_INT8));
        assert_eq!(schema.find("int32"), Some(TYPE_INT32));
        assert_eq!(schema.find("int64"), Some(TYPE_INT64));
        assert_eq!(schema.find("bool"), Some(TYPE_BOOL));
        assert_eq!(schema.find("float32"), Some(TYPE_FLOAT32));
        assert_eq!(schema.find("float64"), Some(TYPE_FLOAT64));
        assert_eq!(schema.find("void"), Some(TYPE_VOID));
        assert_eq!(
            schema.def(TYPE_INT16).kind,
            DefKind::Int { size: 2, signed: true }
        );
    }

    #[test]
    fn constant_size_rules() {
        let mut schema = Schema::builtins();
        let point = schema.push(Def::new(
            "Point".to_owned(),
            DefKind::Struct {
                fields: vec![
                    Field { name: "x".to_owned(), type_id: TYPE_INT32, optional: false },
                    Field { name: "y".to_owned(), type_id: TYPE_INT32, optional: false },
                ],
            },
        ));
        let alias = schema.push(Def::new("Where".to_owned(), DefKind::Alias { target: point }));
        let named = schema.push(Def::new(
            "Named".to_owned(),
            DefKind::Struct {
                fields: vec![Field { name: "n".to_owned(), type_id: TYPE_INT8, optional: true }],
            },
        ));
        let list = schema.push(Def::new(
            "Points".to_owned(),
            DefKind::Array { item: point, item_name: "point".to_owned() },
        ));

        assert_eq!(schema.constant_size(point), Some(8));
        assert_eq!(schema.constant_size(alias), Some(8));
        assert_eq!(schema.constant_size(named), None);
        assert_eq!(schema.constant_size(list), None);
        assert_eq!(schema.constant_size(TYPE_ASTRING), None);
        assert_eq!(schema.constant_size(TYPE_BOOL), Some(1));
        assert_eq!(schema.resolve(alias), point);
        assert!(!schema.is_scalar(alias));
        assert!(schema.is_scalar(TYPE_FLOAT64));
    }

    #[test]
    fn enum_names() {
        let mut schema = Schema::builtins();
        let color = schema.push(Def::new(
            "Color".to_owned(),
            DefKind::Enum {
                items: vec![
                    EnumItem { name: "RED".to_owned(), value: 0 },
                    EnumItem { name: "GREEN".to_owned(), value: 1 },
                ],
                num_bytes: 1,
            },
        ));
        assert_eq!(schema.enum_item_name(color, 1), Some("GREEN"));
        assert_eq!(schema.enum_item_name(color, 7), None);
        assert!(schema.is_scalar(color));
    }
}
