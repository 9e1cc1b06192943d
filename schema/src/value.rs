use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    indent::{format_float, Indent},
    schema::{Arm, Def, DefKind, Field, Schema, TypeId},
};

use std::ops::Index;

/// This type holds dynamic wire data.
///
/// A Value carries no type information of its own beyond its shape: every
/// operation takes the [Schema](struct.Schema.html) and the `TypeId` the value
/// belongs to, and walks the definition and the value side by side. Struct
/// members are stored positionally in declaration order. Optional members are
/// wrapped in [Optional](#variant.Optional), and a union stores its
/// discriminant plus one payload slot per arm.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    AString(Vec<u8>),
    UString(String),
    Enum(u32),
    Array(Vec<Value>),
    Struct(Vec<Value>),
    Optional(Option<Box<Value>>),
    Union(Box<Value>, Vec<Value>),
}

impl Value {
    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract an integer out of an [Int](#variant.Int),
    /// [UInt](#variant.UInt) or [Enum](#variant.Enum). Returns `0` for other
    /// value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            Value::Int(value) => value,
            Value::UInt(value) => value as i64,
            Value::Enum(value) => value as i64,
            _ => 0,
        }
    }

    /// Returns `0` for other value kinds.
    pub fn as_uint(&self) -> u64 {
        match *self {
            Value::UInt(value) => value,
            _ => 0,
        }
    }

    /// Returns `0.0` for other value kinds.
    pub fn as_float(&self) -> f64 {
        match *self {
            Value::Float(value) => value,
            _ => 0.0,
        }
    }

    /// The raw bytes of an [AString](#variant.AString) or the UTF-8 bytes of a
    /// [UString](#variant.UString). Returns an empty slice for other value kinds.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Value::AString(ref value) => value.as_slice(),
            Value::UString(ref value) => value.as_bytes(),
            _ => &[],
        }
    }

    /// Returns `""` for other value kinds.
    pub fn as_str(&self) -> &str {
        match *self {
            Value::UString(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to get the elements out of an [Array](#variant.Array).
    /// Returns an empty slice for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to extract the length out of an [Array](#variant.Array).
    /// Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to an [Array](#variant.Array). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// The member at position `index` of a [Struct](#variant.Struct), with
    /// optional wrappers removed. Returns `None` for an absent optional member,
    /// an out-of-range index or other value kinds.
    pub fn member(&self, index: usize) -> Option<&Value> {
        match *self {
            Value::Struct(ref values) => match values.get(index)? {
                Value::Optional(inner) => inner.as_deref(),
                value => Some(value),
            },
            _ => None,
        }
    }

    /// A value of type `type_id` with every member zeroed, every optional
    /// absent and every array empty.
    pub fn zeroed(schema: &Schema, type_id: TypeId) -> Value {
        match &schema.def(type_id).kind {
            DefKind::Int { signed: true, .. } => Value::Int(0),
            DefKind::Int { signed: false, .. } => Value::UInt(0),
            DefKind::Float { .. } => Value::Float(0.0),
            DefKind::Bool => Value::Bool(false),
            DefKind::AString => Value::AString(Vec::new()),
            DefKind::UString => Value::UString(String::new()),
            DefKind::Void => Value::Void,
            DefKind::Alias { target } => Value::zeroed(schema, *target),
            DefKind::Array { .. } => Value::Array(Vec::new()),
            DefKind::Struct { fields } => Value::Struct(
                fields
                    .iter()
                    .map(|field| {
                        if field.optional {
                            Value::Optional(None)
                        } else {
                            Value::zeroed(schema, field.type_id)
                        }
                    })
                    .collect(),
            ),
            DefKind::Enum { .. } => Value::Enum(0),
            DefKind::Union {
                discriminant, arms, ..
            } => Value::Union(
                Box::new(Value::zeroed(schema, *discriminant)),
                arms.iter()
                    .map(|arm| Value::zeroed(schema, arm.type_id))
                    .collect(),
            ),
        }
    }

    /// Number of bytes [encode](#method.encode) will produce.
    pub fn packed_size(&self, schema: &Schema, type_id: TypeId) -> usize {
        let def = schema.def(type_id);
        match (&def.kind, self) {
            (DefKind::Alias { target }, _) => self.packed_size(schema, *target),
            (DefKind::Int { size, .. } | DefKind::Float { size }, _) => *size,
            (DefKind::Bool, _) => 1,
            (DefKind::Enum { num_bytes, .. }, _) => *num_bytes,
            (DefKind::Void, _) => 0,
            (DefKind::AString, Value::AString(bytes)) => 4 + bytes.len(),
            (DefKind::UString, Value::UString(text)) => 4 + text.len(),

            (DefKind::Array { item, .. }, Value::Array(items)) => {
                match schema.constant_size(*item) {
                    Some(size) => 4 + items.len() * size,
                    None => 4 + items
                        .iter()
                        .map(|value| value.packed_size(schema, *item))
                        .sum::<usize>(),
                }
            }

            (DefKind::Struct { fields }, Value::Struct(values)) if fields.len() == values.len() => {
                let mut size = 0;
                for (field, value) in fields.iter().zip(values) {
                    size += match (field.optional, value) {
                        (true, Value::Optional(Some(inner))) => {
                            1 + inner.packed_size(schema, field.type_id)
                        }
                        (true, Value::Optional(None)) => 1,
                        (true, _) => mismatch(def, value),
                        (false, _) => value.packed_size(schema, field.type_id),
                    };
                }
                size
            }

            (
                DefKind::Union {
                    discriminant, arms, ..
                },
                Value::Union(tag, payloads),
            ) if arms.len() == payloads.len() => {
                let mut size = tag.packed_size(schema, *discriminant);
                if let Some(index) = active_arm(arms, tag) {
                    size += payloads[index].packed_size(schema, arms[index].type_id);
                }
                size
            }

            _ => mismatch(def, self),
        }
    }

    /// Decodes the type specified by `type_id` and `schema` from `bytes`.
    pub fn decode(schema: &Schema, type_id: TypeId, bytes: &[u8]) -> Result<Value, ()> {
        let mut value = Value::zeroed(schema, type_id);
        value.decode_into(schema, type_id, &mut ByteBuffer::new(bytes))?;
        Ok(value)
    }

    /// Encodes this value into an array of bytes using the provided `schema`.
    pub fn encode(&self, schema: &Schema, type_id: TypeId) -> Vec<u8> {
        let mut bb = ByteBufferMut::with_capacity(self.packed_size(schema, type_id));
        self.encode_bb(schema, type_id, &mut bb);
        bb.data()
    }

    /// Encodes the current value to the end of `bb`. Fields and elements are
    /// written in declaration and index order.
    ///
    /// Panics if the shape of the value does not match `type_id`.
    pub fn encode_bb(&self, schema: &Schema, type_id: TypeId, bb: &mut ByteBufferMut) {
        let def = schema.def(type_id);
        match (&def.kind, self) {
            (DefKind::Alias { target }, _) => self.encode_bb(schema, *target, bb),
            (DefKind::Int { size, .. }, Value::Int(value)) => bb.write_uint(*value as u64, *size),
            (DefKind::Int { size, .. }, Value::UInt(value)) => bb.write_uint(*value, *size),
            (DefKind::Float { size: 4 }, Value::Float(value)) => bb.write_f32(*value as f32),
            (DefKind::Float { .. }, Value::Float(value)) => bb.write_f64(*value),
            (DefKind::Bool, Value::Bool(value)) => bb.write_bool(*value),
            (DefKind::AString, Value::AString(bytes)) => bb.write_astring(bytes),
            (DefKind::UString, Value::UString(text)) => bb.write_ustring(text),
            (DefKind::Void, _) => {}
            (DefKind::Enum { num_bytes, .. }, Value::Enum(value)) => {
                bb.write_uint(*value as u64, *num_bytes)
            }

            (DefKind::Array { item, .. }, Value::Array(items)) => {
                bb.write_u32(items.len() as u32);
                for value in items {
                    value.encode_bb(schema, *item, bb);
                }
            }

            (DefKind::Struct { fields }, Value::Struct(values)) if fields.len() == values.len() => {
                for (field, value) in fields.iter().zip(values) {
                    match (field.optional, value) {
                        (true, Value::Optional(Some(inner))) => {
                            bb.write_bool(true);
                            inner.encode_bb(schema, field.type_id, bb);
                        }
                        (true, Value::Optional(None)) => bb.write_bool(false),
                        (true, _) => mismatch(def, value),
                        (false, _) => value.encode_bb(schema, field.type_id, bb),
                    }
                }
            }

            (
                DefKind::Union {
                    discriminant, arms, ..
                },
                Value::Union(tag, payloads),
            ) if arms.len() == payloads.len() => {
                tag.encode_bb(schema, *discriminant, bb);
                if let Some(index) = active_arm(arms, tag) {
                    payloads[index].encode_bb(schema, arms[index].type_id, bb);
                }
            }

            _ => mismatch(def, self),
        }
    }

    /// Decodes into an existing value, reusing its storage. Arrays are resized
    /// to the decoded count with new slots zeroed. Optional members follow the
    /// presence byte: present stays present and is decoded in place, present
    /// becoming absent is cleared and dropped, absent becoming present gets a
    /// zeroed slot first.
    pub fn decode_into(
        &mut self,
        schema: &Schema,
        type_id: TypeId,
        bb: &mut ByteBuffer,
    ) -> Result<(), ()> {
        match &schema.def(type_id).kind {
            DefKind::Alias { target } => self.decode_into(schema, *target, bb)?,
            DefKind::Int { size, signed: true } => {
                let shift = 64 - 8 * (*size as u32);
                let raw = bb.read_uint(*size)?;
                *self = Value::Int(((raw << shift) as i64) >> shift);
            }
            DefKind::Int { size, signed: false } => *self = Value::UInt(bb.read_uint(*size)?),
            DefKind::Float { size: 4 } => *self = Value::Float(bb.read_f32()? as f64),
            DefKind::Float { .. } => *self = Value::Float(bb.read_f64()?),
            DefKind::Bool => *self = Value::Bool(bb.read_bool()?),
            DefKind::AString => *self = Value::AString(bb.read_astring()?),
            DefKind::UString => *self = Value::UString(bb.read_ustring()?),
            DefKind::Void => *self = Value::Void,
            DefKind::Enum { num_bytes, .. } => {
                *self = Value::Enum(bb.read_uint(*num_bytes)? as u32)
            }

            DefKind::Array { item, .. } => {
                let count = bb.read_u32()? as usize;
                // Every variable-size item takes at least one byte.
                let fits = match schema.constant_size(*item) {
                    Some(0) => true,
                    Some(size) => count <= bb.remaining() / size,
                    None => count <= bb.remaining(),
                };
                if !fits {
                    return Err(());
                }
                let Value::Array(items) = self.reshape(schema, type_id) else {
                    return Err(());
                };
                items.resize_with(count, || Value::zeroed(schema, *item));
                for value in items.iter_mut() {
                    value.decode_into(schema, *item, bb)?;
                }
            }

            DefKind::Struct { fields } => {
                let Value::Struct(values) = self.reshape(schema, type_id) else {
                    return Err(());
                };
                for (field, value) in fields.iter().zip(values.iter_mut()) {
                    if field.optional {
                        decode_optional(value, schema, field, bb)?;
                    } else {
                        value.decode_into(schema, field.type_id, bb)?;
                    }
                }
            }

            DefKind::Union {
                discriminant, arms, ..
            } => {
                let Value::Union(tag, payloads) = self.reshape(schema, type_id) else {
                    return Err(());
                };
                tag.decode_into(schema, *discriminant, bb)?;
                if let Some(index) = active_arm(arms, tag) {
                    payloads[index].decode_into(schema, arms[index].type_id, bb)?;
                }
            }
        }
        Ok(())
    }

    /// Deep-copies `src` into this value. The destination is cleared first,
    /// then scalars are copied by value and aggregates recursively. For a union
    /// only the discriminant and the arm it selects are copied.
    pub fn copy_from(&mut self, schema: &Schema, type_id: TypeId, src: &Value) {
        let def = schema.def(type_id);
        if let DefKind::Alias { target } = def.kind {
            return self.copy_from(schema, target, src);
        }

        self.clear(schema, type_id);

        match (&def.kind, src) {
            (DefKind::Array { item, .. }, Value::Array(items)) => {
                *self = Value::Array(
                    items
                        .iter()
                        .map(|value| {
                            let mut copy = Value::zeroed(schema, *item);
                            copy.copy_from(schema, *item, value);
                            copy
                        })
                        .collect(),
                );
            }

            (DefKind::Struct { fields }, Value::Struct(values)) if fields.len() == values.len() => {
                let Value::Struct(dst) = self.reshape(schema, type_id) else {
                    return;
                };
                for ((field, dst), src) in fields.iter().zip(dst.iter_mut()).zip(values) {
                    match (field.optional, src) {
                        (true, Value::Optional(Some(inner))) => {
                            *dst = Value::Optional(Some(inner.dup(schema, field.type_id)))
                        }
                        (true, _) => *dst = Value::Optional(None),
                        (false, _) => dst.copy_from(schema, field.type_id, src),
                    }
                }
            }

            (
                DefKind::Union {
                    discriminant, arms, ..
                },
                Value::Union(tag, payloads),
            ) if arms.len() == payloads.len() => {
                let Value::Union(dst_tag, dst_payloads) = self.reshape(schema, type_id) else {
                    return;
                };
                dst_tag.copy_from(schema, *discriminant, tag);
                if let Some(index) = active_arm(arms, tag) {
                    dst_payloads[index].copy_from(schema, arms[index].type_id, &payloads[index]);
                }
            }

            (DefKind::Array { .. } | DefKind::Struct { .. } | DefKind::Union { .. }, _) => {
                mismatch(def, src)
            }

            _ => *self = src.clone(),
        }
    }

    /// Releases everything this value owns and resets it to its zero form.
    ///
    /// A union only clears the arm selected by its current discriminant, and
    /// keeps the discriminant. Change the discriminant only after clearing, or
    /// the previous arm's payload is left behind.
    pub fn clear(&mut self, schema: &Schema, type_id: TypeId) {
        match &schema.def(type_id).kind {
            DefKind::Alias { target } => self.clear(schema, *target),

            DefKind::Array { item, .. } => match self {
                Value::Array(items) => {
                    for value in items.iter_mut() {
                        value.clear(schema, *item);
                    }
                    items.clear();
                }
                _ => *self = Value::zeroed(schema, type_id),
            },

            DefKind::Struct { fields } => match self {
                Value::Struct(values) if values.len() == fields.len() => {
                    for (field, value) in fields.iter().zip(values.iter_mut()) {
                        if field.optional {
                            *value = Value::Optional(None);
                        } else {
                            value.clear(schema, field.type_id);
                        }
                    }
                }
                _ => *self = Value::zeroed(schema, type_id),
            },

            DefKind::Union { arms, .. } => match self {
                Value::Union(tag, payloads) if payloads.len() == arms.len() => {
                    if let Some(index) = active_arm(arms, tag) {
                        payloads[index].clear(schema, arms[index].type_id);
                    }
                }
                _ => *self = Value::zeroed(schema, type_id),
            },

            _ => *self = Value::zeroed(schema, type_id),
        }
    }

    /// A fresh heap copy of this value.
    pub fn dup(&self, schema: &Schema, type_id: TypeId) -> Box<Value> {
        let mut copy = Box::new(Value::zeroed(schema, type_id));
        copy.copy_from(schema, type_id, self);
        copy
    }

    /// Clears a heap-owned value and releases it.
    pub fn destroy(mut self: Box<Self>, schema: &Schema, type_id: TypeId) {
        self.clear(schema, type_id);
    }

    /// Appends the human-readable form of this value to `out`. Aggregates span
    /// several lines, each member indented one level deeper than `level`; the
    /// closing brace is written at `level` with no trailing newline.
    pub fn print(
        &self,
        schema: &Schema,
        type_id: TypeId,
        out: &mut String,
        indent: &Indent,
        level: usize,
    ) {
        let def = schema.def(type_id);
        match (&def.kind, self) {
            (DefKind::Alias { target }, _) => self.print(schema, *target, out, indent, level),
            (DefKind::Void, _) => {}

            (DefKind::Array { item, item_name }, Value::Array(items)) => {
                out.push_str("{\n");
                for value in items {
                    indent.write(out, level + 1);
                    out.push_str(item_name);
                    out.push_str(": ");
                    value.print(schema, *item, out, indent, level + 1);
                    out.push('\n');
                }
                indent.write(out, level);
                out.push('}');
            }

            (DefKind::Struct { fields }, Value::Struct(values)) if fields.len() == values.len() => {
                out.push_str("{\n");
                for (field, value) in fields.iter().zip(values) {
                    indent.write(out, level + 1);
                    out.push_str(&field.name);
                    out.push_str(": ");
                    match value {
                        Value::Optional(None) => out.push_str("<none>"),
                        Value::Optional(Some(inner)) => {
                            inner.print(schema, field.type_id, out, indent, level + 1)
                        }
                        _ => value.print(schema, field.type_id, out, indent, level + 1),
                    }
                    out.push('\n');
                }
                indent.write(out, level);
                out.push('}');
            }

            (DefKind::Enum { items, .. }, Value::Enum(value)) => {
                if let Some(item) = items.iter().find(|item| item.value == *value) {
                    out.push_str(&item.name);
                }
            }

            (
                DefKind::Union {
                    discriminant, arms, ..
                },
                Value::Union(tag, payloads),
            ) if arms.len() == payloads.len() => {
                tag.print(schema, *discriminant, out, indent, level);
                out.push(' ');
                if let Some(index) = active_arm(arms, tag) {
                    payloads[index].print(schema, arms[index].type_id, out, indent, level);
                }
            }

            (_, Value::Bool(value)) => out.push_str(if *value { "true" } else { "false" }),
            (_, Value::Int(value)) => out.push_str(&value.to_string()),
            (_, Value::UInt(value)) => out.push_str(&value.to_string()),
            (_, Value::Float(value)) => out.push_str(&format_float(*value)),
            (_, Value::AString(_) | Value::UString(_)) => {
                out.push('"');
                out.push_str(&String::from_utf8_lossy(self.as_bytes()));
                out.push('"');
            }

            _ => mismatch(def, self),
        }
    }

    /// [print](#method.print) into a new string, starting at level 0.
    pub fn to_text(&self, schema: &Schema, type_id: TypeId, indent: &Indent) -> String {
        let mut out = String::new();
        self.print(schema, type_id, &mut out, indent, 0);
        out
    }

    fn reshape(&mut self, schema: &Schema, type_id: TypeId) -> &mut Value {
        let fits = match (&schema.def(type_id).kind, &*self) {
            (DefKind::Array { .. }, Value::Array(_)) => true,
            (DefKind::Struct { fields }, Value::Struct(values)) => fields.len() == values.len(),
            (DefKind::Union { arms, .. }, Value::Union(_, payloads)) => {
                arms.len() == payloads.len()
            }
            _ => false,
        };
        if !fits {
            *self = Value::zeroed(schema, type_id);
        }
        self
    }
}

fn decode_optional(
    value: &mut Value,
    schema: &Schema,
    field: &Field,
    bb: &mut ByteBuffer,
) -> Result<(), ()> {
    let present = bb.read_bool()?;
    if !matches!(value, Value::Optional(_)) {
        *value = Value::Optional(None);
    }
    let Value::Optional(slot) = value else {
        return Err(());
    };

    if present {
        let inner = slot.get_or_insert_with(|| Box::new(Value::zeroed(schema, field.type_id)));
        inner.decode_into(schema, field.type_id, bb)
    } else {
        if let Some(inner) = slot.take() {
            inner.destroy(schema, field.type_id);
        }
        Ok(())
    }
}

/// The arm whose label equals the discriminant, if any. A discriminant that
/// matches no arm carries no payload.
fn active_arm(arms: &[Arm], tag: &Value) -> Option<usize> {
    let value = tag.as_int();
    arms.iter().position(|arm| arm.value == value)
}

fn mismatch(def: &Def, value: &Value) -> ! {
    panic!("value {:?} does not match type {}", value, def.name)
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions on
    /// arrays and structs. It will panic for other value kinds or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) | Value::Struct(ref values) => &values[index],
            _ => panic!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumItem;
    use crate::*;

    struct Fixture {
        schema: Schema,
        point:  TypeId,
        name:   TypeId,
        color:  TypeId,
        kind:   TypeId,
        shape:  TypeId,
        shapes: TypeId,
    }

    fn field(name: &str, type_id: TypeId, optional: bool) -> Field {
        Field {
            name: name.to_owned(),
            type_id,
            optional,
        }
    }

    fn item(name: &str, value: u32) -> EnumItem {
        EnumItem {
            name: name.to_owned(),
            value,
        }
    }

    fn fixture() -> Fixture {
        let mut schema = Schema::builtins();
        let point = schema.push(Def::new(
            "Point".to_owned(),
            DefKind::Struct {
                fields: vec![field("x", TYPE_INT32, false), field("y", TYPE_INT32, false)],
            },
        ));
        let name = schema.push(Def::new(
            "Name".to_owned(),
            DefKind::Struct {
                fields: vec![field("nickname", TYPE_ASTRING, true)],
            },
        ));
        let color = schema.push(Def::new(
            "Color".to_owned(),
            DefKind::Enum {
                items: vec![item("RED", 0), item("GREEN", 1), item("BLUE", 2)],
                num_bytes: 1,
            },
        ));
        let kind = schema.push(Def::new(
            "ShapeKind".to_owned(),
            DefKind::Enum {
                items: vec![item("CIRCLE", 0), item("SQUARE", 1), item("NONE", 2)],
                num_bytes: 1,
            },
        ));
        let shape = schema.push(Def::new(
            "Shape".to_owned(),
            DefKind::Union {
                discriminant:      kind,
                discriminant_name: "kind".to_owned(),
                arms:              vec![
                    Arm { value: 0, type_id: TYPE_FLOAT64, name: Some("radius".to_owned()) },
                    Arm { value: 1, type_id: point, name: Some("corner".to_owned()) },
                    Arm { value: 2, type_id: TYPE_VOID, name: None },
                ],
            },
        ));
        let shapes = schema.push(Def::new(
            "Shapes".to_owned(),
            DefKind::Array {
                item:      shape,
                item_name: "shape".to_owned(),
            },
        ));
        Fixture {
            schema,
            point,
            name,
            color,
            kind,
            shape,
            shapes,
        }
    }

    fn point(x: i64, y: i64) -> Value {
        Value::Struct(vec![Value::Int(x), Value::Int(y)])
    }

    fn nickname(text: Option<&str>) -> Value {
        Value::Struct(vec![Value::Optional(
            text.map(|text| Box::new(Value::AString(text.as_bytes().to_vec()))),
        )])
    }

    fn square(x: i64, y: i64) -> Value {
        Value::Union(
            Box::new(Value::Enum(1)),
            vec![Value::Float(0.0), point(x, y), Value::Void],
        )
    }

    #[test]
    fn value_accessors() {
        let value = Value::Array(vec![
            Value::Bool(true),
            Value::Int(-1),
            Value::UInt(7),
            Value::Float(0.5),
            Value::AString(b"abc".to_vec()),
            Value::UString("def".to_owned()),
            Value::Enum(2),
            nickname(Some("Al")),
        ]);

        assert_eq!(value.len(), 8);
        assert_eq!(value[0].as_bool(), true);
        assert_eq!(value[1].as_int(), -1);
        assert_eq!(value[2].as_uint(), 7);
        assert_eq!(value[3].as_float(), 0.5);
        assert_eq!(value[4].as_bytes(), b"abc");
        assert_eq!(value[5].as_str(), "def");
        assert_eq!(value[6].as_int(), 2);
        assert_eq!(value[7].member(0), Some(&Value::AString(b"Al".to_vec())));
        assert_eq!(nickname(None).member(0), None);
        assert_eq!(value[0].as_int(), 0);
        assert_eq!(value[1].as_str(), "");
    }

    #[test]
    fn value_push() {
        let mut value = Value::Array(vec![]);
        assert!(value.is_empty());

        value.push(Value::Int(123));
        value.push(Value::Int(456));
        assert_eq!(value.len(), 2);
        assert_eq!(value[1], Value::Int(456));
    }

    #[test]
    fn encode_point() {
        let f = fixture();
        let value = point(1, 2);
        assert_eq!(value.encode(&f.schema, f.point), [0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(value.packed_size(&f.schema, f.point), 8);
        assert_eq!(f.schema.constant_size(f.point), Some(8));
    }

    #[test]
    fn encode_optional() {
        let f = fixture();
        assert_eq!(nickname(None).encode(&f.schema, f.name), [0]);
        assert_eq!(
            nickname(Some("Al")).encode(&f.schema, f.name),
            [1, 0, 0, 0, 2, b'A', b'l']
        );
        assert_eq!(nickname(Some("Al")).packed_size(&f.schema, f.name), 7);
    }

    #[test]
    fn encode_enum() {
        let f = fixture();
        assert_eq!(Value::Enum(1).encode(&f.schema, f.color), [1]);
        assert_eq!(Value::decode(&f.schema, f.color, &[2]), Ok(Value::Enum(2)));
    }

    #[test]
    fn encode_union() {
        let f = fixture();
        assert_eq!(
            square(3, 4).encode(&f.schema, f.shape),
            [1, 0, 0, 0, 3, 0, 0, 0, 4]
        );

        let circle = Value::Union(
            Box::new(Value::Enum(0)),
            vec![Value::Float(1.0), point(0, 0), Value::Void],
        );
        assert_eq!(
            circle.encode(&f.schema, f.shape),
            [0, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
        );

        let none = Value::Union(
            Box::new(Value::Enum(2)),
            vec![Value::Float(0.0), point(0, 0), Value::Void],
        );
        assert_eq!(none.encode(&f.schema, f.shape), [2]);
        assert_eq!(none.packed_size(&f.schema, f.shape), 1);
    }

    #[test]
    fn encode_array() {
        let f = fixture();
        let value = Value::Array(vec![square(1, 2), square(3, 4)]);
        let bytes = value.encode(&f.schema, f.shapes);
        assert_eq!(&bytes[..4], [0, 0, 0, 2]);
        assert_eq!(bytes.len(), 4 + 9 + 9);
        assert_eq!(value.packed_size(&f.schema, f.shapes), bytes.len());
        assert_eq!(Value::decode(&f.schema, f.shapes, &bytes), Ok(value));
    }

    #[test]
    fn decode_signed_widths() {
        let schema = Schema::builtins();
        assert_eq!(Value::decode(&schema, TYPE_INT8, &[0xff]), Ok(Value::Int(-1)));
        assert_eq!(Value::decode(&schema, TYPE_INT16, &[0x80, 0]), Ok(Value::Int(-32768)));
        assert_eq!(Value::decode(&schema, TYPE_UINT16, &[0x80, 0]), Ok(Value::UInt(32768)));
        assert_eq!(
            Value::decode(&schema, TYPE_INT64, &[255, 255, 255, 255, 255, 255, 255, 254]),
            Ok(Value::Int(-2))
        );
        assert_eq!(Value::Int(-1).encode(&schema, TYPE_INT16), [255, 255]);
        assert_eq!(Value::decode(&schema, TYPE_INT32, &[0, 0, 1]), Err(()));
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let f = fixture();
        assert_eq!(Value::decode(&f.schema, f.name, &[1, 0, 0, 0, 2, b'A']), Err(()));
        assert_eq!(Value::decode(&f.schema, f.name, &[2]), Err(()));
        assert_eq!(Value::decode(&f.schema, f.shapes, &[0, 0, 0, 9, 1]), Err(()));
    }

    #[test]
    fn decode_rejects_oversized_counts() {
        let mut f = fixture();
        let words = f.schema.push(Def::new(
            "Words".to_owned(),
            DefKind::Array {
                item:      TYPE_ASTRING,
                item_name: "word".to_owned(),
            },
        ));
        assert_eq!(Value::decode(&f.schema, words, &[0xff, 0xff, 0xff, 0xff]), Err(()));
        assert_eq!(Value::decode(&f.schema, f.shapes, &[0xff, 0xff, 0xff, 0xff, 2]), Err(()));
        assert_eq!(
            Value::decode(&f.schema, words, &[0, 0, 0, 1, 0, 0, 0, 1, b'a']),
            Ok(Value::Array(vec![Value::AString(b"a".to_vec())]))
        );
    }

    #[test]
    fn optional_presence_transitions() {
        let f = fixture();

        let mut value = nickname(Some("Bob"));
        value
            .decode_into(&f.schema, f.name, &mut ByteBuffer::new(&[0]))
            .unwrap();
        assert_eq!(value, nickname(None));

        value
            .decode_into(&f.schema, f.name, &mut ByteBuffer::new(&[1, 0, 0, 0, 2, b'A', b'l']))
            .unwrap();
        assert_eq!(value, nickname(Some("Al")));

        value
            .decode_into(&f.schema, f.name, &mut ByteBuffer::new(&[1, 0, 0, 0, 1, b'X']))
            .unwrap();
        assert_eq!(value, nickname(Some("X")));

        let mut value = nickname(None);
        value
            .decode_into(&f.schema, f.name, &mut ByteBuffer::new(&[0]))
            .unwrap();
        assert_eq!(value, nickname(None));
    }

    #[test]
    fn decode_into_resizes_arrays() {
        let f = fixture();
        let mut value = Value::Array(vec![square(1, 1), square(2, 2), square(3, 3)]);
        let bytes = Value::Array(vec![square(9, 9)]).encode(&f.schema, f.shapes);
        value
            .decode_into(&f.schema, f.shapes, &mut ByteBuffer::new(&bytes))
            .unwrap();
        assert_eq!(value, Value::Array(vec![square(9, 9)]));
    }

    #[test]
    fn round_trip() {
        let f = fixture();
        for (value, type_id) in [
            (point(-5, 70000), f.point),
            (nickname(Some("Alphonse")), f.name),
            (nickname(None), f.name),
            (Value::Array(vec![square(1, 2)]), f.shapes),
            (Value::Enum(2), f.kind),
        ] {
            let bytes = value.encode(&f.schema, type_id);
            assert_eq!(value.packed_size(&f.schema, type_id), bytes.len());
            assert_eq!(Value::decode(&f.schema, type_id, &bytes), Ok(value));
        }
    }

    #[test]
    fn clear_is_idempotent() {
        let f = fixture();
        let mut value = Value::Array(vec![square(1, 2)]);
        value.clear(&f.schema, f.shapes);
        assert_eq!(value, Value::Array(vec![]));
        value.clear(&f.schema, f.shapes);
        assert_eq!(value, Value::Array(vec![]));

        let mut value = nickname(Some("Al"));
        value.clear(&f.schema, f.name);
        let once = value.clone();
        value.clear(&f.schema, f.name);
        assert_eq!(value, once);
        assert_eq!(value, nickname(None));

        let mut value = Value::Enum(2);
        value.clear(&f.schema, f.color);
        assert_eq!(value, Value::Enum(0));
    }

    #[test]
    fn clear_union_follows_current_discriminant() {
        let f = fixture();
        let mut value = square(3, 4);
        if let Value::Union(tag, _) = &mut value {
            **tag = Value::Enum(0);
        }
        value.clear(&f.schema, f.shape);

        // The SQUARE payload was not selected, so it survives the clear.
        assert_eq!(
            value,
            Value::Union(
                Box::new(Value::Enum(0)),
                vec![Value::Float(0.0), point(3, 4), Value::Void],
            )
        );
    }

    #[test]
    fn copy_fidelity() {
        let f = fixture();
        let mut src = Value::Array(vec![square(1, 2), square(3, 4)]);
        let mut dst = Value::Array(vec![square(7, 7)]);
        dst.copy_from(&f.schema, f.shapes, &src);
        assert_eq!(dst, src);

        src.push(square(5, 6));
        if let Value::Array(items) = &mut src {
            items[0].clear(&f.schema, f.shape);
        }
        assert_eq!(dst, Value::Array(vec![square(1, 2), square(3, 4)]));

        let src = nickname(Some("Al"));
        let mut dst = nickname(None);
        dst.copy_from(&f.schema, f.name, &src);
        assert_eq!(dst, src);

        let copy = src.dup(&f.schema, f.name);
        assert_eq!(*copy, src);
        copy.destroy(&f.schema, f.name);
    }

    #[test]
    fn print_values() {
        let f = fixture();
        let indent = Indent::default();

        assert_eq!(
            point(1, 2).to_text(&f.schema, f.point, &indent),
            "{\n    x: 1\n    y: 2\n}"
        );
        assert_eq!(
            nickname(None).to_text(&f.schema, f.name, &indent),
            "{\n    nickname: <none>\n}"
        );
        assert_eq!(
            nickname(Some("Al")).to_text(&f.schema, f.name, &Indent::new("\t")),
            "{\n\tnickname: \"Al\"\n}"
        );
        assert_eq!(Value::Enum(1).to_text(&f.schema, f.color, &indent), "GREEN");
        assert_eq!(
            Value::Array(vec![square(1, 2)]).to_text(&f.schema, f.shapes, &Indent::new("  ")),
            "{\n  shape: SQUARE {\n    x: 1\n    y: 2\n  }\n}"
        );
        assert_eq!(
            Value::Float(0.25).to_text(&f.schema, TYPE_FLOAT32, &indent),
            "0.25"
        );
        assert_eq!(Value::Bool(true).to_text(&f.schema, TYPE_BOOL, &indent), "true");
    }
}
