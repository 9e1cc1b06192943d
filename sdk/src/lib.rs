//! brine-wire
//!
//! One dependency for applications using brine-wire: the compiler pipeline
//! for build scripts and tools, and the runtime that generated code and the
//! dynamic `Value` engine encode through.
//!
//! ```
//! use brine_wire::*;
//!
//! let table = compile_schema("Point = struct { int32 x int32 y }", "<string>").unwrap();
//! let schema = to_runtime_schema(&table);
//! let point = schema.find("Point").unwrap();
//!
//! let value = Value::Struct(vec![Value::Int(1), Value::Int(2)]);
//! assert_eq!(value.encode(&schema, point), [0, 0, 0, 1, 0, 0, 0, 2]);
//! ```

use serde::Serialize;

pub use brine_wire_compiler::{
    compile_file, compile_schema, compile_schema_to_rust, to_runtime_schema, GenerationPlan,
    RustOptions, Switches, TypeTable, WireError,
};
pub use brine_wire_schema::{
    ByteBuffer, ByteBufferMut, Def, DefKind, FixedSize, Indent, Schema, Stream, TypeId, Value, Wire,
};

/// Pretty-printed JSON for anything the compiler produces, such as a resolved
/// [TypeTable](struct.TypeTable.html) or a [GenerationPlan](struct.GenerationPlan.html).
pub fn dump_to_json<T: Serialize>(value: &T) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub mod error {
    pub use brine_wire_compiler::error::WireError;
}

pub mod schema {
    pub use brine_wire_schema::{Arm, Def, DefKind, EnumItem, Field, Schema, Value};
}
