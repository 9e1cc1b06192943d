//! Runtime support for the brine-wire binary format. Generated code and the
//! dynamic [Value](enum.Value.html) engine both encode through the byte
//! buffers in this crate, so they agree bit for bit.
//!
//! ```
//! use brine_wire_schema::*;
//!
//! let mut schema = Schema::builtins();
//! let point = schema.push(Def::new("Point".to_owned(), DefKind::Struct {
//!     fields: vec![
//!         Field { name: "x".to_owned(), type_id: TYPE_INT32, optional: false },
//!         Field { name: "y".to_owned(), type_id: TYPE_INT32, optional: false },
//!     ],
//! }));
//!
//! let value = Value::Struct(vec![Value::Int(1), Value::Int(2)]);
//! assert_eq!(value.encode(&schema, point), [0, 0, 0, 1, 0, 0, 0, 2]);
//! assert_eq!(Value::decode(&schema, point, &[0, 0, 0, 1, 0, 0, 0, 2]), Ok(value));
//! ```

pub mod bb;
pub mod indent;
pub mod schema;
pub mod stream;
pub mod traits;
pub mod value;

pub use bb::*;
pub use indent::*;
pub use schema::*;
pub use stream::Stream;
pub use traits::*;
pub use value::*;

pub const TYPE_ASTRING: TypeId = 0;
pub const TYPE_USTRING: TypeId = 1;
pub const TYPE_UINT8: TypeId = 2;
pub const TYPE_UINT16: TypeId = 3;
pub const TYPE_UINT32: TypeId = 4;
pub const TYPE_UINT64: TypeId = 5;
pub const TYPE_INT8: TypeId = 6;
pub const TYPE_INT16: TypeId = 7;
pub const TYPE_INT32: TypeId = 8;
pub const TYPE_INT64: TypeId = 9;
pub const TYPE_BOOL: TypeId = 10;
pub const TYPE_FLOAT32: TypeId = 11;
pub const TYPE_FLOAT64: TypeId = 12;
pub const TYPE_VOID: TypeId = 13;
