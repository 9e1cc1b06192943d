//! brine-wire-compiler
//!
//! This crate implements:
//!  1) A tokenizer for `.wire` schema files that follows cpp line markers,
//!  2) A state-machine parser resolving names into an append-only type table,
//!  3) The code generation analysis (`generator`) shared by all backends,
//!  4) The Rust backend (`compile_schema_to_rust` → `String`),
//!  5) Lowering to the runtime's dynamic schema, and the `WireError` type.

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod generator;
pub mod compiler;
pub mod gen_rust;

pub use compiler::compile_file;
pub use compiler::compile_schema;
pub use compiler::preprocess_file;
pub use compiler::to_runtime_schema;
pub use error::WireError;
pub use gen_rust::{compile_schema_to_rust, RustOptions};
pub use generator::{GenerationPlan, Switches};
pub use types::TypeTable;
