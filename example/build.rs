use std::{env, fs, path::PathBuf};

use brine_wire_compiler::{compile_file, compile_schema_to_rust, GenerationPlan, RustOptions, Switches};

/// Each schema is generated into `OUT_DIR/<module>.rs` as `pub mod <module>`.
const SCHEMAS: [(&str, &str); 2] = [("shapes.wire", "shapes"), ("scenarios.wire", "scenarios")];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    for (file, module) in SCHEMAS {
        let schema = PathBuf::from(file);
        println!("cargo:rerun-if-changed={}", schema.display());

        let table = compile_file(&schema, false).unwrap_or_else(|e| panic!("{}", e));
        let plan = GenerationPlan::new(&table, Switches::all());
        let options = RustOptions {
            module: Some(module.to_owned()),
            ..RustOptions::default()
        };
        let source = compile_schema_to_rust(&plan, &options).unwrap_or_else(|e| panic!("{}", e));

        fs::write(out_dir.join(format!("{}.rs", module)), source).unwrap();
    }
}
