use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

use brine_wire::dump_to_json;
use brine_wire_compiler::{
    compile_file, compile_schema_to_rust, GenerationPlan, RustOptions, Switches, WireError,
};

#[derive(Parser)]
#[command(name = "bwire", version)]
#[command(about = "Compile .wire schemas and generate Rust bindings", long_about = None)]
struct Cli {
    /// Input schema file
    input: PathBuf,

    /// Write the generated Rust module to this file
    #[arg(short, long, value_name = "FILE")]
    rust: Option<PathBuf>,

    /// Indent unit of the emitted source
    #[arg(short, long, value_name = "STRING", default_value = "    ")]
    indent: String,

    /// Read the input directly instead of running it through cpp
    #[arg(long)]
    no_cpp: bool,

    /// Wrap the emitted Rust in `pub mod <NAME>`
    #[arg(short, long, value_name = "NAME")]
    module: Option<String>,

    /// Path of the runtime crate as seen from the emitted code
    #[arg(long, value_name = "PATH", default_value = brine_wire_compiler::gen_rust::DEFAULT_RUNTIME)]
    runtime: String,

    /// Print the resolved type table as JSON
    #[arg(long)]
    dump: bool,

    /// Generate packed_size
    #[arg(long)]
    size: bool,

    /// Generate pack
    #[arg(long)]
    serialize: bool,

    /// Generate unpack
    #[arg(long)]
    deserialize: bool,

    /// Generate struct to_bytes (implies --serialize)
    #[arg(long)]
    wrap: bool,

    /// Generate struct from_bytes (implies --deserialize)
    #[arg(long)]
    unwrap: bool,

    /// Generate read_from for std::io::Read streams
    #[arg(long)]
    read_stream: bool,

    /// Generate write_to for std::io::Write streams (implies --serialize)
    #[arg(long)]
    write_stream: bool,

    /// Generate print
    #[arg(long)]
    print: bool,

    /// Generate struct constructors (implies --copy)
    #[arg(long)]
    create: bool,

    /// Generate struct member setters (implies --copy)
    #[arg(long)]
    set: bool,

    /// Generate copy_from (implies --clear)
    #[arg(long)]
    copy: bool,

    /// Generate dup (implies --copy)
    #[arg(long)]
    dup: bool,

    /// Generate clear
    #[arg(long)]
    clear: bool,

    /// Generate destroy (implies --clear)
    #[arg(long)]
    destroy: bool,

    /// Enable every operation family
    #[arg(long)]
    all: bool,
}

impl Cli {
    fn switches(&self) -> Switches {
        if self.all {
            return Switches::all();
        }
        Switches {
            size:         self.size,
            serialize:    self.serialize,
            deserialize:  self.deserialize,
            wrap:         self.wrap,
            unwrap:       self.unwrap,
            read_stream:  self.read_stream,
            write_stream: self.write_stream,
            print:        self.print,
            create:       self.create,
            set:          self.set,
            copy:         self.copy,
            dup:          self.dup,
            clear:        self.clear,
            destroy:      self.destroy,
        }
    }
}

fn main() -> Result<(), WireError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let table = compile_file(&cli.input, !cli.no_cpp)?;

    if cli.dump {
        println!("{}", dump_to_json(&table)?);
    }

    if let Some(out_path) = &cli.rust {
        let plan = GenerationPlan::new(&table, cli.switches());
        let options = RustOptions {
            indent:  cli.indent.clone(),
            runtime: cli.runtime.clone(),
            module:  cli.module.clone(),
        };
        let rust_code = compile_schema_to_rust(&plan, &options)?;
        fs::write(out_path, &rust_code)?;
        info!("Generated Rust code written to {}", out_path.display());
    }

    Ok(())
}
