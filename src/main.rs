// minnow - A tiny embeddable scripting language with a bytecode VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use minnow_embed::{Engine, Error, Value};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("Minnow v0.1.0");
        return;
    }

    let dump_bytecode = args.iter().any(|a| a == "--dump-bytecode");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if files.is_empty() {
        eprintln!("Usage: minnow [--dump-bytecode] <file.mnw>...");
        process::exit(1);
    }

    let mut engine = Engine::new();
    bind_host_functions(&mut engine);

    // Compiling every file onto one state concatenates the programs.
    for file_path in &files {
        if let Err(message) = compile_file(&mut engine, file_path) {
            eprintln!("{}", message);
            process::exit(1);
        }
    }

    for warning in engine.warnings() {
        eprintln!("Warning: {}", warning);
    }

    if dump_bytecode {
        print!("{}", engine.state().program().disassemble());
        return;
    }

    if let Err(e) = engine.run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Compile one source file, rendering compile errors against their source.
fn compile_file(engine: &mut Engine, file_path: &str) -> Result<(), String> {
    let path = Path::new(file_path);

    match path.extension().and_then(|e| e.to_str()) {
        Some("mnw") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}' (expected .mnw)",
                ext, file_path
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .mnw)",
                file_path
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {}", file_path, e))?;

    engine.compile(file_path, &source).map_err(|e| match e {
        Error::Compile(diagnostic) => diagnostic.render(&source),
        other => other.to_string(),
    })
}

/// The host surface scripts see: plain I/O through the foreign-function
/// interface.
fn bind_host_functions(engine: &mut Engine) {
    engine
        .bind_function("print", |thread, args| {
            for arg in args {
                println!("{}", thread.display_value(arg));
            }
            Ok(Value::Null)
        })
        .expect("binding print");
}
