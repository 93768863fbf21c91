//! Example: Running a program through an evaluator module.
//!
//! Loads a compiled evaluator module, evaluates a source file with it and
//! prints everything that ended up in the output.

use playground::{BridgeConfig, FileSource, Playground, Result};

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Playground Example ===\n");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <path-to-module.wasm> <source-file>", args[0]);
        std::process::exit(1);
    }

    let module_path = &args[1];
    let source = std::fs::read_to_string(&args[2]).map_err(playground::LoadError::from)?;

    println!("Loading module from: {}", module_path);
    let mut playground = Playground::new(BridgeConfig::default());
    playground.load(&FileSource::new(module_path)).await?;

    let formatted = playground.format(&source)?;
    if !formatted.is_empty() {
        println!("\nFormatted source:\n{}", formatted);
    }

    playground.run(&source)?;

    let output = playground.output();
    println!("\nOutput:");
    for line in output.lines() {
        println!("  {}", line);
    }
    if let Some(label) = output.last_update_label() {
        println!("\n{}", label);
    }

    println!("\n=== Example complete ===");
    Ok(())
}
