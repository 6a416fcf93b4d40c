//! Convert a clam.conf to clamd's config.toml
//!
//! Usage: convert-clam-conf <clam.conf> [output.toml] [--verbose]
//!
//! Keys without a TOML counterpart are listed as comments at the end.

use anyhow::{Context, Result};
use clam_node::config::parse_clam_conf;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "convert-clam-conf", about = "Convert clam.conf to clamd config.toml")]
struct Args {
    /// Input clam.conf
    input: PathBuf,

    /// Output file
    #[arg(default_value = "config.toml")]
    output: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn render(input: &PathBuf, body: &str, ignored: &[String]) -> String {
    let mut toml = String::new();
    toml.push_str("# clamd configuration\n");
    toml.push_str(&format!("# Converted from: {}\n\n", input.display()));
    toml.push_str(body);
    if !ignored.is_empty() {
        toml.push_str("\n# Not converted (no equivalent):\n");
        for key in ignored {
            toml.push_str(&format!("#   {}\n", key));
        }
    }
    toml
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        eprintln!("Reading clam.conf from: {}", args.input.display());
    }
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("input file '{}' not readable", args.input.display()))?;

    let import = parse_clam_conf(&content)?;
    let body = import.config.to_toml_string()?;
    fs::write(&args.output, render(&args.input, &body, &import.ignored))
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("Configuration converted");
    println!("  Input:  {}", args.input.display());
    println!("  Output: {}", args.output.display());
    if !import.ignored.is_empty() {
        println!("  Skipped {} unsupported key(s); see the end of the output", import.ignored.len());
    }
    Ok(())
}
