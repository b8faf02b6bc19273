//! CLI front end for the one-pass assembler. Parses arguments, reads the
//! source file, drives [`vm_core::asm::assemble`], and writes the binary
//! image — the argument parsing and file I/O that sit outside the core
//! lexer/encoder.

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use vm_core::asm::{assemble, render_error, AsmOptions};
use vm_core::image::write_image;

/// NanoASM: the one-pass assembler for nanovm binary images.
#[derive(Parser)]
#[command(name = "nanoasm", version, about)]
struct Cli {
    /// Assembly source file to compile.
    source: std::path::PathBuf,

    /// Path to write the assembled binary image to.
    out: std::path::PathBuf,

    /// Parse `%` literals as natural base-2 digits instead of replaying
    /// the historical decimal-digits-as-bits behavior.
    #[arg(long)]
    strict_binary: bool,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.source)
        .with_context(|| format!("can't open {} for reading", cli.source.display()))?;

    let options = AsmOptions {
        strict_binary_literals: cli.strict_binary,
    };

    let program =
        assemble(&source, options).map_err(|e| anyhow::anyhow!(render_error(&source, &e)))?;

    let mut out_file = fs::File::create(&cli.out)
        .with_context(|| format!("can't open {} for writing", cli.out.display()))?;
    write_image(&mut out_file, program.origin, &program.bytes)
        .with_context(|| format!("failed writing {}", cli.out.display()))?;

    tracing::info!(
        bytes = program.bytes.len(),
        origin = format!("${:04x}", program.origin),
        "assembled program"
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assembles_hello_number_to_the_expected_bytes() {
        let program = assemble("ORG $0200\nLDA #42\nOUT\nHALT\n", AsmOptions::default()).unwrap();
        assert_eq!(program.origin, 0x0200);
        assert_eq!(program.bytes, vec![0x00, 0x2A, 0x10, 0x0E]);
    }
}
