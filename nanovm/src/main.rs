//! CLI front end for the virtual machine. Loads an image, drives the
//! [`vm_core::cpu::Cpu`] execute loop against real stdio, then reports
//! cycle count and elapsed time and offers the interactive memory dump —
//! argument parsing, file I/O, and the interactive prompt that sit
//! outside the VM core itself.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use vm_core::cpu::{Cpu, StdIo, DEFAULT_MEMORY_SIZE};
use vm_core::image::read_image;

/// NanoVM: executes a nanoasm binary image.
#[derive(Parser)]
#[command(name = "nanovm", version, about)]
struct Cli {
    /// Binary image to load and execute.
    image: std::path::PathBuf,

    /// Skip the interactive "Dump memory?" prompt after HALT.
    #[arg(long)]
    no_dump_prompt: bool,

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
    let mut file = File::open(&cli.image)
        .with_context(|| format!("error reading program image {}", cli.image.display()))?;

    let image = read_image(&mut file).context("error loading image")?;
    tracing::info!(bytes = image.bytes.len(), "loaded image");
    println!("Loaded {} bytes.", image.bytes.len());

    let mut cpu =
        Cpu::new(DEFAULT_MEMORY_SIZE, image.origin, &image.bytes).context("error loading image")?;

    let mut io = StdIo;
    let start = Instant::now();
    let cycles = cpu
        .run(&mut io)
        .with_context(|| format!("runtime error at PC ${:04x}", cpu.pc()))?;
    let elapsed = start.elapsed();

    println!(
        "Number of cycles: {cycles}. Execution time {} microseconds.",
        elapsed.as_micros()
    );

    if !cli.no_dump_prompt {
        maybe_dump_memory(cpu.ram())?;
    }

    Ok(())
}

/// Prompts for a memory dump exactly as the original VM does: `y` prints a
/// 16-byte-per-row hex + ASCII dump, anything else (including `n`) skips
/// it.
fn maybe_dump_memory(ram: &[u8]) -> Result<()> {
    print!("\nDump memory? (y or n) ");
    io::stdout().flush().context("failed writing to stdout")?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("failed reading from stdin")?;
    if answer.trim_start().chars().next() != Some('y') {
        return Ok(());
    }

    println!("$0000 to ${:04x}:", ram.len() - 1);
    for (row_index, row) in ram.chunks(16).enumerate() {
        print!("{:04x}:   ", row_index * 16);
        for byte in row {
            print!("{byte:02x} ");
        }
        print!("  ");
        for byte in row {
            print!("{}", printable_char(*byte));
        }
        println!();
    }
    Ok(())
}

fn printable_char(byte: u8) -> char {
    if byte < 33 || byte > 126 {
        '.'
    } else {
        byte as char
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn non_printable_bytes_render_as_a_dot() {
        assert_eq!(printable_char(0), '.');
        assert_eq!(printable_char(b'A'), 'A');
        assert_eq!(printable_char(127), '.');
    }
}
