#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

mod bytecode;
mod error;
mod machine;
mod microcode;
mod pages;
mod register;
mod stream;
mod token;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::machine::Machine;
use crate::pages::PackTarget;

/// Toolchain for the Z 8-bit machine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Assemble source text into machine code
  Assemble {
    source : PathBuf,
    output : PathBuf,
  },

  /// Turn machine code back into source text
  Disassemble {
    input  : PathBuf,
    output : PathBuf,
  },

  /// Write one page of the control ROM
  Rom {
    output : PathBuf,
    /// Page to write, 0 to 2
    page   : usize,
    /// Also print the signal to pin assignment
    #[arg(long)]
    pins   : bool,
  },

  /// Run a program on the simulator and print the final state
  Run {
    program : PathBuf,
    /// Maximum number of instructions to execute
    #[arg(long, default_value_t = 1024)]
    steps   : usize,
    /// Button latch value, in binary
    #[arg(long, value_parser = parse_buttons)]
    buttons : Option<u8>,
    /// Also print data memory
    #[arg(long)]
    memory  : bool,
  },

  /// Rewire a 256 byte page image for a board: i(nstruction), n(umber) or m(icrocode)
  Pack {
    input  : PathBuf,
    output : PathBuf,
    target : PackTarget,
  },

  /// Write a 7-segment number page: 0 for the low nibble, 1 for the high nibble
  Numbers {
    output : PathBuf,
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    page   : u8,
  },
}

fn parse_buttons(text: &str) -> Result<u8, String> {
  u8::from_str_radix(text.trim_start_matches("0b"), 2).map_err(|e| e.to_string())
}

fn open(path: &Path) -> Result<BufReader<File>> {
  let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
  Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
  let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
  Ok(BufWriter::new(file))
}

/// Builds the page before touching `output`, so a bad page number leaves an existing file intact.
fn write_rom(output: &Path, page: usize) -> Result<()> {
  let mut image = Vec::with_capacity(microcode::PAGE_SIZE);
  microcode::generate_rom_page(&mut image, page)?;
  let mut rom = create(output)?;
  rom.write_all(&image).with_context(|| format!("failed to write {:?}", output))?;
  rom.flush().with_context(|| format!("failed to write {:?}", output))?;
  Ok(())
}

fn main() -> Result<()> {
  let env = env_logger::Env::default()
      .filter_or("ZASM_LOG", "info")
      .write_style_or("ZASM_LOG", "auto");
  env_logger::init_from_env(env);

  #[cfg(feature = "trace_computation")]
  log::debug!("Computation tracing enabled.");

  match Args::parse().command {

    Command::Assemble { source, output } => {
      let mut binary = create(&output)?;
      // Output is flushed by `compile` whether or not it succeeds.
      match bytecode::compile(open(&source)?, &mut binary) {
        Ok(compilation) => {
          info!(
            "Assembled {} instructions from {} lines into {:?}.",
            compilation.instructions,
            compilation.lines,
            output
          );
        }
        Err(error) => {
          eprintln!("{}", error);
          process::exit(1);
        }
      }
    }

    Command::Disassemble { input, output } => {
      let mut text = create(&output)?;
      let count    = bytecode::disassemble(open(&input)?, &mut text)?;
      text.flush().with_context(|| format!("failed to write {:?}", output))?;
      info!("Disassembled {} bytes into {:?}.", count, output);
    }

    Command::Rom { output, page, pins } => {
      if pins {
        microcode::pin_table().printstd();
      }
      write_rom(&output, page)?;
      info!("Wrote control ROM page {} to {:?}.", page, output);
    }

    Command::Run { program, steps, buttons, memory } => {
      let program = fs::read(&program).with_context(|| format!("failed to read {:?}", program))?;
      let mut machine = Machine::new(&program);
      if let Some(buttons) = buttons {
        machine.set_buttons(buttons);
      }
      let executed = machine.run(steps);
      match machine.is_halted() {
        true  => info!("Halted after {} instructions.", executed),
        false => warn!("Stopped at the limit of {} instructions without halting.", executed)
      }
      println!("{}", machine);
      if memory {
        machine.make_memory_table().printstd();
      }
    }

    Command::Pack { input, output, target } => {
      let mut packed = create(&output)?;
      pages::pack(open(&input)?, &mut packed, target)
          .with_context(|| format!("failed to pack {:?}", input))?;
      packed.flush().with_context(|| format!("failed to write {:?}", output))?;
      info!("Packed {:?} for target {} into {:?}.", input, target, output);
    }

    Command::Numbers { output, page } => {
      let mut numbers = create(&output)?;
      pages::generate_numbers(&mut numbers, page == 1)
          .with_context(|| format!("failed to write {:?}", output))?;
      numbers.flush().with_context(|| format!("failed to write {:?}", output))?;
      info!("Wrote number page {} to {:?}.", page, output);
    }

  } // end match command

  Ok(())
}
