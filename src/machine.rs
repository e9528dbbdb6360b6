//! An instruction level model of the target machine, for running programs without the hardware.
//! Each step decodes one byte of program ROM and carries it out in full.

use std::fmt::{Display, Formatter};

use log::warn;
#[cfg(feature = "trace_computation")]
use log::{debug, trace};
use prettytable::{format as TableFormat, Cell, Row, Table};
use strum::IntoEnumIterator;

use crate::bytecode::{decode, Instruction};
use crate::register::Register;

pub const MEMORY_SIZE: usize = 256;

pub struct Machine {

  // Memory Stores
  memory : [u8; MEMORY_SIZE], // Data memory, addressed by `a`
  rom    : [u8; MEMORY_SIZE], // Program memory, addressed by `p`

  // Registers //
  a       : u8,
  c       : u8,
  g       : u8,
  x       : u8,
  y       : u8,
  pc      : u8,   // Program counter
  buttons : u8,   // Button latch

  // Flags
  halted : bool,

  // For tracing computations :
  #[cfg(feature = "trace_computation")] last_instruction : Option<Instruction>

}

impl Machine {

  /// A machine in its power-on state with `program` loaded. Bytes past the end of ROM are dropped.
  pub fn new(program: &[u8]) -> Machine {
    if program.len() > MEMORY_SIZE {
      warn!(
        "Program is {} bytes but ROM holds {}. The remainder is ignored.",
        program.len(),
        MEMORY_SIZE
      );
    }

    let mut rom = [0u8; MEMORY_SIZE];
    let loaded  = program.len().min(MEMORY_SIZE);
    rom[..loaded].copy_from_slice(&program[..loaded]);

    Machine {
      memory  : [0u8; MEMORY_SIZE],
      rom,
      a       : 0,
      c       : 0,
      g       : 0,
      x       : 0,
      y       : 0,
      pc      : 0,
      buttons : 0,
      halted  : false,

      #[cfg(feature = "trace_computation")] last_instruction : None
    }
  }

  /// The value `register` puts on the bus.
  pub fn read(&self, register: Register) -> u8 {
    match register {
      Register::A => self.a,
      Register::C => self.c,
      Register::G => self.g,
      Register::M => self.memory[self.a as usize],
      Register::X => self.x,
      Register::Y => self.y,
      Register::N => 0,
      Register::P => self.pc,
      Register::B => self.buttons,
      Register::J => (self.c != 0) as u8,
      Register::L => self.a << 4,
      Register::S => self.x.wrapping_add(self.y),
      Register::D => self.x.wrapping_sub(self.y),
      Register::Z => 0
    }
  }

  fn write(&mut self, register: Register, value: u8) {
    match register {
      Register::A => self.a = value,
      Register::C => self.c = value,
      Register::G => self.g = value,
      Register::M => self.memory[self.a as usize] = value,
      Register::X => self.x = value,
      Register::Y => self.y = value,
      // `n` is a sink. Decoded instructions never name a read-only destination.
      _           => {}
    }
  }

  pub fn set_buttons(&mut self, buttons: u8) {
    self.buttons = buttons;
  }

  pub fn is_halted(&self) -> bool {
    self.halted
  }

  /// Executes the instruction at `p`, returning it, or returns `None` once halted.
  pub fn step(&mut self) -> Option<Instruction> {
    if self.halted {
      return None;
    }

    let instruction = decode(self.rom[self.pc as usize]);
    let jump_enabled = self.c != 0;
    let mut next     = self.pc.wrapping_add(1);

    match instruction {

      Instruction::Mov { destination, source } => {
        let value = self.read(source);
        self.write(destination, value);
      }

      Instruction::Ldi { destination, immediate } => {
        self.write(destination, immediate);
      }

      Instruction::Jez(target) => {
        if !jump_enabled {
          next = self.read(target);
        }
      }

      Instruction::Jnz(target) => {
        if jump_enabled {
          next = self.read(target);
        }
      }

      Instruction::Jni(immediate) => {
        if jump_enabled {
          next = immediate;
        }
      }

      Instruction::Hlt => {
        self.halted = true;
        next        = self.pc;
      }

      Instruction::Rst => {
        self.a = 0;
        self.c = 0;
        self.g = 0;
        self.x = 0;
        self.y = 0;
      }

    } // end match instruction

    #[cfg(feature = "trace_computation")]
      {
        debug!("{:#04x}: {:<10} {}", self.pc, instruction.to_string(), instruction.explain());
        self.last_instruction = Some(instruction);
      }

    self.pc = next;

    #[cfg(feature = "trace_computation")] trace!("\n{}", self);

    Some(instruction)
  }

  /// Steps until the machine halts or `limit` instructions have run. Returns the number that ran.
  pub fn run(&mut self, limit: usize) -> usize {
    let mut executed = 0;
    while executed < limit && self.step().is_some() {
      executed += 1;
    }
    executed
  }

  // region Display methods

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(
      row![ubl->"Register", ubr->"Unsigned", ubr->"Signed", ubr->"Hex", ubr->"Binary"]
    );

    for register in Register::iter() {
      let value  = self.read(register);
      let signed = value as i8;
      let hex    = format!("{:#04x}", value);
      let binary = format!("{:08b}", value);
      table.add_row(row![register, r->value, r->signed, r->hex, r->binary]);
    }
    table
  }

  /// Data memory as sixteen rows of sixteen bytes in hex, each row labeled with its first address.
  pub fn make_memory_table(&self) -> Table {
    const ROW_WIDTH: usize = 16;
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    let mut titles = vec![Cell::new("Address").style_spec("ubl")];
    titles.extend((0..ROW_WIDTH).map(|column| Cell::new(&format!("{:x}", column)).style_spec("ubr")));
    table.set_titles(Row::new(titles));

    for (index, bytes) in self.memory.chunks(ROW_WIDTH).enumerate() {
      let mut cells = vec![Cell::new(&format!("{:#04x}", index * ROW_WIDTH))];
      cells.extend(bytes.iter().map(|byte| Cell::new(&format!("{:02x}", byte)).style_spec("r")));
      table.add_row(Row::new(cells));
    }
    table
  }

  // endregion

}


lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {

  // We show the last instruction if `trace_computation` is on.
  #[cfg(feature = "trace_computation")]
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let status = match self.halted {
      true  => "Halted.",
      false => "Running."
    };
    let last = match self.last_instruction {
      Some(instruction) => instruction.to_string(),
      None              => "none".to_string()
    };

    write!(f, "{}\tLast instruction: {}\n{}", status, last, self.make_register_table())
  }

  #[cfg(not(feature = "trace_computation"))]
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let status = match self.halted {
      true  => "Halted.",
      false => "Running."
    };

    write!(f, "{}\n{}", status, self.make_register_table())
  }
}
