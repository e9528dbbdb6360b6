use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::register::Register;

/// A four bit unsigned constant embedded in an instruction.
pub type Immediate = u8;
pub const IMMEDIATE_MAX: Immediate = 0b1111;

/**
  Operations of the target machine. The textual form of each variant is its three letter
  assembly mnemonic.
*/
#[derive(
  StrumDisplay, EnumString, IntoStaticStr, EnumIter,
  Clone,        Copy,       Eq, PartialEq,  Debug,   Hash
)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
  Mov,   // mov( destination, source )
  Ldi,   // ldi( destination, immediate )
  Jez,   // jez( target )
  Jnz,   // jnz( target )
  Jni,   // jni( immediate )
  Hlt,   // hlt
  Rst,   // rst
}

impl Opcode {
  /// The number of operands that follow the mnemonic.
  pub fn arity(&self) -> usize {
    match self {
      Opcode::Mov | Opcode::Ldi                 => 2,
      Opcode::Jez | Opcode::Jnz | Opcode::Jni   => 1,
      Opcode::Hlt | Opcode::Rst                 => 0
    }
  }
}

/**
  Holds the unencoded components of an instruction, one variant per opcode. Register operands
  always name one of the fourteen registers, but nothing stops a destination from being
  read-only; `is_valid` is the check for that.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// Copies `source` into `destination`.
  Mov {
    destination : Register,
    source      : Register
  },
  /// Loads `immediate` into `destination`.
  Ldi {
    destination : Register,
    immediate   : Immediate
  },
  /// Jumps to the value of the register when `c` is zero.
  Jez(Register),
  /// Jumps to the value of the register when `c` is nonzero.
  Jnz(Register),
  /// Jumps to the immediate when `c` is nonzero.
  Jni(Immediate),
  Hlt,
  Rst,
}

impl Instruction {

  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::Mov { .. } => Opcode::Mov,
      Instruction::Ldi { .. } => Opcode::Ldi,
      Instruction::Jez(_)     => Opcode::Jez,
      Instruction::Jnz(_)     => Opcode::Jnz,
      Instruction::Jni(_)     => Opcode::Jni,
      Instruction::Hlt        => Opcode::Hlt,
      Instruction::Rst        => Opcode::Rst
    }
  }

  /**
    Whether every operand is legal for its position: destinations must be write-capable and
    immediates must fit in four bits. Jump targets and `mov` sources may be any register.
  */
  pub fn is_valid(&self) -> bool {
    match *self {

      Instruction::Mov { destination, .. } => destination.is_writable(),

      Instruction::Ldi { destination, immediate } => {
        destination.is_writable() && immediate <= IMMEDIATE_MAX
      }

      Instruction::Jni(immediate) => immediate <= IMMEDIATE_MAX,

      Instruction::Jez(_)
      | Instruction::Jnz(_)
      | Instruction::Hlt
      | Instruction::Rst => true

    }
  }

  /// A short description of the data movement, for tracing.
  pub fn explain(&self) -> String {
    if !self.is_valid() {
      return "invalid instruction".to_string();
    }
    match self {
      Instruction::Mov { destination, source }    => format!("r{} > r{}", source, destination),
      Instruction::Ldi { destination, immediate } => format!("{} > r{}", immediate, destination),
      Instruction::Jez(target)                    => format!("!-> r{}", target),
      Instruction::Jnz(target)                    => format!("-> r{}", target),
      Instruction::Jni(immediate)                 => format!("-> {}", immediate),
      Instruction::Hlt                            => "halt".to_string(),
      Instruction::Rst                            => "reset".to_string()
    }
  }
}

/// Canonical assembly text, which the assembler parses back into the same instruction.
impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if !self.is_valid() {
      return write!(f, "; invalid instruction");
    }
    match self {

      Instruction::Mov { destination, source } => {
        write!(f, "{} {} {}", self.opcode(), destination, source)
      }

      Instruction::Ldi { destination, immediate } => {
        write!(f, "{} {} {}", self.opcode(), destination, immediate)
      }

      Instruction::Jez(target) | Instruction::Jnz(target) => {
        write!(f, "{} {}", self.opcode(), target)
      }

      Instruction::Jni(immediate) => {
        write!(f, "{} {}", self.opcode(), immediate)
      }

      Instruction::Hlt | Instruction::Rst => {
        write!(f, "{}", self.opcode())
      }

    }
  }
}
