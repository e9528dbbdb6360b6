//! Error types for each stage of the toolchain. The messages are the ones printed by the
//! command line front end, so keep them short and lower case.

use std::io;

use thiserror::Error;

use crate::microcode::PAGE_COUNT;
use crate::register::Register;

/// The outcome of a failed read from a byte stream.
#[derive(Debug, Error)]
pub enum StreamError {
  /// The stream ended cleanly. Often a normal termination signal rather than a failure.
  #[error("end of file")]
  Eof,

  #[error("{0}")]
  Io(#[from] io::Error),
}

/// A malformed immediate numeral.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum ImmediateError {
  #[error("invalid immediate base")]
  Base,

  #[error("invalid immediate digit")]
  Digit,

  #[error("bad immediate len")]
  Length,

  #[error("immediate overflow")]
  Overflow,
}

#[derive(Debug, Error)]
pub enum TokenizeError {
  /// Only 7-bit ASCII is accepted.
  #[error("invalid character")]
  InvalidCharacter(u8),

  #[error("bad token len")]
  TokenLength,

  #[error("bad line len")]
  LineLength,

  #[error("{0}")]
  Stream(#[source] io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum ParseError {
  #[error("invalid operation")]
  Operation,

  #[error("invalid register")]
  Register,

  #[error(transparent)]
  Immediate(#[from] ImmediateError),

  /// The operand count does not match the opcode.
  #[error("bad instruction format")]
  Format,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum EncodeError {
  #[error("writing to read-only register")]
  ReadOnlyDestination(Register),

  #[error("immediate overflow")]
  ImmediateRange(u8),
}

/// Everything that can go wrong while assembling a single line.
#[derive(Debug, Error)]
pub enum AssemblyError {
  #[error(transparent)]
  Tokenize(#[from] TokenizeError),

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Encode(#[from] EncodeError),

  #[error("{0}")]
  Output(#[source] io::Error),
}

/// The first error in a source file, with the 1-based line it occurred on.
#[derive(Debug, Error)]
#[error("at line {line}: {error}")]
pub struct CompileError {
  pub line  : usize,
  #[source]
  pub error : AssemblyError,
}

/// A read or write failure while disassembling, with the offset of the byte being processed.
#[derive(Debug, Error)]
#[error("at byte {offset}: {source}")]
pub struct DisassembleError {
  pub offset : usize,
  pub source : io::Error,
}

#[derive(Debug, Error)]
pub enum RomError {
  #[error("page {0} does not exist, the control ROM has {count} pages", count = PAGE_COUNT)]
  Page(usize),

  #[error(transparent)]
  Io(#[from] io::Error),
}
