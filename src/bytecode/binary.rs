/*!
  Encoding and decoding of machine code. Every instruction is one byte:

    mov r1 r2   0 r1[2:0] r2[3:0]
    ldi r  i    1 r[2:0]  i[3:0]
    jez r       0 r[2:0]  111 r[3]
    jnz r       0 111     r[3:0]
    jni i       1 111     i[3:0]
    hlt         0110 1111
    rst         0111 1111

  The `jez` family lives in the low-nibble range `mov` can never reach, since no source register
  has an id of 14 or 15. Within that family the two patterns whose recovered register id falls
  outside the register file are `hlt` and `rst`.

  Decoding is total. Encoding rejects instructions the hardware cannot carry out.
*/

use std::convert::TryFrom;
use std::io::{Read, Write};

use log::trace;

use super::{Instruction, IMMEDIATE_MAX};
use crate::error::{DisassembleError, EncodeError, StreamError};
use crate::register::Register;
use crate::stream::ByteIter;

pub const HALT_CODE  : u8 = 0b0110_1111;
pub const RESET_CODE : u8 = 0b0111_1111;

const IMMEDIATE_FLAG : u8 = 0b1000_0000;
// A register field of all ones selects `jnz`/`jni` over `mov`/`ldi`.
const JUMP_FIELD     : u8 = 0b111;
const JEZ_MARK       : u8 = 0b1110;

/// Packs `instruction` into its machine code byte.
pub fn encode(instruction: &Instruction) -> Result<u8, EncodeError> {
  match *instruction {

    Instruction::Mov { destination, source } => {
      check_destination(destination)?;
      Ok((destination.code() << 4) | source.code())
    }

    Instruction::Ldi { destination, immediate } => {
      check_destination(destination)?;
      check_immediate(immediate)?;
      Ok(IMMEDIATE_FLAG | (destination.code() << 4) | immediate)
    }

    Instruction::Jez(target) => {
      let code = target.code();
      Ok(JEZ_MARK | (code >> 3) | ((code & 0b111) << 4))
    }

    Instruction::Jnz(target) => Ok((JUMP_FIELD << 4) | target.code()),

    Instruction::Jni(immediate) => {
      check_immediate(immediate)?;
      Ok(IMMEDIATE_FLAG | (JUMP_FIELD << 4) | immediate)
    }

    Instruction::Hlt => Ok(HALT_CODE),

    Instruction::Rst => Ok(RESET_CODE)

  }
}

fn check_destination(destination: Register) -> Result<(), EncodeError> {
  match destination.is_writable() {
    true  => Ok(()),
    false => Err(EncodeError::ReadOnlyDestination(destination))
  }
}

fn check_immediate(immediate: u8) -> Result<(), EncodeError> {
  match immediate <= IMMEDIATE_MAX {
    true  => Ok(()),
    false => Err(EncodeError::ImmediateRange(immediate))
  }
}

/**
  Recovers the instruction held in `code`. Every byte decodes to a valid instruction: a register
  field of `111` always selects a jump, so `mov` and `ldi` destinations come out write-capable.
*/
pub fn decode(code: u8) -> Instruction {
  let field = (code >> 4) & 0b111;
  let low   = code & 0b1111;

  if code & IMMEDIATE_FLAG != 0 {
    return match field {
      JUMP_FIELD => Instruction::Jni(low),
      _          => Instruction::Ldi { destination: Register::from_field(field), immediate: low }
    };
  }

  match Register::try_from(low) {

    Ok(source) => {
      match field {
        JUMP_FIELD => Instruction::Jnz(source),
        _          => Instruction::Mov { destination: Register::from_field(field), source }
      }
    }

    // The `jez` family. Bit 0 carries the high bit of the target id.
    Err(_) => {
      match Register::try_from(((code & 1) << 3) | field) {
        Ok(target)                   => Instruction::Jez(target),
        Err(_) if code == HALT_CODE  => Instruction::Hlt,
        Err(_)                       => Instruction::Rst
      }
    }

  } // end match on the low nibble
}

/**
  Decodes every byte of `input` and writes one line of assembly text per byte to `output`.
  Returns the number of bytes disassembled. Any byte sequence disassembles, so the only failures
  are those of the streams themselves.
*/
pub fn disassemble<R: Read, W: Write>(input: R, output: &mut W) -> Result<usize, DisassembleError> {
  let mut bytes = ByteIter::new(input);

  loop {
    let offset = bytes.position();
    let code   = match bytes.get() {
      Ok(code)                   => code,
      Err(StreamError::Eof)      => return Ok(offset),
      Err(StreamError::Io(e))    => return Err(DisassembleError{ offset, source: e })
    };

    let instruction = decode(code);
    trace!("{:#04x}: {}", code, instruction.explain());
    writeln!(output, "{}", instruction)
        .map_err(|e| DisassembleError{ offset, source: e })?;
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use std::io;
  use strum::IntoEnumIterator;

  struct FullWriter;

  impl Write for FullWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
  }

  #[test]
  fn known_codes(){
    let ldi = Instruction::Ldi { destination: Register::A, immediate: 5 };
    assert_eq!(encode(&ldi), Ok(0x85));
    assert_eq!(encode(&Instruction::Hlt), Ok(0x6F));
    assert_eq!(encode(&Instruction::Rst), Ok(0x7F));
    assert_eq!(encode(&Instruction::Mov { destination: Register::A, source: Register::C }), Ok(0x01));
    assert_eq!(encode(&Instruction::Jnz(Register::Z)), Ok(0x7D));
    assert_eq!(encode(&Instruction::Jni(0xF)), Ok(0xFF));
    // jez p: field 111, high bit 0.
    assert_eq!(encode(&Instruction::Jez(Register::P)), Ok(0x7E));
    // jez b: field 000, high bit 1.
    assert_eq!(encode(&Instruction::Jez(Register::B)), Ok(0x0F));
  }

  #[test]
  fn decoding_is_total(){
    for code in 0..=255u8 {
      let instruction = decode(code);
      if instruction.is_valid() {
        assert_eq!(encode(&instruction), Ok(code), "code {:#04x}", code);
      }
    }
  }

  #[test]
  fn decoding_is_injective(){
    let distinct: HashSet<Instruction> = (0..=255u8).map(decode).collect();
    assert_eq!(distinct.len(), 256);
    assert!(distinct.iter().all(Instruction::is_valid));
  }

  #[test]
  fn valid_instructions_round_trip(){
    for target in Register::iter() {
      assert_eq!(encode(&Instruction::Jez(target)).map(decode), Ok(Instruction::Jez(target)));
      assert_eq!(encode(&Instruction::Jnz(target)).map(decode), Ok(Instruction::Jnz(target)));
      for destination in Register::iter().filter(Register::is_writable) {
        let mov = Instruction::Mov { destination, source: target };
        assert_eq!(encode(&mov).map(decode), Ok(mov));
      }
    }
    for immediate in 0..=IMMEDIATE_MAX {
      assert_eq!(encode(&Instruction::Jni(immediate)).map(decode), Ok(Instruction::Jni(immediate)));
      for destination in Register::iter().filter(Register::is_writable) {
        let ldi = Instruction::Ldi { destination, immediate };
        assert_eq!(encode(&ldi).map(decode), Ok(ldi));
      }
    }
    assert_eq!(decode(HALT_CODE), Instruction::Hlt);
    assert_eq!(decode(RESET_CODE), Instruction::Rst);
  }

  #[test]
  fn rejects_read_only_destinations(){
    let read_only: Vec<Register> = Register::iter().filter(|r| !r.is_writable()).collect();
    assert_eq!(read_only.len(), 7);
    for register in read_only {
      let mov = Instruction::Mov { destination: register, source: Register::A };
      let ldi = Instruction::Ldi { destination: register, immediate: 1 };
      assert_eq!(encode(&mov), Err(EncodeError::ReadOnlyDestination(register)));
      assert_eq!(encode(&ldi), Err(EncodeError::ReadOnlyDestination(register)));
    }
  }

  #[test]
  fn rejects_wide_immediates(){
    assert_eq!(encode(&Instruction::Jni(16)), Err(EncodeError::ImmediateRange(16)));
    let ldi = Instruction::Ldi { destination: Register::X, immediate: 200 };
    assert_eq!(encode(&ldi), Err(EncodeError::ImmediateRange(200)));
  }

  #[test]
  fn disassemble_program(){
    let mut text = Vec::new();
    let count = disassemble(&[0x85u8, 0x6F][..], &mut text).unwrap();
    assert_eq!(count, 2);
    assert_eq!(String::from_utf8(text).unwrap(), "ldi a 5\nhlt\n");
  }

  #[test]
  fn disassemble_arbitrary_bytes(){
    let every_byte: Vec<u8> = (0..=255u8).collect();
    let mut text = Vec::new();
    assert_eq!(disassemble(&every_byte[..], &mut text).unwrap(), 256);
    let text = String::from_utf8(text).unwrap();
    assert_eq!(text.lines().count(), 256);
    assert_eq!(text.lines().filter(|l| *l == "; invalid instruction").count(), 0);
  }

  #[test]
  fn disassemble_write_failure(){
    let error = disassemble(&[0x01u8, 0x02][..], &mut FullWriter).unwrap_err();
    assert_eq!(error.offset, 0);
    assert_eq!(error.to_string(), "at byte 0: disk full");
  }

}
