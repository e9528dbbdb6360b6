/*!
  The human readable textual form of machine code is called assembly. Parsing leans on the `strum`
  derives of `Opcode` and `Register` for mnemonics and register letters, so the only hand written
  grammar is that of immediate numerals:

    0            zero
    0x<h>        exactly one hexadecimal digit
    0b<bbbb>     one to four binary digits, most significant first
    <d>[<d>]     one or two decimal digits, no leading zero, at most 15
*/

use std::io::{Read, Write};
use std::str::FromStr;

use log::debug;
use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::one_of,
  combinator::{peek, value},
  IResult
};

use super::{encode, Immediate, Instruction, Opcode, IMMEDIATE_MAX};
use crate::error::{AssemblyError, CompileError, ImmediateError, ParseError};
use crate::register::Register;
use crate::token::{Line, Token, Tokenizer};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Base {
  Hexadecimal,
  Binary,
  Decimal
}

/// Recognizes the base prefix of an immediate, consuming `0x` or `0b` but not a decimal digit.
fn base(text: &str) -> IResult<&str, Base> {
  alt((
    value(Base::Hexadecimal, tag("0x")),
    value(Base::Binary,      tag("0b")),
    value(Base::Decimal,     peek(one_of("123456789")))
  ))(text)
}

/// Parses the text of an immediate operand.
pub fn parse_immediate(text: &str) -> Result<Immediate, ImmediateError> {
  if text == "0" {
    return Ok(0);
  }

  match base(text) {

    Ok((digits, Base::Hexadecimal)) => {
      if digits.len() > 1 {
        return Err(ImmediateError::Length);
      }
      digits.chars()
            .next()
            .and_then(|c| c.to_digit(16))
            .map(|value| value as Immediate)
            .ok_or(ImmediateError::Digit)
    }

    Ok((digits, Base::Binary)) => {
      if digits.is_empty() {
        return Err(ImmediateError::Length);
      }
      let mut value: Immediate = 0;
      for (index, c) in digits.chars().enumerate() {
        if index == 4 {
          return Err(ImmediateError::Length);
        }
        let bit = c.to_digit(2).ok_or(ImmediateError::Digit)?;
        value = (value << 1) | bit as Immediate;
      }
      Ok(value)
    }

    Ok((digits, Base::Decimal)) => {
      let mut value: u32 = 0;
      for (index, c) in digits.chars().enumerate() {
        if index == 2 {
          return Err(ImmediateError::Length);
        }
        value = value * 10 + c.to_digit(10).ok_or(ImmediateError::Digit)?;
      }
      match value <= IMMEDIATE_MAX as u32 {
        true  => Ok(value as Immediate),
        false => Err(ImmediateError::Overflow)
      }
    }

    Err(_) if text.starts_with('0') => Err(ImmediateError::Base),

    Err(_) => Err(ImmediateError::Digit)

  } // end match base
}

fn parse_register(token: &Token) -> Result<Register, ParseError> {
  Register::from_str(token.as_str()).map_err(|_| ParseError::Register)
}

fn parse_immediate_token(token: &Token) -> Result<Immediate, ParseError> {
  Ok(parse_immediate(token.as_str())?)
}

/**
  Parses a tokenized line into an instruction. Whether a destination register may actually be
  written is left to the encoder.
*/
pub fn parse(line: &Line) -> Result<Instruction, ParseError> {
  let (mnemonic, operands) = line.tokens().split_first().ok_or(ParseError::Format)?;
  let opcode = Opcode::from_str(mnemonic.as_str()).map_err(|_| ParseError::Operation)?;

  if operands.len() != opcode.arity() {
    return Err(ParseError::Format);
  }

  let instruction =
    match opcode {

      Opcode::Mov => Instruction::Mov {
        destination : parse_register(&operands[0])?,
        source      : parse_register(&operands[1])?
      },

      Opcode::Ldi => Instruction::Ldi {
        destination : parse_register(&operands[0])?,
        immediate   : parse_immediate_token(&operands[1])?
      },

      Opcode::Jez => Instruction::Jez(parse_register(&operands[0])?),

      Opcode::Jnz => Instruction::Jnz(parse_register(&operands[0])?),

      Opcode::Jni => Instruction::Jni(parse_immediate_token(&operands[0])?),

      Opcode::Hlt => Instruction::Hlt,

      Opcode::Rst => Instruction::Rst

    };

  Ok(instruction)
}

/// A summary of a successful compilation.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct Compilation {
  /// Source lines read, including blank and comment lines.
  pub lines        : usize,
  /// Instruction bytes written.
  pub instructions : usize
}

/**
  Assembles the source text in `input`, writing one byte per instruction to `output`. Stops at the
  first error of any kind and reports it with its line number. Nothing is written for the line
  in error or any line after it. `output` is flushed either way, so the bytes of the lines before
  an error reach it.
*/
pub fn compile<R: Read, W: Write>(input: R, output: &mut W) -> Result<Compilation, CompileError> {
  let mut compilation = Compilation::default();
  let assembled = compile_lines(input, output, &mut compilation);
  let flushed   = output.flush();

  assembled?;
  flushed.map_err(|e| CompileError{ line: compilation.lines, error: AssemblyError::Output(e) })?;
  Ok(compilation)
}

fn compile_lines<R: Read, W: Write>(input: R, output: &mut W, compilation: &mut Compilation)
  -> Result<(), CompileError>
{
  for (index, line) in Tokenizer::new(input).enumerate() {
    let number  = index + 1;
    let at_line = move |error: AssemblyError| CompileError{ line: number, error };

    let line = line.map_err(|e| at_line(e.into()))?;
    compilation.lines = number;
    if line.is_blank() {
      continue;
    }

    let instruction = parse(&line).map_err(|e| at_line(e.into()))?;
    let code        = encode(&instruction).map_err(|e| at_line(e.into()))?;
    output.write_all(&[code]).map_err(|e| at_line(AssemblyError::Output(e)))?;

    debug!("{:>4}  {:#04x}  {:<10} {}", number, code, instruction.to_string(), instruction.explain());
    compilation.instructions += 1;
  }

  Ok(())
}
