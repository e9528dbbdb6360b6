/*!
  The tokenizer splits assembly source into lines of at most three short tokens. It reads one byte
  at a time and never backtracks.

  Tokens are separated by whitespace (space, tab, carriage return, form feed, vertical tab). A
  newline ends the line. A `;` starts a comment running to the end of the line. Input is folded
  to lower case as it is read, and bytes outside 7-bit ASCII are rejected.

  Each `Line` records how it ended, so the end of input is explicit rather than inferred from an
  empty trailing token.
*/

use std::fmt::{Display, Formatter};
use std::io::Read;

use crate::error::{StreamError, TokenizeError};
use crate::stream::ByteIter;

/// The most characters a single token may hold.
pub const TOKEN_CAPACITY : usize = 6;
/// The most tokens a single line may hold.
pub const LINE_CAPACITY  : usize = 3;

const COMMENT : u8 = b';';
const NEWLINE : u8 = b'\n';

fn is_whitespace(byte: u8) -> bool {
  matches!(byte, b' ' | b'\t' | b'\r' | 0x0B | 0x0C)
}

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct Token {
  text : [u8; TOKEN_CAPACITY],
  len  : usize
}

impl Token {
  pub fn as_str(&self) -> &str {
    // Only ASCII bytes are ever stored.
    std::str::from_utf8(&self.text[..self.len]).unwrap_or_default()
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  fn push(&mut self, byte: u8) -> Result<(), TokenizeError> {
    if self.len == TOKEN_CAPACITY {
      return Err(TokenizeError::TokenLength);
    }
    self.text[self.len] = byte;
    self.len += 1;
    Ok(())
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// What stopped the tokenizer at the end of a token.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
enum Terminator {
  /// Whitespace. More tokens may follow on the same line.
  Space,
  /// A newline, or a comment that ran to one.
  Newline,
  /// The end of the input stream.
  Input
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LineEnd {
  Newline,
  Input
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Line {
  tokens : [Token; LINE_CAPACITY],
  len    : usize,
  end    : LineEnd
}

impl Line {
  /// The non-empty tokens of the line, in order.
  pub fn tokens(&self) -> &[Token] {
    &self.tokens[..self.len]
  }

  pub fn is_blank(&self) -> bool {
    self.len == 0
  }

  pub fn ends_input(&self) -> bool {
    self.end == LineEnd::Input
  }
}

impl Display for Line {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let words: Vec<&str> = self.tokens().iter().map(Token::as_str).collect();
    write!(f, "{}", words.join(" "))
  }
}

/**
  Produces `Line`s from a byte stream. As an iterator it yields lines until the input is exhausted
  or an error occurs; after an error it yields nothing more.
*/
pub struct Tokenizer<R: Read> {
  bytes    : ByteIter<R>,
  finished : bool
}

impl<R: Read> Tokenizer<R> {

  pub fn new(reader: R) -> Self {
    Tokenizer {
      bytes    : ByteIter::new(reader),
      finished : false
    }
  }

  /// Reads the next line. At the end of input this is a blank line that ends input.
  pub fn next_line(&mut self) -> Result<Line, TokenizeError> {
    let mut line = Line {
      tokens : [Token::default(); LINE_CAPACITY],
      len    : 0,
      end    : LineEnd::Newline
    };

    loop {
      let (token, terminator) = self.read_token()?;

      if !token.is_empty() {
        if line.len == LINE_CAPACITY {
          return Err(TokenizeError::LineLength);
        }
        line.tokens[line.len] = token;
        line.len += 1;
      }

      match terminator {
        Terminator::Space   => continue,
        Terminator::Newline => {
          line.end = LineEnd::Newline;
          return Ok(line);
        }
        Terminator::Input   => {
          line.end = LineEnd::Input;
          return Ok(line);
        }
      }
    }
  }

  /// Skips leading whitespace, then reads one token and whatever ended it.
  fn read_token(&mut self) -> Result<(Token, Terminator), TokenizeError> {
    let mut token = Token::default();

    loop {
      let byte = match self.read_byte()? {
        Some(byte) => byte,
        None       => return Ok((token, Terminator::Input))
      };

      match byte {

        NEWLINE => return Ok((token, Terminator::Newline)),

        COMMENT => {
          let terminator = match self.bytes.skip_line() {
            Ok(())                  => Terminator::Newline,
            Err(StreamError::Eof)   => Terminator::Input,
            Err(StreamError::Io(e)) => return Err(TokenizeError::Stream(e))
          };
          return Ok((token, terminator));
        }

        b if is_whitespace(b) => {
          if !token.is_empty() {
            return Ok((token, Terminator::Space));
          }
        }

        b if !b.is_ascii() => return Err(TokenizeError::InvalidCharacter(b)),

        b => token.push(b.to_ascii_lowercase())?

      } // end match byte
    }
  }

  /// The next byte, or `None` at a clean end of input.
  fn read_byte(&mut self) -> Result<Option<u8>, TokenizeError> {
    match self.bytes.get() {
      Ok(byte)                => Ok(Some(byte)),
      Err(StreamError::Eof)   => Ok(None),
      Err(StreamError::Io(e)) => Err(TokenizeError::Stream(e))
    }
  }
}

impl<R: Read> Iterator for Tokenizer<R> {
  type Item = Result<Line, TokenizeError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    let start = self.bytes.position();
    let line  = self.next_line();
    match &line {

      Ok(line) if line.ends_input() => {
        self.finished = true;
        // Nothing at all was read, so there is no final line.
        if line.is_blank() && self.bytes.position() == start {
          return None;
        }
      }

      Ok(_) => {}

      Err(_) => {
        self.finished = true;
      }

    }
    Some(line)
  }
}
