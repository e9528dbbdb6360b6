/*!
  Byte-at-a-time reading over any `std::io::Read`, counting the bytes consumed. The assembler
  never backtracks, so unlike a character iterator over a string there is no peeking: every byte
  that is read is consumed.

  A clean end of input is reported as `StreamError::Eof` rather than `None` so that callers can
  treat it uniformly with genuine I/O failures and decide for themselves which one is fatal.
*/

use std::io::{Bytes, Read};

use crate::error::StreamError;

#[derive(Debug)]
pub struct ByteIter<R: Read> {
  bytes    :  Bytes<R>,
  position :  usize
}

impl<R: Read> ByteIter<R> {

  pub fn new(reader: R) -> Self {
    ByteIter {
      bytes    :  reader.bytes(),
      position :  0
    }
  }

  /// Consumes and returns the next byte.
  pub fn get(&mut self) -> Result<u8, StreamError> {
    match self.bytes.next() {

      Some(Ok(byte)) => {
        self.position += 1;
        Ok(byte)
      }

      Some(Err(e))   => Err(StreamError::Io(e)),

      None           => Err(StreamError::Eof)

    }
  }

  /// Discards everything up to and including the next newline.
  pub fn skip_line(&mut self) -> Result<(), StreamError> {
    loop {
      if self.get()? == b'\n' {
        return Ok(());
      }
    }
  }

  /// The number of bytes consumed so far, which is also the offset of the next byte.
  pub fn position(&self) -> usize {
    self.position
  }
}
