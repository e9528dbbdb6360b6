/*!
  Whole-page images for the machine's ROM chips. Boards wire ROM data lines, and on some boards
  address lines, in whatever order routed best, so a page image is rewired before it is burned.
  The number pages drive the 7-segment displays that show register contents.
*/

use std::io::{self, Read, Write};

use log::debug;
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::microcode::PAGE_SIZE;

pub type Page = [u8; PAGE_SIZE];

/// The board a page image is rewired for.
#[derive(StrumDisplay, EnumString, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum PackTarget {
  #[strum(serialize = "i")]
  Instruction,
  #[strum(serialize = "n")]
  Number,
  #[strum(serialize = "m")]
  Microcode,
}

impl PackTarget {
  /// For each output bit, the input bit wired to it.
  fn bit_table(&self) -> [u8; 8] {
    match self {
      PackTarget::Instruction => [7, 6, 5, 4, 3, 2, 1, 0],
      PackTarget::Number      => [1, 2, 3, 0, 4, 5, 6, 7],
      PackTarget::Microcode   => [0, 1, 2, 7, 6, 5, 4, 3]
    }
  }

  /// Whether the board also wires its address lines in reverse.
  fn reverses_addresses(&self) -> bool {
    match self {
      PackTarget::Instruction => false,
      PackTarget::Number | PackTarget::Microcode => true
    }
  }
}

/// Segment patterns of the hexadecimal digits.
const SEVEN_SEGMENT: [u8; 16] = [
  0b0111_1110, 0b0001_1000, 0b1011_0110, 0b1011_1100,
  0b1101_1000, 0b1110_1100, 0b1110_1110, 0b0011_1000,
  0b1111_1110, 0b1111_1100, 0b1111_1010, 0b1100_1110,
  0b0110_0110, 0b1001_1110, 0b1110_0110, 0b1110_0010,
];

pub fn map_byte(byte: u8, target: PackTarget) -> u8 {
  target.bit_table()
        .iter()
        .enumerate()
        .fold(0, |mapped, (bit, source)| mapped | (((byte >> source) & 1) << bit))
}

/// Rewires a page image for `target`.
pub fn pack_page(page: &Page, target: PackTarget) -> Page {
  let mut packed = [0u8; PAGE_SIZE];
  for (address, byte) in page.iter().enumerate() {
    let address = address as u8;
    let wired   = match target.reverses_addresses() {
      true  => address.reverse_bits(),
      false => address
    };
    packed[wired as usize] = map_byte(*byte, target);
  }
  packed
}

/// Reads one page from `input`, zero filling past its end, and writes the rewired page to `output`.
pub fn pack<R: Read, W: Write>(input: R, output: &mut W, target: PackTarget) -> io::Result<()> {
  let mut bytes = Vec::with_capacity(PAGE_SIZE);
  input.take(PAGE_SIZE as u64).read_to_end(&mut bytes)?;
  if bytes.len() < PAGE_SIZE {
    debug!("Input holds {} bytes. Zero filling to {}.", bytes.len(), PAGE_SIZE);
  }

  let mut page = [0u8; PAGE_SIZE];
  page[..bytes.len()].copy_from_slice(&bytes);
  output.write_all(&pack_page(&page, target))
}

/// The display page for one nibble of every byte value: the high nibble if `high` is set.
pub fn number_page(high: bool) -> Page {
  let shift = match high {
    true  => 4,
    false => 0
  };
  let mut page = [0u8; PAGE_SIZE];
  for (value, byte) in page.iter_mut().enumerate() {
    *byte = SEVEN_SEGMENT[(value >> shift) & 0xF];
  }
  page
}

pub fn generate_numbers<W: Write>(output: &mut W, high: bool) -> io::Result<()> {
  output.write_all(&number_page(high))
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn targets_by_letter(){
    assert_eq!(PackTarget::from_str("i").ok(), Some(PackTarget::Instruction));
    assert_eq!(PackTarget::from_str("n").ok(), Some(PackTarget::Number));
    assert_eq!(PackTarget::from_str("m").ok(), Some(PackTarget::Microcode));
    assert!(PackTarget::from_str("x").is_err());
  }

  #[test]
  fn bit_tables(){
    assert_eq!(map_byte(0b0000_0001, PackTarget::Instruction), 0b1000_0000);
    assert_eq!(map_byte(0b1100_1010, PackTarget::Instruction), 0b0101_0011);
    // Output bit 3 takes input bit 0; output bits 0..3 take input bits 1..4.
    assert_eq!(map_byte(0b0000_0001, PackTarget::Number), 0b0000_1000);
    assert_eq!(map_byte(0b0000_0010, PackTarget::Number), 0b0000_0001);
    assert_eq!(map_byte(0b1000_0000, PackTarget::Microcode), 0b0000_1000);
    assert_eq!(map_byte(0b0000_1000, PackTarget::Microcode), 0b1000_0000);
    assert_eq!(map_byte(0b0000_0111, PackTarget::Microcode), 0b0000_0111);
  }

  #[test]
  fn instruction_pages_keep_addresses(){
    let mut page = [0u8; PAGE_SIZE];
    page[1] = 0x01;
    let packed = pack_page(&page, PackTarget::Instruction);
    assert_eq!(packed[1], 0x80);
    assert_eq!(packed[0x80], 0);
  }

  #[test]
  fn number_pages_reverse_addresses(){
    let mut page = [0u8; PAGE_SIZE];
    page[1] = 0xFF;
    let packed = pack_page(&page, PackTarget::Number);
    assert_eq!(packed[0x80], 0xFF);
    assert_eq!(packed[1], 0);
  }

  #[test]
  fn short_input_is_zero_filled(){
    let mut output = Vec::new();
    pack(&[0x01u8, 0x02][..], &mut output, PackTarget::Instruction).unwrap();
    assert_eq!(output.len(), PAGE_SIZE);
    assert_eq!(&output[..3], &[0x80, 0x40, 0x00]);
    assert!(output[2..].iter().all(|b| *b == 0));
  }

  #[test]
  fn long_input_is_truncated(){
    let input = vec![0xFFu8; 1000];
    let mut output = Vec::new();
    pack(&input[..], &mut output, PackTarget::Microcode).unwrap();
    assert_eq!(output, vec![0xFFu8; PAGE_SIZE]);
  }

  #[test]
  fn number_pages(){
    let low  = number_page(false);
    let high = number_page(true);
    assert_eq!(low[0x00], 0x7E);
    assert_eq!(low[0x21], 0x18);
    assert_eq!(high[0x21], 0xB6);
    assert_eq!(high[0xF0], 0xE2);

    let mut output = Vec::new();
    generate_numbers(&mut output, true).unwrap();
    assert_eq!(output, high.to_vec());
  }

}
