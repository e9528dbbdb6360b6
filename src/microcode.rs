/*!
  Translation of instructions into the control signals that drive the machine's data bus, and from
  there into the bytes burned into the control ROM.

  Each instruction asserts a small set of `Signal`s: the input enable of the register being written,
  the output enable of the register driving the bus, and a handful of control bits. Most output
  enables and two of the control bits are wired active-low, so the asserted set is flipped on those
  lines before it is laid out on physical pins. The 24 pins span three ROM chips, one page each:

    page 0   pins  0..8    input enables   a c g m x y n p
    page 1   pins  8..16   output enables  a c g m x y p b
    page 2   pins 16..24   output enables  j l s, then alu jmp rst hlt ins

  The ROM is addressed by the instruction byte, so every page holds 256 bytes.
*/

use std::fmt::{Display, Formatter};
use std::io::Write;

use bimap::BiMap;
use log::debug;
use num_enum::IntoPrimitive;
use prettytable::Table;
use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumCount, EnumIter, IntoStaticStr};

use crate::bytecode::{decode, Instruction};
use crate::error::RomError;
use crate::machine::TABLE_DISPLAY_FORMAT;
use crate::register::Register;

/// The number of ROM pages needed to hold a full control word.
pub const PAGE_COUNT : usize = 3;
pub const PAGE_SIZE  : usize = 256;

pub type Pin = u8;

#[derive(
  StrumDisplay, IntoStaticStr, EnumIter, EnumCount, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,  Debug,     Hash
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Signal {
  // Control bits //
  Hlt,   // Stop the clock
  Rst,   // Clear the read-write registers
  Jmp,   // Negate the jump condition
  Alu,   // Subtract rather than add
  Ins,   // Drive the low nibble of the instruction onto the bus
  // Input enables //
  InA,
  InC,
  InG,
  InM,
  InX,
  InY,
  InN,
  InP,
  // Output enables //
  OutA,
  OutC,
  OutG,
  OutM,
  OutX,
  OutY,
  OutP,
  OutB,
  OutJ,
  OutL,
  OutS,
}

impl Signal {
  /// The input enable of `register`, if it has one. Only `p` among the read-only registers does.
  pub fn input(register: Register) -> Option<Signal> {
    match register {
      Register::A => Some(Signal::InA),
      Register::C => Some(Signal::InC),
      Register::G => Some(Signal::InG),
      Register::M => Some(Signal::InM),
      Register::X => Some(Signal::InX),
      Register::Y => Some(Signal::InY),
      Register::N => Some(Signal::InN),
      Register::P => Some(Signal::InP),
      _           => None
    }
  }

  /**
    The output enable of `register`, if it has one. `n` and `z` leave the bus undriven, which
    reads as zero, and `d` is the sum register with the ALU subtracting.
  */
  pub fn output(register: Register) -> Option<Signal> {
    match register {
      Register::A => Some(Signal::OutA),
      Register::C => Some(Signal::OutC),
      Register::G => Some(Signal::OutG),
      Register::M => Some(Signal::OutM),
      Register::X => Some(Signal::OutX),
      Register::Y => Some(Signal::OutY),
      Register::P => Some(Signal::OutP),
      Register::B => Some(Signal::OutB),
      Register::J => Some(Signal::OutJ),
      Register::L => Some(Signal::OutL),
      Register::S => Some(Signal::OutS),
      Register::N | Register::D | Register::Z => None
    }
  }

  fn bit(self) -> u32 {
    1 << Into::<u8>::into(self)
  }

  pub fn is_active_low(self) -> bool {
    ACTIVE_LOW.contains(&self)
  }

  /// The pin this signal is wired to.
  pub fn pin(self) -> Option<Pin> {
    PIN_MAP.get_by_left(&self).copied()
  }
}

/// Lines asserted by pulling them low.
pub const ACTIVE_LOW: [Signal; 13] = [
  Signal::OutA, Signal::OutC, Signal::OutG, Signal::OutM, Signal::OutX, Signal::OutY,
  Signal::OutP, Signal::OutB, Signal::OutJ, Signal::OutL, Signal::OutS,
  Signal::Rst,  Signal::Ins
];

const PIN_TABLE: [(Signal, Pin); 24] = [
  (Signal::InA,   0), (Signal::InC,   1), (Signal::InG,   2), (Signal::InM,   3),
  (Signal::InX,   4), (Signal::InY,   5), (Signal::InN,   6), (Signal::InP,   7),
  (Signal::OutA,  8), (Signal::OutC,  9), (Signal::OutG, 10), (Signal::OutM, 11),
  (Signal::OutX, 12), (Signal::OutY, 13), (Signal::OutP, 14), (Signal::OutB, 15),
  (Signal::OutJ, 16), (Signal::OutL, 17), (Signal::OutS, 18),
  (Signal::Alu,  19), (Signal::Jmp,  20), (Signal::Rst,  21), (Signal::Hlt,  22),
  (Signal::Ins,  23),
];

lazy_static! {
  static ref PIN_MAP: BiMap<Signal, Pin> = PIN_TABLE.iter().copied().collect();
}

/// A set of control signals.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct ControlSignals {
  bits: u32
}

impl ControlSignals {
  pub fn new() -> Self {
    ControlSignals::default()
  }

  pub fn insert(&mut self, signal: Signal) {
    self.bits |= signal.bit();
  }

  pub fn is_asserted(&self, signal: Signal) -> bool {
    self.bits & signal.bit() != 0
  }

  pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
    Signal::iter().filter(move |signal| self.is_asserted(*signal))
  }

  fn toggle(&mut self, signal: Signal) {
    self.bits ^= signal.bit();
  }
}

impl Extend<Signal> for ControlSignals {
  fn extend<T: IntoIterator<Item = Signal>>(&mut self, iter: T) {
    for signal in iter {
      self.insert(signal);
    }
  }
}

impl Display for ControlSignals {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let names: Vec<&'static str> = self.iter().map(Into::into).collect();
    write!(f, "{{{}}}", names.join(" "))
  }
}

/// Puts `register` on the bus.
fn drive(register: Register, signals: &mut ControlSignals) {
  match register {
    Register::D => signals.extend([Signal::OutS, Signal::Alu].iter().copied()),
    _           => signals.extend(Signal::output(register))
  }
}

/// The signals `instruction` asserts, before any active-low inversion.
pub fn translate(instruction: &Instruction) -> ControlSignals {
  let mut signals = ControlSignals::new();

  match *instruction {

    Instruction::Mov { destination, source } => {
      if destination != source {
        signals.extend(Signal::input(destination));
        drive(source, &mut signals);
      }
    }

    Instruction::Ldi { destination, .. } => {
      signals.extend(Signal::input(destination));
      signals.insert(Signal::Ins);
    }

    Instruction::Jez(target) => {
      signals.insert(Signal::InP);
      signals.insert(Signal::Jmp);
      drive(target, &mut signals);
    }

    Instruction::Jnz(target) => {
      signals.insert(Signal::InP);
      drive(target, &mut signals);
    }

    Instruction::Jni(_) => {
      signals.insert(Signal::InP);
      signals.insert(Signal::Ins);
    }

    Instruction::Hlt => signals.insert(Signal::Hlt),

    Instruction::Rst => signals.insert(Signal::Rst)

  }

  signals
}

/// Flips every active-low line, turning logical assertion into electrical level.
pub fn invert_active_low(signals: ControlSignals) -> ControlSignals {
  let mut inverted = signals;
  for signal in ACTIVE_LOW.iter() {
    inverted.toggle(*signal);
  }
  inverted
}

/// The levels of every control pin, one byte per ROM page.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct PinLayout {
  pages: [u8; PAGE_COUNT]
}

impl PinLayout {
  fn set(&mut self, pin: Pin) {
    let pin = pin as usize;
    self.pages[pin / 8] |= 1 << (pin % 8);
  }
}

/// Sets the pin of every signal in `signals`. Pins of absent signals stay clear.
pub fn map_to_pins(signals: ControlSignals) -> PinLayout {
  let mut layout = PinLayout::default();
  for pin in signals.iter().filter_map(Signal::pin) {
    layout.set(pin);
  }
  layout
}

/// The full control word for the instruction byte `code`.
pub fn macrocode(code: u8) -> PinLayout {
  map_to_pins(invert_active_low(translate(&decode(code))))
}

/// The contents of one control ROM, indexed by instruction byte.
pub fn rom_page(page: usize) -> Result<[u8; PAGE_SIZE], RomError> {
  if page >= PAGE_COUNT {
    return Err(RomError::Page(page));
  }

  let mut rom = [0u8; PAGE_SIZE];
  for (code, byte) in rom.iter_mut().enumerate() {
    let layout = macrocode(code as u8);
    *byte = layout.pages[page];
  }
  Ok(rom)
}

pub fn generate_rom_page<W: Write>(output: &mut W, page: usize) -> Result<(), RomError> {
  let rom = rom_page(page)?;
  output.write_all(&rom)?;
  debug!("Wrote {} bytes of control ROM page {}.", rom.len(), page);
  Ok(())
}

/// The wiring of signals to pins, for printing.
pub fn pin_table() -> Table {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Pin", ubr->"Page", ubr->"Bit", ubl->"Signal", ubl->"Level"]);

  for pin in 0..(PAGE_COUNT * 8) as Pin {
    if let Some(signal) = PIN_MAP.get_by_right(&pin) {
      let page  = pin / 8;
      let bit   = pin % 8;
      let level = match signal.is_active_low() {
        true  => "low",
        false => "high"
      };
      table.add_row(row![r->pin, r->page, r->bit, signal, level]);
    }
  }
  table
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use strum::EnumCount;
  use crate::bytecode::encode;

  fn signals(list: &[Signal]) -> ControlSignals {
    let mut set = ControlSignals::new();
    set.extend(list.iter().copied());
    set
  }

  #[test]
  fn moves(){
    let mov = |destination, source| translate(&Instruction::Mov { destination, source });
    assert_eq!(mov(Register::A, Register::C), signals(&[Signal::InA, Signal::OutC]));
    assert_eq!(mov(Register::A, Register::D), signals(&[Signal::InA, Signal::OutS, Signal::Alu]));
    assert_eq!(mov(Register::N, Register::A), signals(&[Signal::InN, Signal::OutA]));
    assert_eq!(mov(Register::A, Register::Z), signals(&[Signal::InA]));
    assert_eq!(mov(Register::X, Register::X), ControlSignals::new());
  }

  #[test]
  fn loads_and_jumps(){
    let ldi = Instruction::Ldi { destination: Register::X, immediate: 3 };
    assert_eq!(translate(&ldi), signals(&[Signal::InX, Signal::Ins]));
    assert_eq!(
      translate(&Instruction::Jez(Register::D)),
      signals(&[Signal::InP, Signal::Jmp, Signal::OutS, Signal::Alu])
    );
    assert_eq!(translate(&Instruction::Jnz(Register::G)), signals(&[Signal::InP, Signal::OutG]));
    assert_eq!(translate(&Instruction::Jni(4)), signals(&[Signal::InP, Signal::Ins]));
    assert_eq!(translate(&Instruction::Hlt), signals(&[Signal::Hlt]));
    assert_eq!(translate(&Instruction::Rst), signals(&[Signal::Rst]));
  }

  #[test]
  fn translation_is_deterministic(){
    for code in 0..=255u8 {
      let instruction = decode(code);
      assert_eq!(translate(&instruction), translate(&instruction));
    }
  }

  #[test]
  fn inversion(){
    let none = ControlSignals::new();
    let inverted = invert_active_low(none);
    assert_eq!(inverted.iter().count(), ACTIVE_LOW.len());
    assert!(inverted.is_asserted(Signal::OutB));
    assert!(!inverted.is_asserted(Signal::Hlt));
    assert_eq!(invert_active_low(inverted), none);
  }

  #[test]
  fn every_signal_has_its_own_pin(){
    let pins: HashSet<Pin> = Signal::iter().filter_map(Signal::pin).collect();
    assert_eq!(pins.len(), Signal::COUNT);
    assert!(pins.iter().all(|pin| (*pin as usize) < PAGE_COUNT * 8));
    assert_eq!(pin_table().len(), Signal::COUNT);
  }

  #[test]
  fn halt_word(){
    let halt = encode(&Instruction::Hlt).unwrap();
    assert_eq!(macrocode(halt).pages, [0x00, 0xFF, 0xE7]);
  }

  #[test]
  fn move_word(){
    let mov = Instruction::Mov { destination: Register::A, source: Register::C };
    assert_eq!(encode(&mov).map(macrocode).map(|l| l.pages), Ok([0x01, 0xFD, 0xA7]));
  }

  #[test]
  fn rom_pages(){
    for page in 0..PAGE_COUNT {
      let rom = rom_page(page).unwrap();
      assert_eq!(rom_page(page).unwrap()[..], rom[..]);
      let halt = encode(&Instruction::Hlt).unwrap();
      assert_eq!(rom[halt as usize], macrocode(halt).pages[page]);

      let mut written = Vec::new();
      generate_rom_page(&mut written, page).unwrap();
      assert_eq!(written, rom.to_vec());
    }
  }

  #[test]
  fn missing_page(){
    match rom_page(PAGE_COUNT) {
      Err(RomError::Page(page)) => assert_eq!(page, 3),
      _ => panic!("page {} should not exist", PAGE_COUNT)
    }
    let error = generate_rom_page(&mut Vec::new(), 7).unwrap_err();
    assert_eq!(error.to_string(), "page 7 does not exist, the control ROM has 3 pages");
  }

  #[test]
  fn display(){
    assert_eq!(signals(&[Signal::OutS, Signal::InA, Signal::Alu]).to_string(), "{alu in_a out_s}");
  }

}
