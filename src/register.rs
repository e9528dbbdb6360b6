/*!
  The register file of the target machine. There are fourteen registers, each named by a single
  lower case letter and belonging to one of three capability classes:

    read-write:  a c g m x y
    write-only:  n
    read-only:   p b j l s d z

  The numeric id of a register is its position in the list above, so the order of the variants of
  `Register` is significant. It fixes the machine code encoding, the control signal wiring, and
  the textual name of every register.
*/

use strum_macros::{Display as StrumDisplay, EnumCount, EnumIter, EnumString, IntoStaticStr};
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(
  StrumDisplay, EnumString, IntoStaticStr, EnumIter, EnumCount, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,       Eq, PartialEq,  Debug,    Hash
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Register {
  // Read-write //
  A,   // Address
  C,   // Condition
  G,   // General purpose
  M,   // Memory cell at address `a`
  X,   // Operand 1
  Y,   // Operand 2
  // Write-only //
  N,   // Number, a sink that always reads as zero
  // Read-only //
  P,   // Program counter
  B,   // Buttons
  J,   // Jump enable, `c != 0`
  L,   // Left shift, `a << 4`
  S,   // Sum, `x + y`
  D,   // Difference, `x - y`
  Z,   // Zero
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Capability {
  ReadWrite,
  WriteOnly,
  ReadOnly
}

impl Register {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /**
    Names the register held in a three bit field. Every three bit value is a register id, which
    is why the destination fields of `mov` and `ldi` need no range check when decoding.
  */
  pub fn from_field(field: u8) -> Register {
    match field & 0b111 {
      0 => Register::A,
      1 => Register::C,
      2 => Register::G,
      3 => Register::M,
      4 => Register::X,
      5 => Register::Y,
      6 => Register::N,
      _ => Register::P
    }
  }

  pub fn capability(&self) -> Capability {
    match self {
      Register::A | Register::C | Register::G |
      Register::M | Register::X | Register::Y => Capability::ReadWrite,
      Register::N                             => Capability::WriteOnly,
      _                                       => Capability::ReadOnly
    }
  }

  /// True for every register that may appear as a `mov` or `ldi` destination.
  pub fn is_writable(&self) -> bool {
    self.capability() != Capability::ReadOnly
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::TryFrom;
  use std::str::FromStr;
  use strum::{EnumCount, IntoEnumIterator};

  #[test]
  fn letters_follow_ids(){
    let letters: String = Register::iter().map(|r| r.to_string()).collect();
    assert_eq!(letters, "acgmxynpbjlsdz");
    assert_eq!(Register::COUNT, 14);
  }

  #[test]
  fn parse_letters(){
    assert_eq!(Register::from_str("d").ok(), Some(Register::D));
    assert_eq!(Register::from_str("z").ok(), Some(Register::Z));
    assert!(Register::from_str("D").is_err());
    assert!(Register::from_str("ab").is_err());
    assert!(Register::from_str("q").is_err());
  }

  #[test]
  fn ids_round_trip(){
    for register in Register::iter() {
      assert_eq!(Register::try_from(register.code()).ok(), Some(register));
    }
    assert!(Register::try_from(14u8).is_err());
    assert!(Register::try_from(15u8).is_err());
  }

  #[test]
  fn fields_name_the_first_eight_registers(){
    for field in 0..8u8 {
      assert_eq!(Register::from_field(field).code(), field);
    }
  }

  #[test]
  fn capability_classes(){
    let writable: Vec<Register> = Register::iter().filter(Register::is_writable).collect();
    assert_eq!(
      writable,
      vec![Register::A, Register::C, Register::G, Register::M, Register::X, Register::Y, Register::N]
    );
    assert_eq!(Register::N.capability(), Capability::WriteOnly);
    assert_eq!(Register::P.capability(), Capability::ReadOnly);
  }

}
