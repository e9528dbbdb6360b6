/*!

  The machine executes one byte instructions. There are seven opcodes over fourteen registers and
  four bit immediates, which leaves too few bits for a fixed opcode field. Instead the layout of a
  byte depends on which opcode it holds: the high bit separates register moves from immediate
  loads, a register field of all ones turns either into a jump, and the low nibbles that name no
  register (14 and 15) are reused for `jez`, `hlt` and `rst`. The `binary` module documents the
  exact layout.

  An `Instruction` holds its operands in one enum variant per opcode, so that encoding, decoding,
  and validation are exhaustive matches. Assembly text is the `Display` form of an `Instruction`,
  and `assembly::parse` is its inverse.

*/

mod assembly;
mod binary;
mod instruction;

pub use assembly::compile;
pub use binary::{decode, disassemble, encode};
pub use instruction::{Immediate, Instruction, Opcode, IMMEDIATE_MAX};
