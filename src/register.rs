use std::fmt;

/// The fixed register set of the dialect: `zero`, `ra`, `sp`, seven
/// temporaries, seven argument registers, and twelve saved registers.
///
/// Keeping this a closed enum (rather than an open name→value map) means the
/// register file can be a flat array indexed by `Register as usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
  /// Conventionally always 0; writes are not trapped.
  Zero,
  /// Return address, written by `jal`, consumed by `ret`.
  Ra,
  /// Stack pointer (by convention only; nothing enforces it).
  Sp,
  T0,
  T1,
  T2,
  T3,
  T4,
  T5,
  T6,
  A0,
  A1,
  A2,
  A3,
  A4,
  A5,
  A6,
  S0,
  S1,
  S2,
  S3,
  S4,
  S5,
  S6,
  S7,
  S8,
  S9,
  S10,
  S11,
}

impl Register {
  pub const COUNT: usize = 29;

  /// Every register, in register-file order (`ALL[r as usize] == r`).
  pub const ALL: [Register; Self::COUNT] = [
    Self::Zero,
    Self::Ra,
    Self::Sp,
    Self::T0,
    Self::T1,
    Self::T2,
    Self::T3,
    Self::T4,
    Self::T5,
    Self::T6,
    Self::A0,
    Self::A1,
    Self::A2,
    Self::A3,
    Self::A4,
    Self::A5,
    Self::A6,
    Self::S0,
    Self::S1,
    Self::S2,
    Self::S3,
    Self::S4,
    Self::S5,
    Self::S6,
    Self::S7,
    Self::S8,
    Self::S9,
    Self::S10,
    Self::S11,
  ];

  /// Look a register up by its assembly name; `None` for anything outside
  /// the fixed set.
  pub fn parse(name: &str) -> Option<Self> {
    let register = match name {
      "zero" => Self::Zero,
      "ra" => Self::Ra,
      "sp" => Self::Sp,
      "t0" => Self::T0,
      "t1" => Self::T1,
      "t2" => Self::T2,
      "t3" => Self::T3,
      "t4" => Self::T4,
      "t5" => Self::T5,
      "t6" => Self::T6,
      "a0" => Self::A0,
      "a1" => Self::A1,
      "a2" => Self::A2,
      "a3" => Self::A3,
      "a4" => Self::A4,
      "a5" => Self::A5,
      "a6" => Self::A6,
      "s0" => Self::S0,
      "s1" => Self::S1,
      "s2" => Self::S2,
      "s3" => Self::S3,
      "s4" => Self::S4,
      "s5" => Self::S5,
      "s6" => Self::S6,
      "s7" => Self::S7,
      "s8" => Self::S8,
      "s9" => Self::S9,
      "s10" => Self::S10,
      "s11" => Self::S11,
      _ => return None,
    };
    Some(register)
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Zero => "zero",
      Self::Ra => "ra",
      Self::Sp => "sp",
      Self::T0 => "t0",
      Self::T1 => "t1",
      Self::T2 => "t2",
      Self::T3 => "t3",
      Self::T4 => "t4",
      Self::T5 => "t5",
      Self::T6 => "t6",
      Self::A0 => "a0",
      Self::A1 => "a1",
      Self::A2 => "a2",
      Self::A3 => "a3",
      Self::A4 => "a4",
      Self::A5 => "a5",
      Self::A6 => "a6",
      Self::S0 => "s0",
      Self::S1 => "s1",
      Self::S2 => "s2",
      Self::S3 => "s3",
      Self::S4 => "s4",
      Self::S5 => "s5",
      Self::S6 => "s6",
      Self::S7 => "s7",
      Self::S8 => "s8",
      Self::S9 => "s9",
      Self::S10 => "s10",
      Self::S11 => "s11",
    }
  }
}

impl fmt::Display for Register {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_is_in_register_file_order() {
    assert_eq!(Register::ALL.len(), Register::COUNT);
    for (index, register) in Register::ALL.into_iter().enumerate() {
      assert_eq!(register as usize, index);
    }
  }

  #[test]
  fn names_round_trip() {
    for register in Register::ALL {
      assert_eq!(Register::parse(register.name()), Some(register));
    }
  }

  #[test]
  fn unknown_names_do_not_parse() {
    for name in ["t7", "a7", "s12", "x0", "pc", "ZERO", ""] {
      assert_eq!(Register::parse(name), None);
    }
  }
}
