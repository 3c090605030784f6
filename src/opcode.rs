/// The operation selected by an instruction's first token.
///
/// The set is closed; any mnemonic outside it (including label tokens, which
/// occupy their own instruction slot) decodes to [`Opcode::Nop`], so stray
/// opcodes are skipped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Load immediate.
  ///
  /// | Semantics       | Assembly        |
  /// |-----------------|-----------------|
  /// | `r[d] ← imm`    | `li rd imm`     |
  Li,

  /// Register-register add.
  ///
  /// | Semantics              | Assembly          |
  /// |------------------------|-------------------|
  /// | `r[d] ← r[a] + r[b]`   | `add rd ra rb`    |
  Add,

  /// Register-immediate add.
  ///
  /// | Semantics              | Assembly          |
  /// |------------------------|-------------------|
  /// | `r[d] ← r[s] + imm`    | `addi rd rs imm`  |
  Addi,

  /// Unconditional branch to a label.
  ///
  /// | Semantics       | Assembly   |
  /// |-----------------|------------|
  /// | `pc ← L`        | `b $L`     |
  B,

  /// Branch if equal.
  ///
  /// | Semantics                       | Assembly         |
  /// |---------------------------------|------------------|
  /// | `if r[a] == r[b]: pc ← L`       | `beq ra rb $L`   |
  Beq,

  /// Branch if greater than.
  ///
  /// | Semantics                       | Assembly         |
  /// |---------------------------------|------------------|
  /// | `if r[a] > r[b]: pc ← L`        | `bgt ra rb $L`   |
  Bgt,

  /// Branch if less than or equal.
  ///
  /// | Semantics                       | Assembly         |
  /// |---------------------------------|------------------|
  /// | `if r[a] <= r[b]: pc ← L`       | `ble ra rb $L`   |
  Ble,

  /// Jump and link: saves the caller's own index into `ra`, so a later `ret`
  /// resumes right after the call site. There is no call stack; a nested
  /// `jal` overwrites `ra`.
  ///
  /// | Semantics               | Assembly   |
  /// |-------------------------|------------|
  /// | `ra ← pc; pc ← L`       | `jal $L`   |
  Jal,

  /// Return to the address held in `ra`.
  ///
  /// | Semantics       | Assembly |
  /// |-----------------|----------|
  /// | `pc ← ra`       | `ret`    |
  Ret,

  /// Store a register into stack memory, addressed by another register.
  ///
  /// | Semantics              | Assembly      |
  /// |------------------------|---------------|
  /// | `stack[r[a]] ← r[s]`   | `sw rs ra`    |
  Sw,

  /// Load a register from stack memory, addressed by another register.
  ///
  /// | Semantics              | Assembly      |
  /// |------------------------|---------------|
  /// | `r[d] ← stack[r[a]]`   | `lw rd ra`    |
  Lw,

  /// Environment call, dispatched on the literal code token: `1` prints the
  /// integer in `a0`, `5` reads an integer into `a0`, anything else is
  /// reserved and ignored.
  Ecall,

  /// Labels, blank opcodes, and unrecognized mnemonics all land here.
  Nop,
}

impl From<&str> for Opcode {
  fn from(mnemonic: &str) -> Self {
    match mnemonic {
      "li" => Self::Li,
      "add" => Self::Add,
      "addi" => Self::Addi,
      "b" => Self::B,
      "beq" => Self::Beq,
      "bgt" => Self::Bgt,
      "ble" => Self::Ble,
      "jal" => Self::Jal,
      "ret" => Self::Ret,
      "sw" => Self::Sw,
      "lw" => Self::Lw,
      "ecall" => Self::Ecall,
      _ => Self::Nop,
    }
  }
}
