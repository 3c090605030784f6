use std::collections::HashMap;

/// A single tokenized instruction. Token 0 is the opcode mnemonic (or a
/// label), the rest are operands: register names, immediates, or labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
  tokens: Vec<String>,
}

impl Instruction {
  /// The opcode (or label) token. Instructions are built from non-empty
  /// lines, so token 0 always exists.
  pub fn opcode(&self) -> &str {
    &self.tokens[0]
  }

  /// Operand at token position `index`, if present.
  pub fn operand(&self, index: usize) -> Option<&str> {
    self.tokens.get(index).map(String::as_str)
  }
}

/// Something the vm can fetch instructions from and resolve labels against
pub trait Image {
  fn instructions(&self) -> &[Instruction];
  fn label(&self, name: &str) -> Option<usize>;
}

/// A `Program` is a parsed source listing: the ordered instruction sequence
/// together with its label table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
  instructions: Vec<Instruction>,
  labels: HashMap<String, usize>,
}

impl Program {
  /// Tokenize a source text into a program.
  ///
  /// One instruction per line, whitespace-delimited. Blank lines and lines
  /// whose first token starts with `/` are dropped whole. A first token
  /// starting with `$` is a label declaration: it is recorded in the label
  /// table at its own index and still occupies an instruction slot (the vm
  /// dispatches it as a no-op). A label defined twice keeps its last index.
  pub fn parse(source: &str) -> Self {
    let mut instructions = Vec::new();
    let mut labels = HashMap::new();
    for line in source.lines() {
      let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
      let Some(first) = tokens.first() else {
        continue;
      };
      if first.starts_with('/') {
        continue;
      }
      if first.starts_with('$') {
        labels.insert(first.clone(), instructions.len());
      }
      instructions.push(Instruction { tokens });
    }
    Self {
      instructions,
      labels,
    }
  }
}

impl From<&str> for Program {
  fn from(source: &str) -> Self {
    Self::parse(source)
  }
}

impl Image for Program {
  fn instructions(&self) -> &[Instruction] {
    &self.instructions
  }

  fn label(&self, name: &str) -> Option<usize> {
    self.labels.get(name).copied()
  }
}
