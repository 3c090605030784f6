use std::io::{BufRead, Write};

use crate::opcode::Opcode;
use crate::program::{Image, Instruction};
use crate::register::Register;

/// The type of a register cell, a stack cell, and the program counter
pub type Value = isize;

/// Number of cells of stack memory
pub const STACK_SIZE: usize = 8096;

/// Execution always begins at this label
pub const ENTRY_LABEL: &str = "$main";

/// An error that aborts execution.
///
/// Everything else this dialect gets wrong at runtime (unknown registers,
/// unknown labels, malformed immediates, stray opcodes) degrades to a
/// zero-value default and keeps going.
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("program has no `$main` entry label")]
  MissingEntry,

  #[error("stack access out of bounds at address {0}")]
  OutOfBounds(Value),

  #[error("syscall i/o failed: {0}")]
  Io(#[from] std::io::Error),
}

/// Outcome of a single fetch/decode/execute step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Halt,
}

/// A virtual machine for the dialect: register file, fixed-size stack
/// memory, and program counter.
///
/// The machine is generic over the handles its `ecall` syscalls talk to, so
/// the binary can hand it real stdio while tests hand it buffers. There is
/// no halt instruction; execution ends when the program counter leaves the
/// instruction sequence (running past the end or going negative, both of
/// which are ordinary termination).
pub struct Vm<In, Out> {
  pc: Value,
  registers: [Value; Register::COUNT],
  stack: Vec<Value>,
  input: In,
  output: Out,
}

impl<In, Out> Vm<In, Out> {
  /// Create a machine with all registers and stack cells zeroed
  pub fn new(input: In, output: Out) -> Self {
    Self {
      pc: 0,
      registers: [0; Register::COUNT],
      stack: vec![0; STACK_SIZE],
      input,
      output,
    }
  }

  pub fn get(&self, register: Register) -> Value {
    self.registers[register as usize]
  }

  /// Writes to `zero` are not trapped; the register is all-zero only by
  /// convention.
  pub fn set(&mut self, register: Register, value: Value) {
    self.registers[register as usize] = value;
  }

  /// Read a stack cell, failing on addresses outside `[0, STACK_SIZE)`
  pub fn load(&self, address: Value) -> Result<Value, Error> {
    usize::try_from(address)
      .ok()
      .and_then(|address| self.stack.get(address))
      .copied()
      .ok_or(Error::OutOfBounds(address))
  }

  /// Write a stack cell, failing on addresses outside `[0, STACK_SIZE)`
  pub fn store(&mut self, address: Value, value: Value) -> Result<(), Error> {
    usize::try_from(address)
      .ok()
      .and_then(|address| self.stack.get_mut(address))
      .map(|cell| *cell = value)
      .ok_or(Error::OutOfBounds(address))
  }

  pub fn pc(&self) -> Value {
    self.pc
  }

  pub fn set_pc(&mut self, pc: Value) {
    self.pc = pc;
  }

  /// The output handle, for inspecting what syscalls printed
  pub fn output(&self) -> &Out {
    &self.output
  }
}

impl<In, Out> Vm<In, Out>
where
  In: BufRead,
  Out: Write,
{
  /// Run a program from its `$main` label until the program counter leaves
  /// the instruction sequence. Fails fast if the entry label is missing.
  pub fn run<I>(&mut self, image: &I) -> Result<(), Error>
  where
    I: Image,
  {
    let entry = image.label(ENTRY_LABEL).ok_or(Error::MissingEntry)?;
    self.pc = entry as Value;
    while self.step(image)? == Flow::Continue {}
    Ok(())
  }

  /// Fetch, decode, and execute a single instruction.
  ///
  /// Every instruction ends with the program counter advancing by one, after
  /// any jump target has been assigned. A taken branch therefore lands on
  /// the slot after its label (the label slot itself dispatches as a no-op),
  /// and `ret` lands on the slot after the one saved in `ra`, which is how a
  /// `jal`/`ret` pair resumes right after the call site.
  pub fn step<I>(&mut self, image: &I) -> Result<Flow, Error>
  where
    I: Image,
  {
    let fetched = usize::try_from(self.pc)
      .ok()
      .and_then(|pc| image.instructions().get(pc));
    let Some(instruction) = fetched else {
      return Ok(Flow::Halt);
    };
    self.execute(instruction, image)?;
    self.pc += 1;
    Ok(Flow::Continue)
  }

  fn execute<I>(&mut self, instruction: &Instruction, image: &I) -> Result<(), Error>
  where
    I: Image,
  {
    match Opcode::from(instruction.opcode()) {
      Opcode::Li => {
        let value = immediate(instruction, 2);
        self.write_register(instruction, 1, value);
      }
      Opcode::Add => {
        let value = self
          .read_register(instruction, 2)
          .wrapping_add(self.read_register(instruction, 3));
        self.write_register(instruction, 1, value);
      }
      Opcode::Addi => {
        let value = self
          .read_register(instruction, 2)
          .wrapping_add(immediate(instruction, 3));
        self.write_register(instruction, 1, value);
      }
      Opcode::B => self.pc = target(image, instruction, 1),
      Opcode::Beq => self.branch(instruction, image, |left, right| left == right),
      Opcode::Bgt => self.branch(instruction, image, |left, right| left > right),
      Opcode::Ble => self.branch(instruction, image, |left, right| left <= right),
      Opcode::Jal => {
        // single return-address slot, not a call stack; nested calls
        // overwrite ra
        self.set(Register::Ra, self.pc);
        self.pc = target(image, instruction, 1);
      }
      Opcode::Ret => self.pc = self.get(Register::Ra),
      Opcode::Sw => {
        let address = self.read_register(instruction, 2);
        let value = self.read_register(instruction, 1);
        self.store(address, value)?;
      }
      Opcode::Lw => {
        let value = self.load(self.read_register(instruction, 2))?;
        self.write_register(instruction, 1, value);
      }
      Opcode::Ecall => self.syscall(instruction)?,
      Opcode::Nop => {}
    }
    Ok(())
  }

  /// Exactly one predicate per branch kind; an untaken branch falls through
  /// to the next instruction
  fn branch<I>(&mut self, instruction: &Instruction, image: &I, taken: impl Fn(Value, Value) -> bool)
  where
    I: Image,
  {
    let left = self.read_register(instruction, 1);
    let right = self.read_register(instruction, 2);
    if taken(left, right) {
      self.pc = target(image, instruction, 3);
    }
  }

  fn syscall(&mut self, instruction: &Instruction) -> Result<(), Error> {
    match instruction.operand(1) {
      // print the integer in a0
      Some("1") => writeln!(self.output, "{}", self.get(Register::A0))?,
      // block for a line of input, parse the first token into a0
      Some("5") => {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let value = line
          .split_whitespace()
          .next()
          .and_then(|token| token.parse().ok())
          .unwrap_or(0);
        self.set(Register::A0, value);
      }
      // reserved codes are ignored
      _ => {}
    }
    Ok(())
  }

  /// Read the register operand at token `index`; a missing or unknown
  /// register name reads as 0
  fn read_register(&self, instruction: &Instruction, index: usize) -> Value {
    instruction
      .operand(index)
      .and_then(Register::parse)
      .map_or(0, |register| self.get(register))
  }

  /// Write to the register operand at token `index`; a missing or unknown
  /// register name drops the write
  fn write_register(&mut self, instruction: &Instruction, index: usize, value: Value) {
    if let Some(register) = instruction.operand(index).and_then(Register::parse) {
      self.set(register, value);
    }
  }
}

/// Immediate operand at token `index`; malformed or missing parses as 0
fn immediate(instruction: &Instruction, index: usize) -> Value {
  instruction
    .operand(index)
    .and_then(|token| token.parse().ok())
    .unwrap_or(0)
}

/// Label operand at token `index` resolved to its instruction index; an
/// unknown label resolves to 0
fn target<I>(image: &I, instruction: &Instruction, index: usize) -> Value
where
  I: Image,
{
  instruction
    .operand(index)
    .and_then(|label| image.label(label))
    .map_or(0, |index| index as Value)
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::io::{self, Cursor};

  use crate::program::Program;

  fn run_source(source: &str) -> Vm<io::Empty, Vec<u8>> {
    let program = Program::from(source);
    let mut vm = Vm::new(io::empty(), Vec::new());
    vm.run(&program).unwrap();
    vm
  }

  fn run_with_input(source: &str, input: &str) -> Vm<Cursor<Vec<u8>>, Vec<u8>> {
    let program = Program::from(source);
    let mut vm = Vm::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    vm.run(&program).unwrap();
    vm
  }

  mod vm {
    use super::*;

    #[test]
    fn new_starts_zeroed() {
      let vm = Vm::new(io::empty(), io::sink());
      assert_eq!(vm.pc(), 0);
      for register in Register::ALL {
        assert_eq!(vm.get(register), 0);
      }
      for address in [0, 1, STACK_SIZE as Value - 1] {
        assert_eq!(vm.load(address).unwrap(), 0);
      }
    }

    #[test]
    fn straight_line_arithmetic() {
      let vm = run_source("$main\nli t0 5\nli t1 3\nadd t2 t0 t1\naddi t3 t2 -2");
      assert_eq!(vm.get(Register::T0), 5);
      assert_eq!(vm.get(Register::T1), 3);
      assert_eq!(vm.get(Register::T2), 8);
      assert_eq!(vm.get(Register::T3), 6);
    }

    #[test]
    fn sum_prints_eight() {
      let vm = run_source("$main\nli t0 5\nli t1 3\nadd t2 t0 t1\nadd a0 t0 t1\necall 1");
      assert_eq!(vm.get(Register::T2), 8);
      assert_eq!(vm.output().as_slice(), b"8\n");
    }

    #[test]
    fn execution_starts_at_main_not_line_zero() {
      let vm = run_source("li t0 5\n$main\nli t1 2");
      assert_eq!(vm.get(Register::T0), 0);
      assert_eq!(vm.get(Register::T1), 2);
    }

    #[test]
    fn missing_entry_label_fails_before_executing() {
      let program = Program::from("li t0 1");
      let mut vm = Vm::new(io::empty(), io::sink());
      assert!(matches!(vm.run(&program), Err(Error::MissingEntry)));
      assert_eq!(vm.get(Register::T0), 0);
    }

    #[test]
    fn unconditional_branch_skips() {
      let vm = run_source("$main\nb $end\nli t0 9\n$end\nli t1 4");
      assert_eq!(vm.get(Register::T0), 0);
      assert_eq!(vm.get(Register::T1), 4);
    }

    #[test]
    fn branch_not_taken_falls_through() {
      // 1 is not > 2, so the fallthrough li executes and a0 stays untouched
      let vm = run_source("$main\nli t0 1\nli t1 2\nbgt t0 t1 $skip\nli t0 9\n$skip\necall 1");
      assert_eq!(vm.output().as_slice(), b"0\n");
      assert_eq!(vm.get(Register::T0), 9);
    }

    #[test]
    fn branch_taken_jumps() {
      let vm = run_source("$main\nli t0 3\nli t1 2\nbgt t0 t1 $skip\nli t0 9\n$skip");
      assert_eq!(vm.get(Register::T0), 3);
    }

    #[test]
    fn branch_if_equal() {
      let taken = run_source("$main\nli t0 2\nli t1 2\nbeq t0 t1 $skip\nli t2 9\n$skip");
      assert_eq!(taken.get(Register::T2), 0);
      let untaken = run_source("$main\nli t0 2\nli t1 3\nbeq t0 t1 $skip\nli t2 9\n$skip");
      assert_eq!(untaken.get(Register::T2), 9);
    }

    #[test]
    fn branch_if_less_or_equal() {
      let on_equal = run_source("$main\nli t0 2\nli t1 2\nble t0 t1 $skip\nli t2 9\n$skip");
      assert_eq!(on_equal.get(Register::T2), 0);
      let on_less = run_source("$main\nli t0 1\nli t1 2\nble t0 t1 $skip\nli t2 9\n$skip");
      assert_eq!(on_less.get(Register::T2), 0);
      let on_greater = run_source("$main\nli t0 3\nli t1 2\nble t0 t1 $skip\nli t2 9\n$skip");
      assert_eq!(on_greater.get(Register::T2), 9);
    }

    #[test]
    fn backward_branch_loops_until_done() {
      // sums 1..=4 into t1
      let vm = run_source(
        "$main\nli t0 4\nli t1 0\nli t2 1\n$loop\nbgt t2 t0 $done\nadd t1 t1 t2\naddi t2 t2 1\nb $loop\n$done",
      );
      assert_eq!(vm.get(Register::T1), 10);
    }

    #[test]
    fn jal_ret_resumes_after_call() {
      let vm = run_source(
        "$main\nli t0 1\njal $double\nli t2 5\nb $end\n$double\nadd t1 t0 t0\nret\n$end",
      );
      assert_eq!(vm.get(Register::T1), 2);
      assert_eq!(vm.get(Register::T2), 5);
      // jal saved its own index (the third instruction slot)
      assert_eq!(vm.get(Register::Ra), 2);
    }

    #[test]
    fn nested_calls_clobber_return_address() {
      // there is only one ra slot: after the inner call returns, the outer
      // ret goes back into the outer body instead of to $main
      let program = Program::from(
        "$main\njal $outer\nli t3 1\nb $end\n$outer\njal $inner\naddi t0 t0 1\nret\n$inner\naddi t1 t1 1\nret\n$end",
      );
      let mut vm = Vm::new(io::empty(), io::sink());
      vm.set_pc(0);
      vm.step(&program).unwrap(); // $main
      vm.step(&program).unwrap(); // jal $outer
      assert_eq!(vm.get(Register::Ra), 1);
      assert_eq!(vm.pc(), 5);
      vm.step(&program).unwrap(); // jal $inner
      assert_eq!(vm.get(Register::Ra), 5);
      vm.step(&program).unwrap(); // addi t1 t1 1
      vm.step(&program).unwrap(); // ret, back after the inner jal
      assert_eq!(vm.pc(), 6);
      vm.step(&program).unwrap(); // addi t0 t0 1
      vm.step(&program).unwrap(); // outer ret: ra still points at the inner jal
      assert_eq!(vm.pc(), 6);
    }

    #[test]
    fn store_load_round_trip() {
      let vm = run_source("$main\nli t0 7\nli t1 3\nsw t0 t1\nlw t2 t1");
      assert_eq!(vm.get(Register::T2), 7);
      assert_eq!(vm.load(3).unwrap(), 7);
    }

    #[test]
    fn store_out_of_bounds_fails() {
      let program = Program::from("$main\nli t1 -1\nsw t0 t1");
      let mut vm = Vm::new(io::empty(), io::sink());
      assert!(matches!(vm.run(&program), Err(Error::OutOfBounds(-1))));

      let program = Program::from("$main\nli t1 8096\nlw t0 t1");
      let mut vm = Vm::new(io::empty(), io::sink());
      assert!(matches!(vm.run(&program), Err(Error::OutOfBounds(8096))));
    }

    #[test]
    fn unknown_opcode_is_a_noop() {
      let vm = run_source("$main\nfrobnicate t0 t1\nli t0 4");
      assert_eq!(vm.get(Register::T0), 4);
    }

    #[test]
    fn unknown_register_reads_zero_and_drops_writes() {
      let vm = run_source("$main\nli t0 5\nadd t1 bogus t0\nadd bogus t0 t0");
      assert_eq!(vm.get(Register::T1), 5);
    }

    #[test]
    fn malformed_immediate_reads_zero() {
      let vm = run_source("$main\nli t0 twelve\naddi t1 t0 nine");
      assert_eq!(vm.get(Register::T0), 0);
      assert_eq!(vm.get(Register::T1), 0);
    }

    #[test]
    fn writes_to_zero_are_not_trapped() {
      let vm = run_source("$main\nli zero 5\nadd t0 zero zero");
      assert_eq!(vm.get(Register::Zero), 5);
      assert_eq!(vm.get(Register::T0), 10);
    }

    #[test]
    fn unknown_branch_target_resolves_to_start() {
      // the taken branch resolves $nowhere to index 0, and execution
      // continues from the slot after it
      let vm = run_source("li t2 99\nli t0 1\n$main\nbeq t0 zero $nowhere\nli t1 7");
      assert_eq!(vm.get(Register::T0), 1);
      assert_eq!(vm.get(Register::T1), 7);
      assert_eq!(vm.get(Register::T2), 0);
    }

    #[test]
    fn negative_pc_terminates() {
      let vm = run_source("$main\nli ra -9\nret\nli t0 1");
      assert_eq!(vm.get(Register::T0), 0);
    }

    #[test]
    fn syscall_reads_integer_into_a0() {
      let vm = run_with_input("$main\necall 5", "42\n");
      assert_eq!(vm.get(Register::A0), 42);
    }

    #[test]
    fn syscall_read_tolerates_garbage() {
      let vm = run_with_input("$main\necall 5", "not-a-number\n");
      assert_eq!(vm.get(Register::A0), 0);
    }

    #[test]
    fn syscall_echo() {
      let vm = run_with_input("$main\necall 5\necall 1", "  -13 trailing\n");
      assert_eq!(vm.get(Register::A0), -13);
      assert_eq!(vm.output().as_slice(), b"-13\n");
    }

    #[test]
    fn reserved_syscall_is_a_noop() {
      let vm = run_source("$main\nli a0 3\necall 9\necall 1");
      assert_eq!(vm.output().as_slice(), b"3\n");
    }
  }
}
