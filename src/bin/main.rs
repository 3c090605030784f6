use std::{env, fs, io};

use anyhow::{Context, Result};

use interpreter::program::Program;
use interpreter::register::Register;
use interpreter::vm::Vm;

fn main() -> Result<()> {
  let path = env::args()
    .nth(1)
    .ok_or_else(|| anyhow::Error::msg("usage: main <program-file>"))?;
  let source = fs::read_to_string(&path).with_context(|| format!("failed to open {path}"))?;
  let program = Program::parse(&source);

  let stdin = io::stdin();
  let mut vm = Vm::new(stdin.lock(), io::stdout());
  vm.run(&program)
    .with_context(|| format!("program {path} aborted"))?;

  display_registers(&vm);
  Ok(())
}

/// Print the final register file: zero on its own, ra/sp paired, then the
/// temporary and argument banks side by side, then the saved bank folded
/// into two columns.
fn display_registers<In, Out>(vm: &Vm<In, Out>) {
  let all = &Register::ALL;
  println!("zero:\t{}", vm.get(Register::Zero));
  println!(
    "ra:\t{}\t\tsp:\t{}",
    vm.get(Register::Ra),
    vm.get(Register::Sp)
  );
  println!("-----------------------------------");
  for (t, a) in all[3..10].iter().zip(&all[10..17]) {
    println!("{t}:\t{}\t\t{a}:\t{}", vm.get(*t), vm.get(*a));
  }
  println!("-----------------------------------");
  for (low, high) in all[17..23].iter().zip(&all[23..29]) {
    println!("{low}:\t{}\t\t{high}:\t{}", vm.get(*low), vm.get(*high));
  }
}
