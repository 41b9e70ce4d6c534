//! Tarn virtual machine: executes [`Module`]s.
//!
//! The VM is a stack-based machine with:
//! - one operand stack shared by every frame of a run
//! - an explicit call stack of [`CallFrame`]s, each owning its locals
//! - a table of host syscalls reached through the `SYSCALL` opcode
//!
//! # Usage
//!
//! ```
//! use tarn_common::{FunctionInfo, Instruction, Module, Opcode, Value};
//! use tarn_vm::Vm;
//!
//! let module = Module::new(
//!     vec![Value::Int(40), Value::Int(2)],
//!     vec![
//!         Instruction::with_operand(Opcode::PushConst, 0),
//!         Instruction::with_operand(Opcode::PushConst, 1),
//!         Instruction::op(Opcode::Add),
//!         Instruction::op(Opcode::Halt),
//!     ],
//!     vec![FunctionInfo::new("main", 0, 0, 0)],
//!     0,
//! )
//! .unwrap();
//!
//! let mut vm = Vm::new(module);
//! vm.run_from_entry().unwrap();
//! assert_eq!(vm.operand_stack().as_slice(), &[Value::Int(42)]);
//! ```

pub mod error;
pub mod execute;
pub mod machine;
pub mod sink;
pub mod state;
pub mod syscall;

pub use error::RuntimeError;
pub use machine::{HaltHandle, HaltReason, Step, Vm, VmConfig, VmState};
pub use sink::{DiagnosticSink, NullSink, TracingSink};
pub use state::{CallFrame, CallStack, OperandStack, StackError};
pub use syscall::{SyscallFn, SyscallId};

use std::sync::Arc;

use tarn_common::{Module, Value};

/// Run a module from its entry with default limits and `print` wired to
/// stdout, returning whatever is left on the operand stack.
pub fn run(module: impl Into<Arc<Module>>) -> Result<Vec<Value>, RuntimeError> {
    let mut vm = Vm::new(module);
    vm.register_stdout_print();
    vm.run_from_entry()?;
    Ok(vm.operand_stack().as_slice().to_vec())
}
