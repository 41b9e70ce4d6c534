//! Host system calls.
//!
//! A syscall is a host callback registered under an integer id. The
//! `SYSCALL` instruction looks the id up and hands the callback the engine,
//! so it can pop arguments from and push results to the operand stack.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::RuntimeError;
use crate::machine::Vm;

/// Identifier carried in a `SYSCALL` instruction's operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyscallId(pub i32);

impl SyscallId {
    /// Pop one value and print its canonical rendering and a newline.
    pub const PRINT: SyscallId = SyscallId(1);
}

impl From<i32> for SyscallId {
    fn from(id: i32) -> Self {
        SyscallId(id)
    }
}

impl fmt::Display for SyscallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered syscall callback.
pub type SyscallFn = Arc<dyn Fn(&mut Vm) -> Result<(), RuntimeError> + Send + Sync>;

/// Build a print callback writing to `writer`.
pub fn print_to<W>(writer: W) -> impl Fn(&mut Vm) -> Result<(), RuntimeError> + Send + Sync
where
    W: Write + Send + 'static,
{
    let writer = Mutex::new(writer);
    move |vm: &mut Vm| {
        let value = vm.pop()?;
        let mut out = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{value}").map_err(|e| vm.host_error(e.to_string()))
    }
}
