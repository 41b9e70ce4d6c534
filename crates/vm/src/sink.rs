//! Diagnostic hooks.
//!
//! The engine reports what it does to a [`DiagnosticSink`] injected at
//! construction. [`TracingSink`] forwards events to `tracing` under the
//! `tarn_vm` target; [`NullSink`] discards them.

use tarn_common::{FunctionInfo, Instruction};

use crate::error::RuntimeError;
use crate::machine::HaltReason;
use crate::syscall::SyscallId;

/// Receives engine events. Every method defaults to doing nothing.
pub trait DiagnosticSink: Send {
    /// `run_from_entry` is about to execute `entry`.
    fn run_started(&mut self, entry: &FunctionInfo) {
        let _ = entry;
    }

    /// `instr` at index `at` is about to be dispatched.
    fn instruction(&mut self, at: usize, instr: &Instruction, stack_len: usize) {
        let _ = (at, instr, stack_len);
    }

    /// A frame for `callee` was pushed; `depth` counts the new frame.
    fn call(&mut self, at: usize, callee: &FunctionInfo, depth: usize) {
        let _ = (at, callee, depth);
    }

    /// A frame was popped, explicitly or by running off the end.
    fn returned(&mut self, at: usize, depth: usize) {
        let _ = (at, depth);
    }

    fn syscall(&mut self, at: usize, id: SyscallId) {
        let _ = (at, id);
    }

    fn halted(&mut self, reason: HaltReason) {
        let _ = reason;
    }

    fn faulted(&mut self, error: &RuntimeError) {
        let _ = error;
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn run_started(&mut self, entry: &FunctionInfo) {
        tracing::debug!(
            target: "tarn_vm",
            entry = %entry.name,
            ip = entry.entry_index,
            "run started"
        );
    }

    fn instruction(&mut self, at: usize, instr: &Instruction, stack_len: usize) {
        tracing::trace!(
            target: "tarn_vm",
            at,
            op = instr.opcode.mnemonic(),
            operand = instr.operand0,
            stack_len,
            "dispatch"
        );
    }

    fn call(&mut self, at: usize, callee: &FunctionInfo, depth: usize) {
        tracing::debug!(target: "tarn_vm", at, callee = %callee.name, depth, "call");
    }

    fn returned(&mut self, at: usize, depth: usize) {
        tracing::trace!(target: "tarn_vm", at, depth, "return");
    }

    fn syscall(&mut self, at: usize, id: SyscallId) {
        tracing::debug!(target: "tarn_vm", at, id = id.0, "syscall");
    }

    fn halted(&mut self, reason: HaltReason) {
        tracing::debug!(target: "tarn_vm", ?reason, "halted");
    }

    fn faulted(&mut self, error: &RuntimeError) {
        tracing::warn!(target: "tarn_vm", at = error.at(), %error, "fault");
    }
}
