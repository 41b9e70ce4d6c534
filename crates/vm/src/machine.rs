//! VM state management: module, stacks, syscall table, halt flag, sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tarn_common::{Module, Value};

use crate::error::{FaultAt, RuntimeError};
use crate::sink::{DiagnosticSink, TracingSink};
use crate::state::{CallFrame, CallStack, OperandStack};
use crate::syscall::{self, SyscallFn, SyscallId};

/// Default operand stack limit.
pub const DEFAULT_MAX_OPERAND_STACK: usize = 4096;
/// Default call depth limit.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Resource limits for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    pub max_operand_stack: usize,
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_operand_stack: DEFAULT_MAX_OPERAND_STACK,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl VmConfig {
    pub fn with_max_operand_stack(mut self, limit: usize) -> Self {
        self.max_operand_stack = limit;
        self
    }

    pub fn with_max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }
}

/// Coarse engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    Halted,
    Faulted,
}

/// Why a run stopped without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The call stack emptied.
    Completed,
    /// A `HALT` instruction ran or the host requested a halt.
    HaltRequested,
}

/// Outcome of a single [`Vm::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Running,
    Halted(HaltReason),
}

/// Shared halt flag. Clones refer to the same flag, so another thread can
/// stop a running engine; the flag is checked once per step.
#[derive(Debug, Clone, Default)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The Tarn virtual machine.
pub struct Vm {
    pub(crate) module: Arc<Module>,
    pub(crate) config: VmConfig,
    pub(crate) operand_stack: OperandStack,
    pub(crate) call_stack: CallStack,
    pub(crate) syscalls: HashMap<SyscallId, SyscallFn>,
    pub(crate) halt: HaltHandle,
    pub(crate) state: VmState,
    pub(crate) sink: Box<dyn DiagnosticSink>,
}

impl Vm {
    /// Create an engine with default limits and the tracing sink.
    pub fn new(module: impl Into<Arc<Module>>) -> Self {
        Self::with_config(module, VmConfig::default())
    }

    pub fn with_config(module: impl Into<Arc<Module>>, config: VmConfig) -> Self {
        Self {
            module: module.into(),
            config,
            operand_stack: OperandStack::new(config.max_operand_stack),
            call_stack: CallStack::new(config.max_call_depth),
            syscalls: HashMap::new(),
            halt: HaltHandle::default(),
            state: VmState::Halted,
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Register `callback` under `id`, replacing any earlier registration.
    pub fn register_syscall<F>(&mut self, id: impl Into<SyscallId>, callback: F)
    where
        F: Fn(&mut Vm) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.syscalls.insert(id.into(), Arc::new(callback));
    }

    /// Register [`SyscallId::PRINT`] writing to stdout.
    pub fn register_stdout_print(&mut self) {
        self.register_syscall(SyscallId::PRINT, syscall::print_to(std::io::stdout()));
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn config(&self) -> VmConfig {
        self.config
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn operand_stack(&self) -> &OperandStack {
        &self.operand_stack
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// A handle that can request a halt from elsewhere.
    pub fn halt_handle(&self) -> HaltHandle {
        self.halt.clone()
    }

    pub fn request_halt(&self) {
        self.halt.request();
    }

    pub fn clear_halt(&self) {
        self.halt.clear();
    }

    /// Seed the call stack, typically before [`run`](Vm::run).
    pub fn push_frame(&mut self, frame: CallFrame) -> Result<(), RuntimeError> {
        let at = frame.ip;
        self.call_stack.push(frame).at(at)?;
        self.state = VmState::Running;
        Ok(())
    }

    /// Index of the instruction being executed by the top frame.
    pub fn current_ip(&self) -> usize {
        self.call_stack.current().map(|f| f.ip).unwrap_or(0)
    }

    /// Pop from the operand stack. Intended for syscall callbacks.
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        let at = self.current_ip();
        self.operand_stack.pop().at(at)
    }

    /// Push onto the operand stack. Intended for syscall callbacks.
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        let at = self.current_ip();
        self.operand_stack.push(value).at(at)
    }

    /// A [`RuntimeError::HostError`] positioned at the current instruction.
    pub fn host_error(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::HostError {
            at: self.current_ip(),
            message: message.into(),
        }
    }
}
