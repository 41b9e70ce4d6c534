//! Execution state: call frames, the call stack and the operand stack.

use tarn_common::Value;
use thiserror::Error;

/// Errors from stack and frame operations. The engine attaches the
/// instruction index when it turns these into [`RuntimeError`](crate::RuntimeError)s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("operand stack underflow")]
    Underflow,
    #[error("operand stack overflow (limit {limit})")]
    Overflow { limit: usize },
    #[error("call depth exceeded (limit {limit})")]
    DepthExceeded { limit: usize },
    #[error("call stack is empty")]
    EmptyCallStack,
    #[error("local index {index} out of range ({count} slots)")]
    InvalidLocal { index: usize, count: usize },
}

/// One activation of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Index into the module's function table.
    pub function: usize,
    /// Next instruction to execute in this frame.
    pub ip: usize,
    /// Caller resume point; `None` for a frame without a caller.
    pub return_ip: Option<usize>,
    locals: Vec<Value>,
}

impl CallFrame {
    /// A frame with `max(local_count, parameter_count)` slots, all `Null`.
    pub fn new(
        function: usize,
        entry_ip: usize,
        parameter_count: usize,
        local_count: usize,
        return_ip: Option<usize>,
    ) -> Self {
        Self {
            function,
            ip: entry_ip,
            return_ip,
            locals: vec![Value::Null; local_count.max(parameter_count)],
        }
    }

    pub fn get_local(&self, index: usize) -> Result<&Value, StackError> {
        self.locals.get(index).ok_or(StackError::InvalidLocal {
            index,
            count: self.locals.len(),
        })
    }

    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), StackError> {
        let count = self.locals.len();
        let slot = self
            .locals
            .get_mut(index)
            .ok_or(StackError::InvalidLocal { index, count })?;
        *slot = value;
        Ok(())
    }

    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    pub fn slot_count(&self) -> usize {
        self.locals.len()
    }
}

/// LIFO of call frames with a depth limit. Empty is a valid terminal state.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, frame: CallFrame) -> Result<(), StackError> {
        if self.frames.len() >= self.max_depth {
            return Err(StackError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<CallFrame, StackError> {
        self.frames.pop().ok_or(StackError::EmptyCallStack)
    }

    pub fn current(&self) -> Result<&CallFrame, StackError> {
        self.frames.last().ok_or(StackError::EmptyCallStack)
    }

    pub fn current_mut(&mut self) -> Result<&mut CallFrame, StackError> {
        self.frames.last_mut().ok_or(StackError::EmptyCallStack)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frames from the bottom (outermost) to the top.
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// The single operand stack shared by every frame of a run.
#[derive(Debug, Clone)]
pub struct OperandStack {
    values: Vec<Value>,
    max_len: usize,
}

impl OperandStack {
    pub fn new(max_len: usize) -> Self {
        Self {
            values: Vec::new(),
            max_len,
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), StackError> {
        if self.values.len() >= self.max_len {
            return Err(StackError::Overflow {
                limit: self.max_len,
            });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.values.pop().ok_or(StackError::Underflow)
    }

    pub fn peek(&self) -> Result<&Value, StackError> {
        self.values.last().ok_or(StackError::Underflow)
    }

    /// Pop the top `n` values, returned in push order. Leaves the stack
    /// untouched when fewer than `n` values are present.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, StackError> {
        if self.values.len() < n {
            return Err(StackError::Underflow);
        }
        Ok(self.values.split_off(self.values.len() - n))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bottom to top.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
