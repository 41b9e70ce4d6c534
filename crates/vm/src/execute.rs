//! Main execution loop and opcode dispatch for the Tarn VM.
//!
//! Handlers never move the instruction pointer themselves. Each one returns
//! a [`Flow`] and the loop applies it. A syscall callback may rearrange the
//! call stack; `Continue` then advances nothing, so whatever the callback
//! left on top runs next.

use std::sync::Arc;

use tarn_common::{ArithOp, Instruction, Module, Opcode, Value};

use crate::error::{FaultAt, RuntimeError};
use crate::machine::{HaltReason, Step, Vm, VmState};
use crate::state::CallFrame;
use crate::syscall::SyscallId;

/// What the loop does after a handler returns.
#[derive(Debug)]
pub(crate) enum Flow {
    /// Advance the fetched frame to `ip + 1`, if it is still on top and
    /// its ip is untouched.
    Continue,
    /// Set ip to an absolute target, which may be out of range.
    JumpTo(i32),
    /// Advance the caller, then push the callee.
    PushCall(CallFrame),
    /// Pop the current frame.
    PopReturn,
    /// Advance, then stop with the halt flag set.
    Halt,
}

impl Vm {
    /// Reset both stacks and the halt flag, push the entry frame and run.
    ///
    /// Every local of the entry frame starts as `Null`, parameters included,
    /// since there is no caller to supply arguments.
    pub fn run_from_entry(&mut self) -> Result<HaltReason, RuntimeError> {
        self.operand_stack.clear();
        self.call_stack.clear();
        self.halt.clear();

        let module = Arc::clone(&self.module);
        let entry_index = module.entry_index();
        let entry = module.entry_function();
        let frame = CallFrame::new(
            entry_index,
            entry.entry_index,
            entry.parameter_count,
            entry.local_count,
            None,
        );
        if let Err(e) = self.push_frame(frame) {
            return Err(self.fault(e));
        }
        self.sink.run_started(entry);
        self.run()
    }

    /// Run from the current call stack until it empties, a halt is
    /// requested or a fault occurs.
    pub fn run(&mut self) -> Result<HaltReason, RuntimeError> {
        loop {
            if let Step::Halted(reason) = self.step()? {
                return Ok(reason);
            }
        }
    }

    /// Execute one iteration of the dispatch loop.
    pub fn step(&mut self) -> Result<Step, RuntimeError> {
        self.state = VmState::Running;
        match self.step_inner() {
            Ok(Step::Halted(reason)) => {
                self.state = VmState::Halted;
                self.sink.halted(reason);
                Ok(Step::Halted(reason))
            }
            Ok(Step::Running) => Ok(Step::Running),
            Err(e) => Err(self.fault(e)),
        }
    }

    pub(crate) fn fault(&mut self, error: RuntimeError) -> RuntimeError {
        self.state = VmState::Faulted;
        self.sink.faulted(&error);
        error
    }

    fn step_inner(&mut self) -> Result<Step, RuntimeError> {
        if self.halt.is_requested() {
            return Ok(Step::Halted(HaltReason::HaltRequested));
        }
        let ip = match self.call_stack.current() {
            Ok(frame) => frame.ip,
            Err(_) => return Ok(Step::Halted(HaltReason::Completed)),
        };

        let module = Arc::clone(&self.module);
        let len = module.len();
        if ip == len {
            // Running off the end is an implicit return.
            self.call_stack.pop().at(ip)?;
            self.sink.returned(ip, self.call_stack.depth());
            return Ok(self.settle());
        }
        let instr = *module
            .instructions()
            .get(ip)
            .ok_or(RuntimeError::CorruptedProgramCounter {
                at: ip,
                target: ip as i64,
                len,
            })?;

        self.sink.instruction(ip, &instr, self.operand_stack.len());
        let depth = self.call_stack.depth();
        let flow = self.dispatch(&module, ip, &instr)?;
        self.apply(&module, ip, depth, flow)?;
        Ok(self.settle())
    }

    /// The outcome of an iteration once its flow has been applied.
    fn settle(&self) -> Step {
        if self.halt.is_requested() {
            Step::Halted(HaltReason::HaltRequested)
        } else if self.call_stack.is_empty() {
            Step::Halted(HaltReason::Completed)
        } else {
            Step::Running
        }
    }

    fn dispatch(&mut self, module: &Module, ip: usize, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr.opcode {
            Opcode::Nop => Ok(Flow::Continue),
            Opcode::PushConst => self.exec_push_const(module, ip, instr.operand0),

            Opcode::Add => self.exec_arith(ip, ArithOp::Add),
            Opcode::Sub => self.exec_arith(ip, ArithOp::Sub),
            Opcode::Mul => self.exec_arith(ip, ArithOp::Mul),
            Opcode::Div => self.exec_arith(ip, ArithOp::Div),
            Opcode::CmpLt => self.exec_cmp_lt(ip),

            Opcode::LoadLocal => self.exec_load_local(ip, instr.operand0),
            Opcode::StoreLocal => self.exec_store_local(ip, instr.operand0),

            Opcode::Jump => Ok(Flow::JumpTo(instr.operand0)),
            Opcode::JumpIfFalse => self.exec_jump_if_false(ip, instr.operand0),

            Opcode::Call => self.exec_call(module, ip, instr.operand0),
            Opcode::Return => Ok(Flow::PopReturn),

            Opcode::Syscall => self.exec_syscall(ip, instr.operand0),
            Opcode::Halt => Ok(Flow::Halt),

            Opcode::CmpEq
            | Opcode::CmpNe
            | Opcode::CmpLe
            | Opcode::CmpGt
            | Opcode::CmpGe
            | Opcode::Not
            | Opcode::And
            | Opcode::Or => Err(RuntimeError::UnknownOpcode {
                at: ip,
                opcode: instr.opcode.code(),
            }),
        }
    }

    /// `depth` is the call stack depth when the instruction was fetched.
    fn apply(&mut self, module: &Module, ip: usize, depth: usize, flow: Flow) -> Result<(), RuntimeError> {
        let len = module.len();
        match flow {
            Flow::Continue => {
                if self.call_stack.depth() == depth {
                    let frame = self.call_stack.current_mut().at(ip)?;
                    if frame.ip == ip {
                        frame.ip = ip + 1;
                    }
                }
            }
            Flow::JumpTo(target) => {
                let target = usize::try_from(target).map_err(|_| {
                    RuntimeError::CorruptedProgramCounter {
                        at: ip,
                        target: target as i64,
                        len,
                    }
                })?;
                self.call_stack.current_mut().at(ip)?.ip = target;
            }
            Flow::PushCall(callee) => {
                let function = callee.function;
                self.call_stack.current_mut().at(ip)?.ip = ip + 1;
                self.call_stack.push(callee).at(ip)?;
                if let Some(info) = module.function(function) {
                    self.sink.call(ip, info, self.call_stack.depth());
                }
            }
            Flow::PopReturn => {
                self.call_stack.pop().at(ip)?;
                self.sink.returned(ip, self.call_stack.depth());
            }
            Flow::Halt => {
                self.call_stack.current_mut().at(ip)?.ip = ip + 1;
                self.halt.request();
            }
        }
        Ok(())
    }

    // ---- Constants and locals ----

    fn exec_push_const(&mut self, module: &Module, ip: usize, index: i32) -> Result<Flow, RuntimeError> {
        let value = usize::try_from(index)
            .ok()
            .and_then(|i| module.constant(i))
            .cloned()
            .ok_or(RuntimeError::InvalidConstantIndex {
                at: ip,
                index: index as i64,
                count: module.constants().len(),
            })?;
        self.operand_stack.push(value).at(ip)?;
        Ok(Flow::Continue)
    }

    fn local_slot(&self, ip: usize, index: i32) -> Result<usize, RuntimeError> {
        usize::try_from(index).map_err(|_| RuntimeError::InvalidLocalIndex {
            at: ip,
            index: index as i64,
            count: self
                .call_stack
                .current()
                .map(CallFrame::slot_count)
                .unwrap_or(0),
        })
    }

    fn exec_load_local(&mut self, ip: usize, index: i32) -> Result<Flow, RuntimeError> {
        let slot = self.local_slot(ip, index)?;
        let value = self.call_stack.current().at(ip)?.get_local(slot).at(ip)?.clone();
        self.operand_stack.push(value).at(ip)?;
        Ok(Flow::Continue)
    }

    fn exec_store_local(&mut self, ip: usize, index: i32) -> Result<Flow, RuntimeError> {
        let slot = self.local_slot(ip, index)?;
        let value = self.operand_stack.pop().at(ip)?;
        self.call_stack
            .current_mut()
            .at(ip)?
            .set_local(slot, value)
            .at(ip)?;
        Ok(Flow::Continue)
    }

    // ---- Arithmetic and comparison ----

    /// Pop b, pop a, push `a op b`.
    fn exec_arith(&mut self, ip: usize, op: ArithOp) -> Result<Flow, RuntimeError> {
        let b = self.operand_stack.pop().at(ip)?;
        let a = self.operand_stack.pop().at(ip)?;
        let result = Value::arith(op, &a, &b).at(ip)?;
        self.operand_stack.push(result).at(ip)?;
        Ok(Flow::Continue)
    }

    fn exec_cmp_lt(&mut self, ip: usize) -> Result<Flow, RuntimeError> {
        let b = self.operand_stack.pop().at(ip)?;
        let a = self.operand_stack.pop().at(ip)?;
        let result = a.less_than(&b).at(ip)?;
        self.operand_stack.push(Value::Bool(result)).at(ip)?;
        Ok(Flow::Continue)
    }

    // ---- Control flow ----

    fn exec_jump_if_false(&mut self, ip: usize, target: i32) -> Result<Flow, RuntimeError> {
        match self.operand_stack.pop().at(ip)? {
            Value::Bool(false) => Ok(Flow::JumpTo(target)),
            Value::Bool(true) => Ok(Flow::Continue),
            other => Err(RuntimeError::TypeMismatch {
                at: ip,
                op: "jump_if_false",
                found: other.kind().to_string(),
            }),
        }
    }

    /// Pop `parameter_count` arguments into a fresh frame. The last value
    /// pushed becomes the last parameter.
    fn exec_call(&mut self, module: &Module, ip: usize, index: i32) -> Result<Flow, RuntimeError> {
        let function_index = usize::try_from(index)
            .ok()
            .filter(|&i| i < module.functions().len())
            .ok_or(RuntimeError::InvalidFunctionIndex {
                at: ip,
                index: index as i64,
                count: module.functions().len(),
            })?;
        let callee = &module.functions()[function_index];

        let args = self.operand_stack.pop_n(callee.parameter_count).at(ip)?;
        let mut frame = CallFrame::new(
            function_index,
            callee.entry_index,
            callee.parameter_count,
            callee.local_count,
            Some(ip + 1),
        );
        for (slot, arg) in args.into_iter().enumerate() {
            frame.set_local(slot, arg).at(ip)?;
        }

        Ok(Flow::PushCall(frame))
    }

    fn exec_syscall(&mut self, ip: usize, id: i32) -> Result<Flow, RuntimeError> {
        let id = SyscallId(id);
        let callback = self
            .syscalls
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::UnknownSyscall { at: ip, id: id.0 })?;
        self.sink.syscall(ip, id);
        callback(self)?;
        Ok(Flow::Continue)
    }
}
