//! Whole-module builder: constants, functions and code in one pass.
//!
//! Calls and function entries can be written by name before the function
//! they name is declared; both are resolved in [`ModuleBuilder::build`].

use std::collections::HashMap;

use tarn_common::{FunctionInfo, Module, Opcode, Value};

use crate::builder::{position_operand, Assembler};
use crate::error::AsmError;

/// Where a declared function starts.
#[derive(Debug, Clone)]
enum EntryPoint {
    At(usize),
    Label(String),
}

#[derive(Debug, Clone)]
struct PendingFunction {
    name: String,
    entry: EntryPoint,
    parameter_count: usize,
    local_count: usize,
}

/// Builds a [`Module`] from constants, named functions and instructions.
#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    asm: Assembler,
    constants: Vec<Value>,
    functions: Vec<PendingFunction>,
    names: HashMap<String, usize>,
    calls: Vec<(usize, String)>,
    entry: Option<String>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constant and return its index. Constants are never merged.
    pub fn constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Append a constant and a `PUSH_CONST` that loads it.
    pub fn push_const(&mut self, value: Value) -> Result<usize, AsmError> {
        let index = self.constant(value);
        let operand = position_operand(index)?;
        Ok(self.asm.emit(Opcode::PushConst, operand, 0))
    }

    fn declare(&mut self, function: PendingFunction) -> Result<usize, AsmError> {
        if self.names.contains_key(&function.name) {
            return Err(AsmError::DuplicateFunction {
                name: function.name,
            });
        }
        let index = self.functions.len();
        self.names.insert(function.name.clone(), index);
        self.functions.push(function);
        Ok(index)
    }

    /// Declare a function starting at the next instruction.
    pub fn begin_function(
        &mut self,
        name: &str,
        parameter_count: usize,
        local_count: usize,
    ) -> Result<usize, AsmError> {
        self.declare(PendingFunction {
            name: name.to_string(),
            entry: EntryPoint::At(self.asm.position()),
            parameter_count,
            local_count,
        })
    }

    /// Declare a function starting at an absolute instruction index.
    pub fn declare_function(
        &mut self,
        name: &str,
        entry_index: usize,
        parameter_count: usize,
        local_count: usize,
    ) -> Result<usize, AsmError> {
        self.declare(PendingFunction {
            name: name.to_string(),
            entry: EntryPoint::At(entry_index),
            parameter_count,
            local_count,
        })
    }

    /// Declare a function starting wherever `label` is marked.
    pub fn declare_function_at_label(
        &mut self,
        name: &str,
        label: &str,
        parameter_count: usize,
        local_count: usize,
    ) -> Result<usize, AsmError> {
        self.declare(PendingFunction {
            name: name.to_string(),
            entry: EntryPoint::Label(label.to_string()),
            parameter_count,
            local_count,
        })
    }

    /// Append a `CALL` to the function named `name`.
    pub fn emit_call(&mut self, name: &str) -> usize {
        let at = self.asm.emit_op(Opcode::Call);
        self.calls.push((at, name.to_string()));
        at
    }

    /// Select the entry function by name. Defaults to the first declared.
    pub fn set_entry(&mut self, name: &str) {
        self.entry = Some(name.to_string());
    }

    /// The underlying instruction assembler.
    pub fn code(&mut self) -> &mut Assembler {
        &mut self.asm
    }

    pub fn emit(&mut self, opcode: Opcode, operand0: i32, operand1: i32) -> usize {
        self.asm.emit(opcode, operand0, operand1)
    }

    pub fn emit_op(&mut self, opcode: Opcode) -> usize {
        self.asm.emit_op(opcode)
    }

    pub fn emit_jump(&mut self, opcode: Opcode, label: &str) -> usize {
        self.asm.emit_jump(opcode, label)
    }

    pub fn mark_label(&mut self, name: &str) -> Result<(), AsmError> {
        self.asm.mark_label(name)
    }

    pub fn position(&self) -> usize {
        self.asm.position()
    }

    /// Resolve calls, function entries and jumps, then validate.
    pub fn build(mut self) -> Result<Module, AsmError> {
        for (at, name) in std::mem::take(&mut self.calls) {
            let index = *self
                .names
                .get(&name)
                .ok_or(AsmError::UndefinedFunction { name, at })?;
            self.asm.set_operand(at, position_operand(index)?);
        }

        let mut functions = Vec::with_capacity(self.functions.len());
        for pending in self.functions {
            let entry_index = match pending.entry {
                EntryPoint::At(index) => index,
                EntryPoint::Label(label) => {
                    self.asm
                        .label(&label)
                        .ok_or_else(|| AsmError::UndefinedEntryLabel {
                            function: pending.name.clone(),
                            label,
                        })?
                }
            };
            functions.push(FunctionInfo::new(
                pending.name,
                entry_index,
                pending.parameter_count,
                pending.local_count,
            ));
        }

        let entry_index = match self.entry {
            Some(name) => *self
                .names
                .get(&name)
                .ok_or(AsmError::UndefinedEntry { name })?,
            None => 0,
        };

        let instructions = self.asm.finish()?;
        Ok(Module::new(self.constants, instructions, functions, entry_index)?)
    }
}
