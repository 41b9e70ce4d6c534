//! The executable program model.
//!
//! A [`Module`] bundles the constant pool, the instruction stream, the
//! function table and the entry function. It is validated once at
//! construction and never mutated afterwards, so a single module can be
//! shared between engines behind an `Arc`.

use crate::error::ValidationError;
use crate::instruction::Instruction;
use crate::value::Value;

/// A function table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionInfo {
    pub name: String,
    /// Absolute index of the function's first instruction.
    pub entry_index: usize,
    /// Values popped from the operand stack into locals on call.
    pub parameter_count: usize,
    /// Declared local slot count.
    pub local_count: usize,
}

impl FunctionInfo {
    pub fn new(
        name: impl Into<String>,
        entry_index: usize,
        parameter_count: usize,
        local_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            entry_index,
            parameter_count,
            local_count,
        }
    }

    /// Slots allocated per frame: a function never has fewer slots than
    /// parameters.
    pub fn slot_count(&self) -> usize {
        self.local_count.max(self.parameter_count)
    }
}

/// A validated, immutable program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    constants: Vec<Value>,
    instructions: Vec<Instruction>,
    functions: Vec<FunctionInfo>,
    entry_index: usize,
}

impl Module {
    /// Build a module, checking that `entry_index` names a function.
    pub fn new(
        constants: Vec<Value>,
        instructions: Vec<Instruction>,
        functions: Vec<FunctionInfo>,
        entry_index: usize,
    ) -> Result<Self, ValidationError> {
        if functions.is_empty() {
            return Err(ValidationError::NoFunctions);
        }
        if entry_index >= functions.len() {
            return Err(ValidationError::EntryIndexOutOfRange {
                index: entry_index,
                count: functions.len(),
            });
        }
        Ok(Self {
            constants,
            instructions,
            functions,
            entry_index,
        })
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn functions(&self) -> &[FunctionInfo] {
        &self.functions
    }

    /// Index of the entry function in [`functions`](Self::functions).
    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn entry_function(&self) -> &FunctionInfo {
        // Module::new guarantees entry_index < functions.len().
        &self.functions[self.entry_index]
    }

    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    pub fn function(&self, index: usize) -> Option<&FunctionInfo> {
        self.functions.get(index)
    }

    pub fn function_by_name(&self, name: &str) -> Option<(usize, &FunctionInfo)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }

    /// The function whose body contains instruction `at`: the one with the
    /// greatest entry index not past `at`.
    pub fn owning_function(&self, at: usize) -> Option<(usize, &FunctionInfo)> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.entry_index <= at)
            .max_by_key(|(i, f)| (f.entry_index, std::cmp::Reverse(*i)))
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
