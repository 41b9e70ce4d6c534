//! Tarn assembler: label-resolving builders and text ↔ module translation.
//!
//! Two layers:
//! - [`Assembler`] and [`ModuleBuilder`] build modules from code, with
//!   symbolic jump labels and call-by-name resolved when finished.
//! - [`assemble`] and [`disassemble`] translate the textual format.
//!
//! # Usage
//!
//! ```
//! use tarn_assembler::{assemble, disassemble};
//!
//! let text = "\
//! .const int 40
//! .const int 2
//! .func main 0 0
//!     PUSH_CONST 0
//!     PUSH_CONST 1
//!     ADD
//!     HALT
//! ";
//! let module = assemble(text).unwrap();
//! assert_eq!(module.len(), 4);
//! assert_eq!(assemble(&disassemble(&module)).unwrap(), module);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(module)) == module` holds whenever function names
//! are unique identifiers and unused operands are zero. Jump targets and
//! function entries outside `0..=len` are written as plain numbers.

pub mod builder;
pub mod error;
pub mod module_builder;

mod disassembler;
mod lexer;
mod parser;

pub use builder::Assembler;
pub use error::AsmError;
pub use module_builder::ModuleBuilder;

use lexer::tokenize_line;
use parser::{parse_line, FuncEntry, Operand, Statement};
use tarn_common::Module;

/// Assemble text into a module.
///
/// Returns the first error encountered. Errors that can only be detected
/// once the whole text is read (undefined labels and functions) report the
/// line of the instruction that referred to them.
pub fn assemble(text: &str) -> Result<Module, AsmError> {
    let mut builder = ModuleBuilder::new();
    let mut instruction_lines = Vec::new();
    let mut entry_line = None;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let tokens = tokenize_line(line, line_num)?;
        for statement in parse_line(&tokens, line_num)? {
            if matches!(statement, Statement::Instr { .. }) {
                instruction_lines.push(line_num);
            }
            if matches!(statement, Statement::Entry(_)) {
                entry_line = Some(line_num);
            }
            apply(&mut builder, statement).map_err(|e| e.at_line(line_num))?;
        }
    }

    builder.build().map_err(|e| {
        let line = match &e {
            AsmError::UndefinedLabel { at, .. } | AsmError::UndefinedFunction { at, .. } => {
                instruction_lines.get(*at).copied()
            }
            AsmError::UndefinedEntry { .. } => entry_line,
            _ => None,
        };
        match line {
            Some(line) => e.at_line(line),
            None => e,
        }
    })
}

fn apply(builder: &mut ModuleBuilder, statement: Statement) -> Result<(), AsmError> {
    match statement {
        Statement::Label(name) => builder.mark_label(&name)?,
        Statement::Const(value) => {
            builder.constant(value);
        }
        Statement::Func {
            name,
            parameter_count,
            local_count,
            entry,
        } => {
            match entry {
                None => builder.begin_function(&name, parameter_count, local_count)?,
                Some(FuncEntry::Label(label)) => {
                    builder.declare_function_at_label(&name, &label, parameter_count, local_count)?
                }
                Some(FuncEntry::Index(index)) => {
                    builder.declare_function(&name, index, parameter_count, local_count)?
                }
            };
        }
        Statement::Entry(name) => builder.set_entry(&name),
        Statement::Instr { opcode, operand } => {
            match operand {
                Operand::None => builder.emit_op(opcode),
                Operand::Number(n) => builder.emit(opcode, n, 0),
                Operand::Label(label) => builder.emit_jump(opcode, &label),
                Operand::Function(name) => builder.emit_call(&name),
            };
        }
    }
    Ok(())
}

/// Disassemble a module into canonical assembly text.
pub fn disassemble(module: &Module) -> String {
    disassembler::disassemble(module)
}
