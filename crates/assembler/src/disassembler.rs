//! Disassembler: module → canonical assembly text.
//!
//! Every in-range jump target and every function entry gets an `L<index>`
//! label, calls name their callee, and constants are written as `.const`
//! directives in table order so that reassembling yields the same module.

use std::collections::BTreeSet;
use std::fmt::Write;

use tarn_common::{Instruction, Module, OperandKind, Value};

use crate::lexer::escape;

/// Disassemble a module into canonical text.
pub(crate) fn disassemble(module: &Module) -> String {
    let len = module.len();
    let functions = module.functions();

    // Inline `.func` lines keep table order only if entries never decrease.
    let inline = functions.windows(2).all(|w| w[0].entry_index <= w[1].entry_index)
        && functions.iter().all(|f| f.entry_index <= len);

    let mut labels: BTreeSet<usize> = module
        .instructions()
        .iter()
        .filter(|i| i.opcode.is_jump())
        .filter_map(|i| usize::try_from(i.operand0).ok())
        .filter(|&t| t <= len)
        .collect();
    if !inline {
        labels.extend(functions.iter().map(|f| f.entry_index).filter(|&e| e <= len));
    }

    let mut out = String::new();
    for value in module.constants() {
        let _ = writeln!(out, ".const {}", const_literal(value));
    }
    if !inline {
        for f in functions {
            let entry = if f.entry_index <= len {
                format!("L{}", f.entry_index)
            } else {
                f.entry_index.to_string()
            };
            let _ = writeln!(
                out,
                ".func {} {} {} {entry}",
                f.name, f.parameter_count, f.local_count
            );
        }
    }
    let _ = writeln!(out, ".entry {}", module.entry_function().name);

    let mut next_function = 0;
    for at in 0..=len {
        if inline {
            while let Some(f) = functions.get(next_function).filter(|f| f.entry_index == at) {
                let _ = writeln!(
                    out,
                    "\n.func {} {} {}",
                    f.name, f.parameter_count, f.local_count
                );
                next_function += 1;
            }
        }
        if labels.contains(&at) {
            let _ = writeln!(out, "L{at}:");
        }
        if let Some(instr) = module.instructions().get(at) {
            let _ = writeln!(out, "    {}", instruction_text(module, instr));
        }
    }
    out
}

fn const_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("string {}", escape(s)),
        other => format!("{} {other}", other.kind()),
    }
}

fn instruction_text(module: &Module, instr: &Instruction) -> String {
    let mnemonic = instr.opcode.mnemonic();
    let operand = instr.operand0;
    match instr.opcode.operand_kind() {
        OperandKind::None => mnemonic.to_string(),
        OperandKind::Constant | OperandKind::Local | OperandKind::Syscall => {
            format!("{mnemonic} {operand}")
        }
        OperandKind::Target => match usize::try_from(operand) {
            Ok(target) if target <= module.len() => format!("{mnemonic} L{target}"),
            _ => format!("{mnemonic} {operand}"),
        },
        OperandKind::Function => match usize::try_from(operand).ok().and_then(|i| module.function(i)) {
            Some(f) => format!("{mnemonic} {}", f.name),
            None => format!("{mnemonic} {operand}"),
        },
    }
}
