//! Integration tests for the Tarn assembler.
//!
//! Tests cover:
//! - Sample programs (assemble, verify, execute)
//! - Label and call-by-name resolution through the text front end
//! - Error cases with line numbers
//! - Roundtrip properties (disassemble → assemble)

use std::io::Write;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use tarn_assembler::{assemble, disassemble, AsmError, ModuleBuilder};
use tarn_common::opcode::ALL_OPCODES;
use tarn_common::{Decimal, FunctionInfo, Instruction, Module, Opcode, OperandKind, Value};
use tarn_vm::{syscall, NullSink, RuntimeError, SyscallId, Vm};

// ---- Test helpers ----

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Assemble, verify and execute. Returns the final operand stack and
/// everything printed.
fn assemble_verify_execute(text: &str) -> (Vec<Value>, String) {
    let module = assemble(text).unwrap_or_else(|e| panic!("Assembly failed: {e}"));
    tarn_verifier::verify(&module).unwrap_or_else(|errors| {
        panic!("Verification failed: {errors:?}");
    });
    let out = SharedBuf::default();
    let mut vm = Vm::new(module).with_sink(NullSink);
    vm.register_syscall(SyscallId::PRINT, syscall::print_to(out.clone()));
    vm.run_from_entry()
        .unwrap_or_else(|err| panic!("Execution failed: {err}"));
    let printed = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
    (vm.operand_stack().as_slice().to_vec(), printed)
}

const SUM: &str = "\
; sum of 1..=10
.const int 0
.const int 1
.const int 11
.func main 0 2
    PUSH_CONST 0
    STORE_LOCAL 0       ; sum
    PUSH_CONST 1
    STORE_LOCAL 1       ; i
loop:
    LOAD_LOCAL 1
    PUSH_CONST 2
    CMP_LT
    JUMP_IF_FALSE done
    LOAD_LOCAL 0
    LOAD_LOCAL 1
    ADD
    STORE_LOCAL 0
    LOAD_LOCAL 1
    PUSH_CONST 1
    ADD
    STORE_LOCAL 1
    JUMP loop
done:
    LOAD_LOCAL 0
    HALT
";

const FACTORIAL: &str = "\
.const int 5
.const int 2
.const int 1
.entry main

.func fact 1 1
    LOAD_LOCAL 0
    PUSH_CONST 1
    CMP_LT
    JUMP_IF_FALSE recurse
    PUSH_CONST 2
    RETURN
recurse:
    LOAD_LOCAL 0
    LOAD_LOCAL 0
    PUSH_CONST 2
    SUB
    CALL fact
    MUL
    RETURN

.func main 0 0
    PUSH_CONST 0
    CALL fact
    HALT
";

// ---- Sample programs ----

#[test]
fn sum_loop() {
    let (stack, _) = assemble_verify_execute(SUM);
    assert_eq!(stack, vec![Value::Int(55)]);
}

#[test]
fn recursive_factorial() {
    let (stack, _) = assemble_verify_execute(FACTORIAL);
    assert_eq!(stack, vec![Value::Int(120)]);
}

#[test]
fn hello_prints() {
    let text = "\
.const string \"Hello, Tarn!\"
.func main 0 0
    PUSH_CONST 0
    SYSCALL 1
    HALT
";
    let (stack, printed) = assemble_verify_execute(text);
    assert!(stack.is_empty());
    assert_eq!(printed, "Hello, Tarn!\n");
}

#[test]
fn subtraction_argument_order() {
    let text = "\
.const int 10
.const int 3
.func main 0 0
    PUSH_CONST 0
    PUSH_CONST 1
    CALL minus
    HALT
.func minus 2 2
    LOAD_LOCAL 0
    LOAD_LOCAL 1
    SUB
    RETURN
";
    let (stack, _) = assemble_verify_execute(text);
    assert_eq!(stack, vec![Value::Int(7)]);
}

#[test]
fn decimal_addition_is_exact() {
    let text = "\
.const decimal 0.1
.const decimal 0.2
.func main 0 0
    PUSH_CONST 0
    PUSH_CONST 1
    ADD
    HALT
";
    let (stack, _) = assemble_verify_execute(text);
    assert_eq!(stack, vec![Value::Decimal("0.3".parse::<Decimal>().unwrap())]);
}

#[test]
fn string_concatenation_prints() {
    let text = "\
.const string \"tarn \"
.const string \"vm\"
.func main 0 0
    PUSH_CONST 0
    PUSH_CONST 1
    ADD
    SYSCALL 1
";
    let (_, printed) = assemble_verify_execute(text);
    assert_eq!(printed, "tarn vm\n");
}

#[test]
fn runtime_fault_points_at_assembled_index() {
    let text = "\
.const int 1
.const int 0
.func main 0 0
    PUSH_CONST 0
    PUSH_CONST 1
    DIV
    HALT
";
    let module = assemble(text).unwrap();
    let mut vm = Vm::new(module).with_sink(NullSink);
    assert_eq!(vm.run_from_entry(), Err(RuntimeError::DivisionByZero { at: 2 }));
}

// ---- Resolution ----

#[test]
fn numeric_and_symbolic_targets_agree() {
    let symbolic = assemble(SUM).unwrap();
    let numeric_text = SUM
        .replace("JUMP_IF_FALSE done", "JUMP_IF_FALSE 17")
        .replace("JUMP loop", "JUMP 4");
    assert_eq!(assemble(&numeric_text).unwrap(), symbolic);
}

#[test]
fn call_by_index_matches_call_by_name() {
    let by_index = FACTORIAL.replace("CALL fact", "CALL 0");
    assert_eq!(assemble(&by_index).unwrap(), assemble(FACTORIAL).unwrap());
}

#[test]
fn text_matches_builder() {
    let mut b = ModuleBuilder::new();
    b.begin_function("main", 0, 1).unwrap();
    b.mark_label("top").unwrap();
    b.push_const(Value::Bool(false)).unwrap();
    b.emit_jump(Opcode::JumpIfFalse, "top");
    b.emit_op(Opcode::Halt);
    let built = b.build().unwrap();

    let text = "\
.const bool false
.func main 0 1
top: PUSH_CONST 0
    JUMP_IF_FALSE top
    HALT
";
    assert_eq!(assemble(text).unwrap(), built);
}

#[test]
fn header_function_with_label_entry() {
    let text = "\
.func main 0 0 start
    RETURN
start:
    HALT
";
    let module = assemble(text).unwrap();
    assert_eq!(module.entry_function().entry_index, 1);
}

// ---- Errors ----

#[test]
fn error_unknown_opcode() {
    let err = assemble(".func main 0 0\n    JUMPP 3\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::UnknownOpcode {
            line: 2,
            token: "JUMPP".to_string()
        }
    );
}

#[test]
fn error_unterminated_string() {
    let err = assemble(".const string \"oops\n.func main 0 0\n").unwrap_err();
    assert_eq!(err, AsmError::UnterminatedString { line: 1 });
}

#[test]
fn error_duplicate_function() {
    let err = assemble(".func f 0 0\n.func f 0 0\n").unwrap_err();
    assert_eq!(err.to_string(), "line 2: duplicate function 'f'");
}

#[test]
fn error_undefined_label_names_line() {
    let text = SUM.replace("JUMP loop", "JUMP lop");
    let err = assemble(&text).unwrap_err();
    assert_eq!(err.line(), Some(23));
    assert!(err.to_string().contains("undefined label 'lop'"));
}

#[test]
fn error_missing_func_arguments() {
    let err = assemble(".func main 0\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::MissingArgument {
            line: 1,
            opcode: ".func",
            expected: 3
        }
    );
}

// ---- Roundtrip ----

#[test]
fn samples_roundtrip() {
    for text in [SUM, FACTORIAL] {
        let module = assemble(text).unwrap();
        assert_eq!(assemble(&disassemble(&module)).unwrap(), module);
    }
}

#[test]
fn disassembly_is_stable() {
    let once = disassemble(&assemble(FACTORIAL).unwrap());
    let twice = disassemble(&assemble(&once).unwrap());
    assert_eq!(once, twice);
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        (-1_000_000_000i128..1_000_000_000, 0u32..=6)
            .prop_map(|(m, s)| Value::Decimal(Decimal::new(m, s).unwrap_or(Decimal::ZERO))),
        any::<bool>().prop_map(Value::Bool),
        ".{0,12}".prop_map(Value::from_string),
    ]
}

fn arb_instruction(len: usize) -> impl Strategy<Value = Instruction> {
    (prop::sample::select(&ALL_OPCODES[..]), any::<i32>(), 0..len as i32 + 3).prop_map(
        |(opcode, raw, near)| {
            let operand = match opcode.operand_kind() {
                OperandKind::None => 0,
                OperandKind::Target | OperandKind::Function => near - 1,
                OperandKind::Constant | OperandKind::Local | OperandKind::Syscall => raw,
            };
            Instruction::with_operand(opcode, operand)
        },
    )
}

fn arb_module() -> impl Strategy<Value = Module> {
    (1usize..4, 0usize..16)
        .prop_flat_map(|(function_count, len)| {
            (
                prop::collection::vec(arb_value(), 0..4),
                prop::collection::vec(arb_instruction(len), len),
                prop::collection::vec((0..len + 3, 0usize..3, 0usize..3), function_count),
                0..function_count,
            )
        })
        .prop_map(|(constants, instructions, functions, entry)| {
            let functions = functions
                .into_iter()
                .enumerate()
                .map(|(i, (at, params, locals))| FunctionInfo::new(format!("f{i}"), at, params, locals))
                .collect();
            Module::new(constants, instructions, functions, entry).unwrap()
        })
}

proptest! {
    #[test]
    fn disassemble_assemble_roundtrip(module in arb_module()) {
        let text = disassemble(&module);
        let reassembled = assemble(&text);
        prop_assert_eq!(reassembled.as_ref(), Ok(&module), "{}", text);
    }
}
