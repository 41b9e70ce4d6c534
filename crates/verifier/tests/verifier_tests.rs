//! Integration tests for the Tarn verifier.

use proptest::prelude::*;
use tarn_common::opcode::ALL_OPCODES;
use tarn_common::{FunctionInfo, Instruction, Module, Opcode, Value};
use tarn_verifier::{verify, VerifyError};

fn op(opcode: Opcode) -> Instruction {
    Instruction::op(opcode)
}

fn with(opcode: Opcode, operand: i32) -> Instruction {
    Instruction::with_operand(opcode, operand)
}

/// `sum = 0; i = 1; while i < 11 { sum = sum + i; i = i + 1 }`.
fn counting_loop() -> Module {
    Module::new(
        vec![Value::Int(0), Value::Int(1), Value::Int(11)],
        vec![
            with(Opcode::PushConst, 0),
            with(Opcode::StoreLocal, 0),
            with(Opcode::PushConst, 1),
            with(Opcode::StoreLocal, 1),
            with(Opcode::LoadLocal, 1),
            with(Opcode::PushConst, 2),
            op(Opcode::CmpLt),
            with(Opcode::JumpIfFalse, 17),
            with(Opcode::LoadLocal, 0),
            with(Opcode::LoadLocal, 1),
            op(Opcode::Add),
            with(Opcode::StoreLocal, 0),
            with(Opcode::LoadLocal, 1),
            with(Opcode::PushConst, 1),
            op(Opcode::Add),
            with(Opcode::StoreLocal, 1),
            with(Opcode::Jump, 4),
            with(Opcode::LoadLocal, 0),
            op(Opcode::Halt),
        ],
        vec![FunctionInfo::new("main", 0, 0, 2)],
        0,
    )
    .unwrap()
}

// ========================================================
// Valid modules pass verification
// ========================================================

#[test]
fn accept_counting_loop() {
    assert!(verify(&counting_loop()).is_ok());
}

#[test]
fn accept_call_with_arguments() {
    let m = Module::new(
        vec![Value::Int(2), Value::Int(3)],
        vec![
            with(Opcode::PushConst, 0),
            with(Opcode::PushConst, 1),
            with(Opcode::Call, 1),
            op(Opcode::Halt),
            with(Opcode::LoadLocal, 0),
            with(Opcode::LoadLocal, 1),
            op(Opcode::Add),
            op(Opcode::Return),
        ],
        vec![
            FunctionInfo::new("main", 0, 0, 0),
            FunctionInfo::new("add", 4, 2, 2),
        ],
        0,
    )
    .unwrap();
    assert!(verify(&m).is_ok());
}

#[test]
fn accept_syscall_and_implicit_return() {
    let m = Module::new(
        vec![Value::from_string("hi")],
        vec![with(Opcode::PushConst, 0), with(Opcode::Syscall, 1)],
        vec![FunctionInfo::new("main", 0, 0, 0)],
        0,
    )
    .unwrap();
    assert!(verify(&m).is_ok());
}

// ========================================================
// Rejected modules
// ========================================================

#[test]
fn reject_bad_call_index() {
    let m = Module::new(
        vec![],
        vec![with(Opcode::Call, 3), op(Opcode::Halt)],
        vec![FunctionInfo::new("main", 0, 0, 0)],
        0,
    )
    .unwrap();
    assert_eq!(
        verify(&m).unwrap_err(),
        vec![VerifyError::FunctionOutOfRange {
            at: 0,
            index: 3,
            count: 1
        }]
    );
}

#[test]
fn reject_jump_past_end() {
    let m = Module::new(
        vec![],
        vec![with(Opcode::Jump, 5)],
        vec![FunctionInfo::new("main", 0, 0, 0)],
        0,
    )
    .unwrap();
    assert_eq!(
        verify(&m).unwrap_err(),
        vec![VerifyError::JumpOutOfRange {
            at: 0,
            target: 5,
            len: 1
        }]
    );
}

#[test]
fn reject_every_reserved_opcode() {
    for &opcode in ALL_OPCODES.iter().filter(|op| op.is_reserved()) {
        let m = Module::new(
            vec![],
            vec![op(opcode), op(Opcode::Halt)],
            vec![FunctionInfo::new("main", 0, 0, 0)],
            0,
        )
        .unwrap();
        assert_eq!(
            verify(&m).unwrap_err(),
            vec![VerifyError::ReservedOpcode { at: 0, opcode }],
            "{opcode:?}"
        );
    }
}

#[test]
fn reject_local_beyond_parameters() {
    let m = Module::new(
        vec![],
        vec![
            with(Opcode::Call, 1),
            op(Opcode::Halt),
            with(Opcode::LoadLocal, 2),
            op(Opcode::Return),
        ],
        vec![
            FunctionInfo::new("main", 0, 0, 0),
            FunctionInfo::new("f", 2, 2, 0),
        ],
        0,
    )
    .unwrap();
    assert_eq!(
        verify(&m).unwrap_err(),
        vec![VerifyError::LocalOutOfRange {
            at: 2,
            index: 2,
            slots: 2
        }]
    );
}

#[test]
fn reject_dead_code_between_functions() {
    let m = Module::new(
        vec![],
        vec![op(Opcode::Halt), op(Opcode::Nop), op(Opcode::Return)],
        vec![
            FunctionInfo::new("main", 0, 0, 0),
            FunctionInfo::new("f", 2, 0, 0),
        ],
        0,
    )
    .unwrap();
    assert_eq!(
        verify(&m).unwrap_err(),
        vec![VerifyError::UnreachableInstruction { at: 1 }]
    );
}

#[test]
fn errors_from_all_passes_are_collected() {
    let m = Module::new(
        vec![],
        vec![
            with(Opcode::PushConst, 0),
            Instruction::new(Opcode::Halt, 0, 1),
            op(Opcode::Nop),
        ],
        vec![
            FunctionInfo::new("main", 0, 0, 0),
            FunctionInfo::new("gone", 10, 0, 0),
        ],
        0,
    )
    .unwrap();
    let errors = verify(&m).unwrap_err();
    assert_eq!(errors.len(), 4, "{errors:?}");
    assert!(matches!(errors[0], VerifyError::ConstantOutOfRange { at: 0, .. }));
    assert!(matches!(
        errors[1],
        VerifyError::FunctionEntryOutOfRange { function: 1, .. }
    ));
    assert_eq!(errors[2], VerifyError::NonZeroUnusedField { at: 1 });
    assert_eq!(errors[3], VerifyError::UnreachableInstruction { at: 2 });
}

// ========================================================
// Properties
// ========================================================

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    (prop::sample::select(&ALL_OPCODES[..]), -4i32..24, prop_oneof![Just(0), -2i32..3])
        .prop_map(|(op, a, b)| Instruction::new(op, a, b))
}

fn arb_module() -> impl Strategy<Value = Module> {
    (
        prop::collection::vec(arb_instruction(), 0..24),
        prop::collection::vec((0usize..30, 0usize..4, 0usize..4), 1..4),
        0usize..3,
    )
        .prop_map(|(instrs, funcs, constant_count)| {
            let functions: Vec<FunctionInfo> = funcs
                .into_iter()
                .enumerate()
                .map(|(i, (entry, params, locals))| {
                    FunctionInfo::new(format!("f{i}"), entry, params, locals)
                })
                .collect();
            let constants = (0..constant_count as i64).map(Value::Int).collect();
            Module::new(constants, instrs, functions, 0).unwrap()
        })
}

proptest! {
    /// Arbitrary modules never panic the verifier, and every error with an
    /// instruction index points inside the module.
    #[test]
    fn verify_never_panics(module in arb_module()) {
        if let Err(errors) = verify(&module) {
            prop_assert!(!errors.is_empty());
            for error in &errors {
                if let Some(at) = error.at() {
                    prop_assert!(at < module.len(), "{:?}", error);
                }
            }
        }
    }

    /// Straight-line code ending in HALT is always accepted.
    #[test]
    fn straight_line_accepted(pushes in 0usize..16) {
        let mut instrs: Vec<Instruction> = (0..pushes).map(|_| with(Opcode::PushConst, 0)).collect();
        instrs.push(op(Opcode::Halt));
        let module = Module::new(
            vec![Value::Null],
            instrs,
            vec![FunctionInfo::new("main", 0, 0, 0)],
            0,
        )
        .unwrap();
        prop_assert!(verify(&module).is_ok());
    }
}
