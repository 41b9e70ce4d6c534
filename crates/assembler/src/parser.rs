//! Parser for Tarn assembly tokens → statements.
//!
//! A line holds any number of label definitions followed by at most one
//! directive or instruction. Operands are shaped by the opcode's
//! [`OperandKind`].

use tarn_common::{Decimal, OperandKind, Opcode, Value, ValueKind};

use crate::error::AsmError;
use crate::lexer::Token;

/// Where a `.func` declared with an explicit entry starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FuncEntry {
    Label(String),
    Index(usize),
}

/// The operand of a parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    None,
    Number(i32),
    Label(String),
    Function(String),
}

/// One thing a line asks the assembler to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    Label(String),
    Const(Value),
    Func {
        name: String,
        parameter_count: usize,
        local_count: usize,
        entry: Option<FuncEntry>,
    },
    Entry(String),
    Instr { opcode: Opcode, operand: Operand },
}

/// Parse the tokens of a single line.
///
/// Returns an empty Vec for blank lines.
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Vec<Statement>, AsmError> {
    let mut statements = Vec::new();
    let mut rest = tokens;
    while let Some((Token::Label(name), tail)) = rest.split_first() {
        statements.push(Statement::Label(name.clone()));
        rest = tail;
    }

    let Some((head, args)) = rest.split_first() else {
        return Ok(statements);
    };
    let statement = match head {
        Token::Directive(name) => parse_directive(name, args, line_num)?,
        Token::Ident(mnemonic) => parse_instruction(mnemonic, args, line_num)?,
        other => {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: other.text(),
            })
        }
    };
    statements.push(statement);
    Ok(statements)
}

fn parse_directive(name: &str, args: &[Token], line: usize) -> Result<Statement, AsmError> {
    match name {
        "const" => parse_const(args, line),
        "func" => {
            let name = expect_ident(args, 0, line, ".func", 3)?;
            let parameter_count = expect_count(args, 1, line, ".func", 3)?;
            let local_count = expect_count(args, 2, line, ".func", 3)?;
            let entry = match args.get(3) {
                None => None,
                Some(Token::Ident(label)) => Some(FuncEntry::Label(label.clone())),
                Some(Token::Number(text)) => Some(FuncEntry::Index(parse_count(text, line)?)),
                Some(other) => return Err(unexpected(other, line)),
            };
            expect_end(args.get(4..).unwrap_or(&[]), line)?;
            Ok(Statement::Func {
                name,
                parameter_count,
                local_count,
                entry,
            })
        }
        "entry" => {
            let name = expect_ident(args, 0, line, ".entry", 1)?;
            expect_end(&args[1..], line)?;
            Ok(Statement::Entry(name))
        }
        _ => Err(AsmError::UnknownDirective {
            line,
            token: format!(".{name}"),
        }),
    }
}

fn parse_const(args: &[Token], line: usize) -> Result<Statement, AsmError> {
    let kind = match args.first() {
        Some(Token::Ident(name)) => ValueKind::from_name(&name.to_ascii_lowercase())
            .ok_or_else(|| unexpected(&args[0], line))?,
        Some(other) => return Err(unexpected(other, line)),
        None => {
            return Err(AsmError::MissingArgument {
                line,
                opcode: ".const",
                expected: 2,
            })
        }
    };
    if kind == ValueKind::Null {
        expect_end(&args[1..], line)?;
        return Ok(Statement::Const(Value::Null));
    }

    let literal = args.get(1).ok_or(AsmError::MissingArgument {
        line,
        opcode: ".const",
        expected: 2,
    })?;
    let invalid = |kind: &'static str| AsmError::InvalidLiteral {
        line,
        kind,
        token: literal.text(),
    };
    let value = match (kind, literal) {
        (ValueKind::Int, Token::Number(text)) => {
            Value::Int(parse_integer(text).ok_or_else(|| invalid("int"))?)
        }
        (ValueKind::Float, Token::Number(text) | Token::Ident(text)) => {
            Value::Float(text.parse::<f64>().map_err(|_| invalid("float"))?)
        }
        (ValueKind::Decimal, Token::Number(text)) => {
            Value::Decimal(text.parse::<Decimal>().map_err(|_| invalid("decimal"))?)
        }
        (ValueKind::Bool, Token::Ident(text)) if text.eq_ignore_ascii_case("true") => {
            Value::Bool(true)
        }
        (ValueKind::Bool, Token::Ident(text)) if text.eq_ignore_ascii_case("false") => {
            Value::Bool(false)
        }
        (ValueKind::String, Token::Str(text)) => Value::from_string(text.as_str()),
        (kind, _) => return Err(invalid(kind.name())),
    };
    expect_end(&args[2..], line)?;
    Ok(Statement::Const(value))
}

fn parse_instruction(mnemonic: &str, args: &[Token], line: usize) -> Result<Statement, AsmError> {
    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownOpcode {
        line,
        token: mnemonic.to_string(),
    })?;

    let operand = match opcode.operand_kind() {
        OperandKind::None => {
            expect_end(args, line)?;
            return Ok(Statement::Instr {
                opcode,
                operand: Operand::None,
            });
        }
        OperandKind::Constant | OperandKind::Local | OperandKind::Syscall => {
            match operand_token(args, line, opcode)? {
                Token::Number(text) => Operand::Number(parse_operand(text, line)?),
                other => return Err(unexpected(other, line)),
            }
        }
        OperandKind::Target => match operand_token(args, line, opcode)? {
            Token::Number(text) => Operand::Number(parse_operand(text, line)?),
            Token::Ident(label) => Operand::Label(label.clone()),
            other => return Err(unexpected(other, line)),
        },
        OperandKind::Function => match operand_token(args, line, opcode)? {
            Token::Number(text) => Operand::Number(parse_operand(text, line)?),
            Token::Ident(name) => Operand::Function(name.clone()),
            other => return Err(unexpected(other, line)),
        },
    };
    expect_end(&args[1..], line)?;
    Ok(Statement::Instr { opcode, operand })
}

/// Parse a signed decimal or `0x` hex integer.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i128::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if body.bytes().all(|b| b.is_ascii_digit()) => body.parse::<i128>().ok()?,
        None => return None,
    };
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn parse_operand(text: &str, line: usize) -> Result<i32, AsmError> {
    parse_integer(text)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AsmError::InvalidNumber {
            line,
            token: text.to_string(),
        })
}

fn parse_count(text: &str, line: usize) -> Result<usize, AsmError> {
    parse_integer(text)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| AsmError::InvalidNumber {
            line,
            token: text.to_string(),
        })
}

fn operand_token<'a>(args: &'a [Token], line: usize, opcode: Opcode) -> Result<&'a Token, AsmError> {
    args.first().ok_or(AsmError::MissingArgument {
        line,
        opcode: opcode.mnemonic(),
        expected: 1,
    })
}

fn expect_ident(
    args: &[Token],
    idx: usize,
    line: usize,
    opcode: &'static str,
    expected: usize,
) -> Result<String, AsmError> {
    match args.get(idx) {
        Some(Token::Ident(s)) => Ok(s.clone()),
        Some(other) => Err(unexpected(other, line)),
        None => Err(AsmError::MissingArgument {
            line,
            opcode,
            expected,
        }),
    }
}

fn expect_count(
    args: &[Token],
    idx: usize,
    line: usize,
    opcode: &'static str,
    expected: usize,
) -> Result<usize, AsmError> {
    match args.get(idx) {
        Some(Token::Number(text)) => parse_count(text, line),
        Some(other) => Err(unexpected(other, line)),
        None => Err(AsmError::MissingArgument {
            line,
            opcode,
            expected,
        }),
    }
}

fn unexpected(token: &Token, line: usize) -> AsmError {
    AsmError::UnexpectedToken {
        line,
        token: token.text(),
    }
}

/// Check that there are no extra tokens.
fn expect_end(remaining: &[Token], line: usize) -> Result<(), AsmError> {
    match remaining.first() {
        Some(tok) => Err(unexpected(tok, line)),
        None => Ok(()),
    }
}
