//! Binary module images.
//!
//! All integers are little-endian.
//! ```text
//! magic         b"TARN"
//! version       u16 (= 1)
//! entry index   u32
//! constants     u32 count, then per constant: tag u8 + payload
//!                 null     -
//!                 int      i64
//!                 float    u64 (f64 bits)
//!                 decimal  i128 mantissa, u8 scale
//!                 bool     u8 (0 or 1)
//!                 string   u32 length + UTF-8 bytes
//! functions     u32 count, then per function:
//!                 u32 name length, name, u32 entry, u32 params, u32 locals
//! instructions  u32 count, then 10-byte records
//! ```

use crate::decimal::Decimal;
use crate::error::{DecodeError, EncodeError};
use crate::instruction::{Instruction, RECORD_SIZE};
use crate::module::{FunctionInfo, Module};
use crate::value::Value;
use crate::value_kind::ValueKind;

pub const MAGIC: [u8; 4] = *b"TARN";
pub const FORMAT_VERSION: u16 = 1;

impl Module {
    /// Serialize to a module image.
    ///
    /// Counts and indices are written as `u32`; a module with a larger one
    /// is rejected rather than written truncated.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        put_u32(&mut out, self.entry_index(), "entry index")?;

        put_u32(&mut out, self.constants().len(), "constant count")?;
        for value in self.constants() {
            out.push(value.kind() as u8);
            match value {
                Value::Null => {}
                Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
                Value::Float(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
                Value::Decimal(d) => {
                    out.extend_from_slice(&d.mantissa().to_le_bytes());
                    out.push(d.scale() as u8);
                }
                Value::Bool(b) => out.push(u8::from(*b)),
                Value::String(s) => {
                    put_u32(&mut out, s.len(), "string length")?;
                    out.extend_from_slice(s.as_bytes());
                }
            }
        }

        put_u32(&mut out, self.functions().len(), "function count")?;
        for f in self.functions() {
            put_u32(&mut out, f.name.len(), "function name length")?;
            out.extend_from_slice(f.name.as_bytes());
            put_u32(&mut out, f.entry_index, "function entry")?;
            put_u32(&mut out, f.parameter_count, "parameter count")?;
            put_u32(&mut out, f.local_count, "local count")?;
        }

        put_u32(&mut out, self.instructions().len(), "instruction count")?;
        for instr in self.instructions() {
            out.extend_from_slice(&instr.encode());
        }
        Ok(out)
    }

    /// Parse a module image. The result is validated like [`Module::new`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader { bytes, pos: 0 };

        if r.take(4)? != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = u16::from_le_bytes(r.array()?);
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let entry_index = r.u32()?;

        let constant_count = r.u32()?;
        let mut constants = Vec::with_capacity(constant_count.min(r.remaining()));
        for _ in 0..constant_count {
            constants.push(r.value()?);
        }

        let function_count = r.u32()?;
        let mut functions = Vec::with_capacity(function_count.min(r.remaining()));
        for _ in 0..function_count {
            let name = r.string()?;
            let entry = r.u32()?;
            let params = r.u32()?;
            let locals = r.u32()?;
            functions.push(FunctionInfo::new(name, entry, params, locals));
        }

        let instruction_count = r.u32()?;
        let mut instructions = Vec::with_capacity(instruction_count.min(r.remaining()));
        for _ in 0..instruction_count {
            instructions.push(Instruction::decode(r.array::<RECORD_SIZE>()?)?);
        }

        if r.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(r.remaining()));
        }
        Ok(Module::new(constants, instructions, functions, entry_index)?)
    }
}

fn put_u32(out: &mut Vec<u8>, n: usize, field: &'static str) -> Result<(), EncodeError> {
    let n = u32::try_from(n).map_err(|_| EncodeError::FieldTooLarge { field, value: n })?;
    out.extend_from_slice(&n.to_le_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<usize, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.u32()?;
        let offset = self.pos;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn value(&mut self) -> Result<Value, DecodeError> {
        let offset = self.pos;
        let tag = self.u8()?;
        let kind = ValueKind::from_tag(tag).ok_or(DecodeError::InvalidValueTag { tag, offset })?;
        let value = match kind {
            ValueKind::Null => Value::Null,
            ValueKind::Int => Value::Int(i64::from_le_bytes(self.array()?)),
            ValueKind::Float => Value::Float(f64::from_bits(u64::from_le_bytes(self.array()?))),
            ValueKind::Decimal => {
                let mantissa = i128::from_le_bytes(self.array()?);
                let scale_offset = self.pos;
                let scale = self.u8()?;
                let decimal = Decimal::new(mantissa, scale as u32).ok_or(
                    DecodeError::InvalidDecimal {
                        scale,
                        offset: scale_offset,
                    },
                )?;
                Value::Decimal(decimal)
            }
            ValueKind::Bool => {
                let byte_offset = self.pos;
                match self.u8()? {
                    0 => Value::Bool(false),
                    1 => Value::Bool(true),
                    _ => {
                        return Err(DecodeError::InvalidValueTag {
                            tag,
                            offset: byte_offset,
                        })
                    }
                }
            }
            ValueKind::String => Value::from_string(self.string()?),
        };
        Ok(value)
    }
}
