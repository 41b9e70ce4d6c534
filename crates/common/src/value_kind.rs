//! Value kind tags.
//!
//! The kind is the discriminant of a [`Value`](crate::Value). Its byte form
//! is also the constant tag in module images.

use std::fmt;

/// Identifies which variant a value holds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null = 0x00,
    Int = 0x01,
    Float = 0x02,
    Decimal = 0x03,
    Bool = 0x04,
    String = 0x05,
}

/// All value kinds, in tag order.
pub const ALL_VALUE_KINDS: [ValueKind; 6] = [
    ValueKind::Null,
    ValueKind::Int,
    ValueKind::Float,
    ValueKind::Decimal,
    ValueKind::Bool,
    ValueKind::String,
];

impl ValueKind {
    /// Look up a kind by its tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        ALL_VALUE_KINDS.get(tag as usize).copied()
    }

    /// Lowercase name, as used in assembly `.const` directives.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
        }
    }

    /// Look up a kind by its assembly name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_VALUE_KINDS.iter().find(|k| k.name() == name).copied()
    }

    /// Returns true for Int, Float and Decimal.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float | ValueKind::Decimal)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip_all_kinds() {
        for &kind in &ALL_VALUE_KINDS {
            let tag = kind as u8;
            assert_eq!(ValueKind::from_tag(tag), Some(kind), "tag {tag:#04x}");
        }
    }

    #[test]
    fn unknown_tags_rejected() {
        for tag in 0x06..=0xFFu8 {
            assert_eq!(ValueKind::from_tag(tag), None, "tag {tag:#04x}");
        }
    }

    #[test]
    fn name_lookup() {
        for &kind in &ALL_VALUE_KINDS {
            assert_eq!(ValueKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ValueKind::from_name("INT"), None);
    }

    #[test]
    fn numeric_kinds() {
        assert!(ValueKind::Int.is_numeric());
        assert!(ValueKind::Float.is_numeric());
        assert!(ValueKind::Decimal.is_numeric());
        assert!(!ValueKind::Bool.is_numeric());
        assert!(!ValueKind::String.is_numeric());
        assert!(!ValueKind::Null.is_numeric());
    }
}
