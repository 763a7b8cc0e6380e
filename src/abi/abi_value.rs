//! The dynamic value model ABI types encode from and decode into.

use num_bigint::BigUint;

/// A value on its way into or out of ABI encoding.
///
/// `Uint` carries every integer width; `Byte` and `Address` exist so byte
/// and address types can round-trip without losing their shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ABIValue {
    Bool(bool),
    Uint(BigUint),
    String(String),
    Byte(u8),
    Array(Vec<ABIValue>),
    Address(String),
}

macro_rules! abi_value_from {
    ($($source:ty => $variant:ident via $convert:expr;)*) => {
        $(impl From<$source> for ABIValue {
            fn from(value: $source) -> Self {
                ABIValue::$variant($convert(value))
            }
        })*
    };
}

abi_value_from! {
    bool => Bool via |v| v;
    BigUint => Uint via |v| v;
    u8 => Uint via BigUint::from;
    u16 => Uint via BigUint::from;
    u32 => Uint via BigUint::from;
    u64 => Uint via BigUint::from;
    u128 => Uint via BigUint::from;
    String => String via |v| v;
    &str => String via |v: &str| v.to_string();
    Vec<ABIValue> => Array via |v| v;
}

impl ABIValue {
    /// A single byte value. Distinct from the `u8` conversion, which
    /// produces a `Uint`.
    pub fn from_byte(value: u8) -> Self {
        ABIValue::Byte(value)
    }

    /// An address value from its base32 string form.
    pub fn from_address<S: Into<String>>(value: S) -> Self {
        ABIValue::Address(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_conversions_produce_uint() {
        assert_eq!(ABIValue::from(7u8), ABIValue::Uint(BigUint::from(7u8)));
        assert_eq!(
            ABIValue::from(u128::MAX),
            ABIValue::Uint(BigUint::from(u128::MAX))
        );
    }

    #[test]
    fn test_byte_constructor_is_not_uint() {
        assert_eq!(ABIValue::from_byte(7), ABIValue::Byte(7));
        assert_ne!(ABIValue::from_byte(7), ABIValue::from(7u8));
    }
}
