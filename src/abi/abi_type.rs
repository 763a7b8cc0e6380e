//! The ABI type system: parsing type strings, and encoding and decoding
//! primitive values. Tuple and array composition lives in [`super::tuple`].

use crate::abi::tuple::{self, find_bool_sequence_end};
use crate::abi::{
    ABIError, ABIValue, BITS_PER_BYTE, BOOL_FALSE_BYTE, BOOL_TRUE_BYTE, LENGTH_ENCODE_BYTE_SIZE,
    MAX_BIT_SIZE, MAX_PRECISION,
};
use crate::transact::Address;
use crate::transact::constants::ALGORAND_PUBLIC_KEY_BYTE_LENGTH;
use num_bigint::BigUint;
use regex::Regex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;

static STATIC_ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z\d\[\](),]+)\[(0|[1-9][\d]*)]$").expect("Invalid static array regex")
});

static UFIXED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ufixed([1-9][\d]*)x([1-9][\d]*)$").expect("Invalid ufixed regex")
});

/// A validated bit size for ABI uint and ufixed types (8-512, multiple of 8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSize(u16);

impl BitSize {
    pub fn new(bits: u16) -> Result<Self, ABIError> {
        if bits < BITS_PER_BYTE as u16 || bits > MAX_BIT_SIZE || bits % BITS_PER_BYTE as u16 != 0 {
            return Err(ABIError::ValidationError {
                message: format!(
                    "Bit size must be between {} and {} and divisible by {}, got {}",
                    BITS_PER_BYTE, MAX_BIT_SIZE, BITS_PER_BYTE, bits
                ),
            });
        }
        Ok(BitSize(bits))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

/// A validated precision for ufixed ABI types (0-160).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precision(u8);

impl Precision {
    pub fn new(precision: u8) -> Result<Self, ABIError> {
        if precision > MAX_PRECISION {
            return Err(ABIError::ValidationError {
                message: format!(
                    "Precision must be between 0 and {}, got {}",
                    MAX_PRECISION, precision
                ),
            });
        }
        Ok(Precision(precision))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// An Algorand ABI type as defined in
/// [ARC-4](https://arc.algorand.foundation/ARCs/arc-0004#types).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ABIType {
    /// `uint<N>`, an N-bit unsigned integer.
    Uint(BitSize),
    /// `ufixed<N>x<M>`, an N-bit unsigned fixed-point number with M digits
    /// of precision.
    UFixed(BitSize, Precision),
    /// `address`, a 32-byte Algorand public key.
    Address,
    /// `(T1,T2,...)`, a heterogeneous tuple.
    Tuple(Vec<ABIType>),
    /// `string`, length-prefixed UTF-8.
    String,
    /// `byte`, a single octet.
    Byte,
    /// `bool`, bit-packed inside tuples and arrays.
    Bool,
    /// `T[N]`, N elements of a fixed element type.
    StaticArray(Box<ABIType>, usize),
    /// `T[]`, a length-prefixed array of a fixed element type.
    DynamicArray(Box<ABIType>),
}

impl AsRef<ABIType> for ABIType {
    fn as_ref(&self) -> &ABIType {
        self
    }
}

impl ABIType {
    /// Encodes an [`ABIValue`] according to this ABI type specification.
    pub fn encode(&self, value: &ABIValue) -> Result<Vec<u8>, ABIError> {
        match self {
            // On the wire a ufixed<N>x<M> is a uint<N>; the precision only
            // affects interpretation
            ABIType::Uint(bit_size) | ABIType::UFixed(bit_size, _) => {
                encode_uint(bit_size.value(), value)
            }
            ABIType::Address => encode_address(value),
            ABIType::Tuple(child_types) => {
                tuple::encode_elements(child_types, tuple::expect_array(value)?)
            }
            ABIType::StaticArray(child_type, size) => {
                tuple::encode_static_array(child_type, *size, value)
            }
            ABIType::DynamicArray(child_type) => tuple::encode_dynamic_array(child_type, value),
            ABIType::String => encode_string(value),
            ABIType::Byte => encode_byte(value),
            ABIType::Bool => encode_bool(value),
        }
    }

    /// Decodes bytes according to this ABI type specification.
    pub fn decode(&self, bytes: &[u8]) -> Result<ABIValue, ABIError> {
        match self {
            ABIType::Uint(bit_size) | ABIType::UFixed(bit_size, _) => {
                decode_uint(bit_size.value(), bytes)
            }
            ABIType::Address => decode_address(bytes),
            ABIType::String => decode_string(bytes),
            ABIType::Bool => decode_bool(bytes),
            ABIType::Byte => decode_byte(bytes),
            ABIType::Tuple(child_types) => tuple::decode_elements(child_types, bytes),
            ABIType::StaticArray(child_type, size) => {
                tuple::decode_static_array(child_type, *size, bytes)
            }
            ABIType::DynamicArray(child_type) => tuple::decode_dynamic_array(child_type, bytes),
        }
    }

    /// Whether the encoded byte length depends on the value.
    pub(crate) fn is_dynamic(&self) -> bool {
        match self {
            ABIType::String | ABIType::DynamicArray(_) => true,
            ABIType::StaticArray(child_type, _) => child_type.is_dynamic(),
            ABIType::Tuple(child_types) => child_types.iter().any(ABIType::is_dynamic),
            _ => false,
        }
    }

    /// The encoded byte length of a static type. Errors for dynamic types,
    /// whose length is value-dependent.
    pub(crate) fn byte_size(&self) -> Result<usize, ABIError> {
        match self {
            ABIType::Uint(bit_size) | ABIType::UFixed(bit_size, _) => {
                Ok((bit_size.value() / BITS_PER_BYTE as u16) as usize)
            }
            ABIType::Address => Ok(ALGORAND_PUBLIC_KEY_BYTE_LENGTH),
            ABIType::Bool | ABIType::Byte => Ok(1),
            ABIType::StaticArray(child_type, size) => match child_type.as_ref() {
                ABIType::Bool => Ok(size.div_ceil(BITS_PER_BYTE as usize)),
                _ => Ok(child_type.byte_size()? * size),
            },
            ABIType::Tuple(child_types) => {
                let mut total = 0;
                let mut i = 0;
                while i < child_types.len() {
                    if matches!(child_types[i], ABIType::Bool) {
                        // Runs of bools share bytes, eight bools per byte
                        let end = find_bool_sequence_end(child_types, i);
                        total += (end - i + 1).div_ceil(BITS_PER_BYTE as usize);
                        i = end + 1;
                    } else {
                        total += child_types[i].byte_size()?;
                        i += 1;
                    }
                }
                Ok(total)
            }
            ABIType::String | ABIType::DynamicArray(_) => Err(ABIError::DecodingError {
                message: format!("Failed to get size, {} is a dynamic type", self),
            }),
        }
    }
}

fn encode_uint(bit_size: u16, value: &ABIValue) -> Result<Vec<u8>, ABIError> {
    let ABIValue::Uint(n) = value else {
        return Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected uint".to_string(),
        });
    };

    if *n >= BigUint::from(2u64).pow(bit_size as u32) {
        return Err(ABIError::EncodingError {
            message: format!("{} is too big to fit in uint{}", n, bit_size),
        });
    }

    Ok(big_uint_to_bytes(n, (bit_size / 8) as usize))
}

fn decode_uint(bit_size: u16, bytes: &[u8]) -> Result<ABIValue, ABIError> {
    let expected_len = (bit_size / 8) as usize;
    if bytes.len() != expected_len {
        return Err(ABIError::DecodingError {
            message: format!(
                "Invalid byte array length, expected {} bytes, got {}",
                expected_len,
                bytes.len()
            ),
        });
    }

    Ok(ABIValue::Uint(BigUint::from_bytes_be(bytes)))
}

fn encode_address(value: &ABIValue) -> Result<Vec<u8>, ABIError> {
    let ABIValue::Address(address_str) = value else {
        return Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected address string".to_string(),
        });
    };

    let address = Address::from_str(address_str).map_err(|e| ABIError::ValidationError {
        message: e.to_string(),
    })?;
    Ok(address.as_bytes().to_vec())
}

fn decode_address(bytes: &[u8]) -> Result<ABIValue, ABIError> {
    let pub_key: [u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH] =
        bytes.try_into().map_err(|_| ABIError::DecodingError {
            message: format!(
                "Address byte string must be {} bytes long",
                ALGORAND_PUBLIC_KEY_BYTE_LENGTH
            ),
        })?;

    Ok(ABIValue::Address(Address(pub_key).as_str()))
}

fn encode_string(value: &ABIValue) -> Result<Vec<u8>, ABIError> {
    let ABIValue::String(s) = value else {
        return Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected string".to_string(),
        });
    };

    let utf8_bytes = s.as_bytes();
    let mut result = Vec::with_capacity(LENGTH_ENCODE_BYTE_SIZE + utf8_bytes.len());
    result.extend_from_slice(&(utf8_bytes.len() as u16).to_be_bytes());
    result.extend_from_slice(utf8_bytes);
    Ok(result)
}

fn decode_string(bytes: &[u8]) -> Result<ABIValue, ABIError> {
    if bytes.len() < LENGTH_ENCODE_BYTE_SIZE {
        return Err(ABIError::DecodingError {
            message: "Byte array is too short for string".to_string(),
        });
    }

    let length = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let content_bytes = &bytes[LENGTH_ENCODE_BYTE_SIZE..];
    if content_bytes.len() != length {
        return Err(ABIError::DecodingError {
            message: format!(
                "Invalid byte array length for string, expected {} value, got {}",
                length,
                content_bytes.len()
            ),
        });
    }

    String::from_utf8(content_bytes.to_vec())
        .map(ABIValue::String)
        .map_err(|_| ABIError::DecodingError {
            message: "Invalid UTF-8 encoding".to_string(),
        })
}

fn encode_byte(value: &ABIValue) -> Result<Vec<u8>, ABIError> {
    match value {
        ABIValue::Byte(n) => Ok(vec![*n]),
        _ => Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected byte".to_string(),
        }),
    }
}

fn decode_byte(bytes: &[u8]) -> Result<ABIValue, ABIError> {
    match bytes {
        [b] => Ok(ABIValue::Byte(*b)),
        _ => Err(ABIError::DecodingError {
            message: "Byte array must be 1 byte long".to_string(),
        }),
    }
}

fn encode_bool(value: &ABIValue) -> Result<Vec<u8>, ABIError> {
    match value {
        ABIValue::Bool(true) => Ok(vec![BOOL_TRUE_BYTE]),
        ABIValue::Bool(false) => Ok(vec![BOOL_FALSE_BYTE]),
        _ => Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected boolean".to_string(),
        }),
    }
}

fn decode_bool(bytes: &[u8]) -> Result<ABIValue, ABIError> {
    match bytes {
        [BOOL_TRUE_BYTE] => Ok(ABIValue::Bool(true)),
        [BOOL_FALSE_BYTE] => Ok(ABIValue::Bool(false)),
        [_] => Err(ABIError::DecodingError {
            message: "Boolean could not be decoded from the byte string".to_string(),
        }),
        _ => Err(ABIError::DecodingError {
            message: "Bool string must be 1 byte long".to_string(),
        }),
    }
}

/// Big-endian bytes of `value`, left-padded with zeros to `len`.
pub(crate) fn big_uint_to_bytes(value: &BigUint, len: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    let mut padded = vec![0u8; len - raw.len()];
    padded.extend_from_slice(&raw);
    padded
}

impl Display for ABIType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ABIType::Address => f.write_str("address"),
            ABIType::String => f.write_str("string"),
            ABIType::Byte => f.write_str("byte"),
            ABIType::Bool => f.write_str("bool"),
            ABIType::Uint(bit_size) => write!(f, "uint{}", bit_size.value()),
            ABIType::UFixed(bit_size, precision) => {
                write!(f, "ufixed{}x{}", bit_size.value(), precision.value())
            }
            ABIType::Tuple(child_types) => {
                let parts: Vec<String> = child_types.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
            ABIType::StaticArray(child_type, length) => write!(f, "{}[{}]", child_type, length),
            ABIType::DynamicArray(child_type) => write!(f, "{}[]", child_type),
        }
    }
}

impl FromStr for ABIType {
    type Err = ABIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(element) = s.strip_suffix("[]") {
            return Ok(ABIType::DynamicArray(Box::new(ABIType::from_str(element)?)));
        }
        if s.ends_with(']') {
            return parse_static_array(s);
        }
        if let Some(size_str) = s.strip_prefix("uint") {
            return parse_uint(size_str);
        }
        if s.starts_with("ufixed") {
            return parse_ufixed(s);
        }
        if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
            let child_types = parse_tuple_content(&s[1..s.len() - 1])?
                .iter()
                .map(|part| ABIType::from_str(part))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ABIType::Tuple(child_types));
        }

        match s {
            "byte" => Ok(ABIType::Byte),
            "bool" => Ok(ABIType::Bool),
            "address" => Ok(ABIType::Address),
            "string" => Ok(ABIType::String),
            _ => Err(ABIError::ValidationError {
                message: format!("Cannot convert string '{}' to an ABI type", s),
            }),
        }
    }
}

fn parse_static_array(s: &str) -> Result<ABIType, ABIError> {
    let captures = STATIC_ARRAY_REGEX
        .captures(s)
        .ok_or_else(|| ABIError::ValidationError {
            message: format!("Malformed static array string: {}", s),
        })?;

    let length = captures[2]
        .parse::<usize>()
        .map_err(|_| ABIError::ValidationError {
            message: format!("Invalid array length: {}", &captures[2]),
        })?;
    let element_type = ABIType::from_str(&captures[1])?;

    Ok(ABIType::StaticArray(Box::new(element_type), length))
}

fn parse_uint(size_str: &str) -> Result<ABIType, ABIError> {
    if size_str.is_empty() || !size_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ABIError::ValidationError {
            message: format!("Malformed uint string: {}", size_str),
        });
    }

    let size = size_str
        .parse::<u16>()
        .map_err(|_| ABIError::ValidationError {
            message: format!("Invalid uint size: {}", size_str),
        })?;
    Ok(ABIType::Uint(BitSize::new(size)?))
}

fn parse_ufixed(s: &str) -> Result<ABIType, ABIError> {
    let captures = UFIXED_REGEX
        .captures(s)
        .ok_or_else(|| ABIError::ValidationError {
            message: format!("Malformed ufixed type: {}", s),
        })?;

    let size = captures[1]
        .parse::<u16>()
        .map_err(|_| ABIError::ValidationError {
            message: format!("Invalid ufixed size: {}", &captures[1]),
        })?;
    let precision = captures[2]
        .parse::<u8>()
        .map_err(|_| ABIError::ValidationError {
            message: format!("Invalid ufixed precision: {}", &captures[2]),
        })?;

    Ok(ABIType::UFixed(BitSize::new(size)?, Precision::new(precision)?))
}

/// Splits the comma-separated body of a tuple type string, leaving nested
/// tuples intact.
pub(crate) fn parse_tuple_content(content: &str) -> Result<Vec<String>, ABIError> {
    if content.is_empty() {
        return Ok(Vec::new());
    }

    if content.starts_with(',') || content.ends_with(',') {
        return Err(ABIError::ValidationError {
            message: "Tuple string should not start or end with a comma".to_string(),
        });
    }
    if content.contains(",,") {
        return Err(ABIError::ValidationError {
            message: "Tuple string should not have consecutive commas".to_string(),
        });
    }

    let mut parts: Vec<String> = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in content.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(content[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ABIError::ValidationError {
            message: "Tuple string has mismatched parentheses".to_string(),
        });
    }
    parts.push(content[start..].to_string());

    Ok(parts)
}
