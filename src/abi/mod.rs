//! Encoding and decoding of Algorand ABI (ARC-4) types, methods and return
//! values.

mod abi_type;
mod abi_value;
mod method;
mod tuple;

pub use abi_type::{ABIType, BitSize, Precision};
pub use abi_value::ABIValue;
pub use method::{
    ABIMethod, ABIMethodArg, ABIMethodArgType, ABIReferenceType, ABIReferenceValue, ABIReturn,
    ABITransactionType,
};

use snafu::Snafu;

/// The 4-byte prefix logged by an application ahead of its ABI-encoded
/// return value: sha512_256("return")[..4].
pub const ABI_RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// If a method has more value arguments than this, the spillover is packed
/// into a single trailing tuple argument.
pub const MAX_APP_CALL_ARGS: usize = 15;

pub(crate) const LENGTH_ENCODE_BYTE_SIZE: usize = 2;
pub(crate) const BOOL_TRUE_BYTE: u8 = 0x80;
pub(crate) const BOOL_FALSE_BYTE: u8 = 0x00;
pub(crate) const BITS_PER_BYTE: u8 = 8;
pub(crate) const MAX_BIT_SIZE: u16 = 512;
pub(crate) const MAX_PRECISION: u8 = 160;

/// Represents an error that can occur during ABI operations.
#[derive(Debug, Snafu)]
pub enum ABIError {
    /// An error that occurs during ABI type validation.
    #[snafu(display("ABI validation failed: {message}"))]
    ValidationError { message: String },

    /// An error that occurs during ABI encoding.
    #[snafu(display("ABI encoding failed: {message}"))]
    EncodingError { message: String },

    /// An error that occurs during ABI decoding.
    #[snafu(display("ABI decoding failed: {message}"))]
    DecodingError { message: String },
}
