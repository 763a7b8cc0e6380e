//! Error types for the transaction primitives.

use snafu::Snafu;

/// Represents errors that can occur while creating, manipulating, encoding
/// or decoding Algorand transactions.
#[derive(Debug, Snafu)]
pub enum TransactError {
    #[snafu(display("Error occurred during encoding: {source}"))]
    EncodingError { source: rmp_serde::encode::Error },

    #[snafu(display("Error occurred during decoding: {source}"))]
    DecodingError { source: rmp_serde::decode::Error },

    #[snafu(display("Error occurred during msgpack encoding: {source}"))]
    MsgpackEncodingError { source: rmpv::encode::Error },

    #[snafu(display("{message}"))]
    InputError { message: String },

    #[snafu(display("{message}"))]
    InvalidAddress { message: String },
}

impl From<rmp_serde::encode::Error> for TransactError {
    fn from(source: rmp_serde::encode::Error) -> Self {
        TransactError::EncodingError { source }
    }
}

impl From<rmp_serde::decode::Error> for TransactError {
    fn from(source: rmp_serde::decode::Error) -> Self {
        TransactError::DecodingError { source }
    }
}

impl From<rmpv::encode::Error> for TransactError {
    fn from(source: rmpv::encode::Error) -> Self {
        TransactError::MsgpackEncodingError { source }
    }
}
