//! ABI method signatures, selectors and return values.

use crate::abi::abi_type::parse_tuple_content;
use crate::abi::{ABIError, ABIType, ABIValue};
use crate::transact::hash;
use std::fmt::Display;
use std::str::FromStr;

const VOID_RETURN_TYPE: &str = "void";

/// Generates the `FromStr`/`Display` pair for an enum whose variants map
/// one-to-one onto signature tokens.
macro_rules! signature_tokens {
    ($enum:ident, $kind:literal, { $($token:literal => $variant:ident,)* }) => {
        impl FromStr for $enum {
            type Err = ABIError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($enum::$variant),)*
                    _ => Err(ABIError::ValidationError {
                        message: format!(concat!("Invalid ", $kind, ": {}"), s),
                    }),
                }
            }
        }

        impl Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $($enum::$variant => $token,)*
                })
            }
        }
    };
}

/// A transaction kind usable as an ABI method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ABITransactionType {
    /// Any transaction type.
    Txn,
    Payment,
    KeyRegistration,
    AssetConfig,
    AssetTransfer,
    AssetFreeze,
    ApplicationCall,
}

signature_tokens!(ABITransactionType, "transaction type", {
    "txn" => Txn,
    "pay" => Payment,
    "keyreg" => KeyRegistration,
    "acfg" => AssetConfig,
    "axfer" => AssetTransfer,
    "afrz" => AssetFreeze,
    "appl" => ApplicationCall,
});

/// A reference kind usable as an ABI method argument. References encode as
/// indexes into the app call's reference arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ABIReferenceType {
    Account,
    Application,
    Asset,
}

signature_tokens!(ABIReferenceType, "reference type", {
    "account" => Account,
    "application" => Application,
    "asset" => Asset,
});

/// The concrete value supplied for a reference-typed method argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ABIReferenceValue {
    /// An account, by its encoded address.
    Account(String),
    /// An asset, by id.
    Asset(u64),
    /// An application, by id.
    Application(u64),
}

/// The category of an ABI method argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ABIMethodArgType {
    /// A value encoded directly into the application arguments.
    Value(ABIType),
    /// A transaction placed immediately before the app call in the group.
    Transaction(ABITransactionType),
    /// An account, asset or app encoded as a reference array index.
    Reference(ABIReferenceType),
}

impl ABIMethodArgType {
    pub(crate) fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    pub(crate) fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl FromStr for ABIMethodArgType {
    type Err = ABIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Transaction and reference tokens shadow no ABI type names, so the
        // three parsers can be tried in any order
        ABITransactionType::from_str(s)
            .map(ABIMethodArgType::Transaction)
            .or_else(|_| ABIReferenceType::from_str(s).map(ABIMethodArgType::Reference))
            .or_else(|_| ABIType::from_str(s).map(ABIMethodArgType::Value))
    }
}

/// A parsed ABI method: its name, arguments and return type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ABIMethod {
    pub name: String,
    pub args: Vec<ABIMethodArg>,
    /// `None` for void methods.
    pub returns: Option<ABIType>,
    pub description: Option<String>,
}

/// A single argument of an ABI method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ABIMethodArg {
    pub arg_type: ABIMethodArgType,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ABIMethodArg {
    pub fn new(
        arg_type: ABIMethodArgType,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        ABIMethodArg {
            arg_type,
            name,
            description,
        }
    }
}

impl ABIMethod {
    pub fn new(
        name: String,
        args: Vec<ABIMethodArg>,
        returns: Option<ABIType>,
        description: Option<String>,
    ) -> Self {
        ABIMethod {
            name,
            args,
            returns,
            description,
        }
    }

    fn count_args(&self, kind: fn(&ABIMethodArgType) -> bool) -> usize {
        self.args.iter().filter(|arg| kind(&arg.arg_type)).count()
    }

    /// How many of the method's arguments are transaction-typed.
    pub fn transaction_arg_count(&self) -> usize {
        self.count_args(ABIMethodArgType::is_transaction)
    }

    /// How many of the method's arguments are reference-typed.
    pub fn reference_arg_count(&self) -> usize {
        self.count_args(ABIMethodArgType::is_reference)
    }

    /// The method selector: the first 4 bytes of the SHA-512/256 hash of
    /// the signature.
    pub fn selector(&self) -> Result<Vec<u8>, ABIError> {
        let signature = self.signature()?;
        Ok(hash(signature.as_bytes())[..4].to_vec())
    }

    /// The canonical `name(args)return` signature string.
    pub fn signature(&self) -> Result<String, ABIError> {
        if self.name.is_empty() {
            return Err(ABIError::ValidationError {
                message: "Method name cannot be empty".to_string(),
            });
        }

        let mut arg_types = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            arg_types.push(match &arg.arg_type {
                ABIMethodArgType::Value(abi_type) => abi_type.to_string(),
                ABIMethodArgType::Transaction(tx_type) => tx_type.to_string(),
                ABIMethodArgType::Reference(ref_type) => ref_type.to_string(),
            });
        }

        let return_type = match &self.returns {
            Some(abi_type) => abi_type.to_string(),
            None => VOID_RETURN_TYPE.to_string(),
        };

        let signature = format!("{}({}){}", self.name, arg_types.join(","), return_type);
        if signature.chars().any(char::is_whitespace) {
            return Err(ABIError::ValidationError {
                message: "Generated signature contains whitespace".to_string(),
            });
        }

        Ok(signature)
    }
}

impl FromStr for ABIMethod {
    type Err = ABIError;

    fn from_str(signature: &str) -> Result<Self, Self::Err> {
        if signature.chars().any(char::is_whitespace) {
            return Err(ABIError::ValidationError {
                message: "Method signature cannot contain whitespace".to_string(),
            });
        }

        let (name, args_str, return_str) = split_signature(signature)?;

        let mut args = Vec::new();
        if !args_str.is_empty() {
            for (i, token) in split_arguments_by_comma(args_str)?.iter().enumerate() {
                let arg_type = ABIMethodArgType::from_str(token)?;
                args.push(ABIMethodArg::new(arg_type, Some(format!("arg{}", i)), None));
            }
        }

        let returns = match return_str {
            VOID_RETURN_TYPE => None,
            other => Some(ABIType::from_str(other)?),
        };

        Ok(ABIMethod::new(name.to_string(), args, returns, None))
    }
}

/// An ABI method return value, raw and parsed.
#[derive(Debug, Clone)]
pub struct ABIReturn {
    /// The method the value came back from.
    pub method: ABIMethod,
    /// The return bytes as logged, without the return prefix.
    pub raw_return_value: Vec<u8>,
    /// The decoded value; `None` for void methods.
    pub return_value: Option<ABIValue>,
}

/// Splits `name(args)return` into its three parts. An absent return type
/// reads as void.
fn split_signature(signature: &str) -> Result<(&str, &str, &str), ABIError> {
    let open = signature
        .find('(')
        .ok_or_else(|| ABIError::ValidationError {
            message: "Method signature must contain opening parenthesis".to_string(),
        })?;
    if open == 0 {
        return Err(ABIError::ValidationError {
            message: "Method name cannot be empty".to_string(),
        });
    }

    // The argument list may itself contain parenthesized tuple types, so
    // scan for the parenthesis that balances the opening one
    let mut depth = 0usize;
    let mut close = None;
    for (i, ch) in signature.char_indices().skip(open) {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(|| ABIError::ValidationError {
        message: "Mismatched parentheses in method signature".to_string(),
    })?;

    let return_str = match &signature[close + 1..] {
        "" => VOID_RETURN_TYPE,
        rest => rest,
    };

    Ok((&signature[..open], &signature[open + 1..close], return_str))
}

fn split_arguments_by_comma(args_str: &str) -> Result<Vec<String>, ABIError> {
    let arguments = parse_tuple_content(args_str)?;

    for arg in &arguments {
        if arg.trim().is_empty() {
            return Err(ABIError::ValidationError {
                message: "Empty argument in method signature".to_string(),
            });
        }
    }

    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("txn", ABITransactionType::Txn)]
    #[case("pay", ABITransactionType::Payment)]
    #[case("keyreg", ABITransactionType::KeyRegistration)]
    #[case("acfg", ABITransactionType::AssetConfig)]
    #[case("axfer", ABITransactionType::AssetTransfer)]
    #[case("afrz", ABITransactionType::AssetFreeze)]
    #[case("appl", ABITransactionType::ApplicationCall)]
    fn transaction_type_from_str(#[case] input: &str, #[case] expected: ABITransactionType) {
        assert_eq!(ABITransactionType::from_str(input).unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("account", ABIReferenceType::Account)]
    #[case("application", ABIReferenceType::Application)]
    #[case("asset", ABIReferenceType::Asset)]
    fn reference_type_from_str(#[case] input: &str, #[case] expected: ABIReferenceType) {
        assert_eq!(ABIReferenceType::from_str(input).unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("add(uint64,uint64)uint64", "add", Some("uint64"), 2)]
    #[case("getName()string", "getName", Some("string"), 0)]
    #[case("doSomething(uint64)", "doSomething", None, 1)]
    #[case("transfer(address,uint64,pay)bool", "transfer", Some("bool"), 3)]
    fn method_from_str_valid(
        #[case] signature: &str,
        #[case] expected_name: &str,
        #[case] expected_return: Option<&str>,
        #[case] expected_arg_count: usize,
    ) {
        let method = ABIMethod::from_str(signature).unwrap();
        assert_eq!(method.name, expected_name);
        assert_eq!(method.args.len(), expected_arg_count);

        if let Some(return_str) = expected_return {
            let expected_abi_type = ABIType::from_str(return_str).unwrap();
            assert_eq!(method.returns, Some(expected_abi_type));
        } else {
            assert_eq!(method.returns, None);
        }
    }

    #[rstest]
    #[case("add(uint64, uint64)uint64")] // whitespace
    #[case("(uint64)uint64")] // empty name
    #[case("method")] // no parenthesis
    fn method_from_str_invalid(#[case] signature: &str) {
        assert!(ABIMethod::from_str(signature).is_err());
    }

    // Selector verification against known ARC-4 vectors.
    #[rstest]
    #[case("add(uint64,uint64)uint64", "fe6bdf69")]
    #[case("optIn()void", "29314d95")]
    #[case("deposit(pay,uint64)void", "f2355b55")]
    #[case("bootstrap(pay,pay,application)void", "895c2a3b")]
    fn method_selector(#[case] signature: &str, #[case] expected_hex: &str) {
        let method = ABIMethod::from_str(signature).unwrap();
        let selector = method.selector().unwrap();
        assert_eq!(hex::encode(&selector), expected_hex);
        assert_eq!(selector.len(), 4);
    }

    #[rstest]
    #[case("add(uint64,uint64)uint64")]
    #[case("optIn()void")]
    #[case("bootstrap(pay,pay,application)void")]
    fn signature_round_trip(#[case] signature: &str) {
        let method = ABIMethod::from_str(signature).unwrap();
        assert_eq!(method.signature().unwrap(), signature);
    }

    #[test]
    fn transaction_and_reference_arg_counts() {
        let method = ABIMethod::from_str("bootstrap(pay,axfer,application,uint64)void").unwrap();
        assert_eq!(method.transaction_arg_count(), 2);
        assert_eq!(method.reference_arg_count(), 1);
    }

    #[test]
    fn empty_method_name_error() {
        let method = ABIMethod::new("".to_string(), vec![], None, None);
        assert!(method.signature().is_err());
    }

    #[test]
    fn tuple_argument_is_a_single_arg() {
        let method = ABIMethod::from_str("store((uint64,bool),string)void").unwrap();
        assert_eq!(method.args.len(), 2);
    }
}
