use std::fmt::Display;

use alloy::{
    contract,
    providers::PendingTransactionError,
    sol_types::{self, GenericContractError, SolInterface},
    transports,
};

use crate::types::FormField;

/// EIP-1193 code returned by wallets when the user declines a request.
const USER_REJECTED_CODE: i64 = 4001;

pub type VaultError = ProviderError<GenericContractError>;

/// Call/transaction revert reason decoded by
/// the provided known ABI or in a generic raw form
/// if can not be decoded.
#[derive(Debug)]
pub enum RevertReason<R> {
    Known(R),
    Generic(String),
    Unknown,
}

/// Error returned by the RPC provider as a result of call or
/// transaction execution.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError<R> {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transaction ran out of gas")]
    OutOfGas,

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("request rejected by the user")]
    UserRejected,

    #[error("transaction reverted: {0:?}")]
    Reverted(Box<RevertReason<R>>),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction timed out")]
    Timeout,
}

/// Failure to decode a list entry against its positional schema.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed {schema} entry #{index}: {source}")]
    Malformed {
        schema: &'static str,
        index: usize,
        #[source]
        source: sol_types::Error,
    },

    #[error("{schema} entry #{index} is {actual} bytes, schema consumes {expected}")]
    Width {
        schema: &'static str,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{schema} entry #{index} is not canonically encoded")]
    NonCanonical { schema: &'static str, index: usize },
}

/// Failure to read or write the local key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage is not a valid JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error returned by wallet, contract and submission operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no wallet provider detected")]
    WalletMissing,

    #[error("wallet has no linked accounts")]
    NoAccounts,

    #[error("request rejected by the user")]
    UserRejected,

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("chain error: {0}")]
    Chain(VaultError),

    #[error("invalid {field}: {value:?}")]
    InvalidInput { field: FormField, value: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<VaultError> for Error {
    fn from(value: VaultError) -> Self {
        match value {
            ProviderError::UserRejected => Self::UserRejected,
            other => Self::Chain(other),
        }
    }
}

impl From<contract::Error> for Error {
    fn from(value: contract::Error) -> Self {
        VaultError::from(value).into()
    }
}

impl From<transports::TransportError> for Error {
    fn from(value: transports::TransportError) -> Self {
        VaultError::from(value).into()
    }
}

impl From<PendingTransactionError> for Error {
    fn from(value: PendingTransactionError) -> Self {
        VaultError::from(value).into()
    }
}

impl<R: SolInterface> From<contract::Error> for ProviderError<R> {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::UnknownFunction(_) => Self::Fatal(value.to_string()),
            contract::Error::UnknownSelector(_) => Self::Fatal(value.to_string()),
            contract::Error::NotADeploymentTransaction => Self::Fatal(value.to_string()),
            contract::Error::ContractNotDeployed => Self::Fatal(value.to_string()),
            contract::Error::ZeroData(_, _) => Self::Fatal(value.to_string()),
            contract::Error::AbiError(_) => Self::Fatal(value.to_string()),
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(err) => err.into(),
        }
    }
}

impl<R: SolInterface> From<PendingTransactionError> for ProviderError<R> {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::FailedToRegister => Self::Fatal(value.to_string()),
            PendingTransactionError::TransportError(rpc_err) => Self::from(rpc_err),
            PendingTransactionError::Recv(_) => Self::Transport(value.to_string()),
            PendingTransactionError::TxWatcher(err) => match err {
                alloy::providers::WatchTxError::Timeout => Self::Timeout,
            },
        }
    }
}

impl<E: Display, R: SolInterface> From<transports::RpcError<E>> for ProviderError<R> {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                // Heuristic to determine if eth_call failed due to OutOfGas or
                // if transaction was reverted during the gas estimation
                let msg = resp.message.to_ascii_lowercase();
                if resp.code == USER_REJECTED_CODE || msg.contains("user rejected") {
                    Self::UserRejected
                } else if msg.contains("insufficient funds") {
                    Self::InsufficientFunds(resp.message.to_string())
                } else if (resp.code == -32603) && (msg.contains("gas") || msg.contains("oog")) {
                    Self::OutOfGas
                } else if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else if resp.code == 3 && msg.contains("reverted") {
                    Self::Reverted(Box::new(RevertReason::from(value)))
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl<E: Display, R: SolInterface> From<transports::RpcError<E>> for RevertReason<R> {
    fn from(value: transports::RpcError<E>) -> Self {
        match value.as_error_resp() {
            Some(payload) => match payload.as_decoded_interface_error::<R>() {
                Some(known) => Self::Known(known),
                None => Self::Generic(value.to_string()),
            },
            None => Self::Generic(value.to_string()),
        }
    }
}
