use std::fmt::Display;

use alloy::{
    contract,
    primitives::Bytes,
    providers::PendingTransactionError,
    sol_types::{self, SolInterface},
    transports,
};

use crate::{abi::perps::PerpsMarket::PerpsMarketErrors, form::FormError};

pub type PerpsError = ProviderError<PerpsMarketErrors>;

/// EIP-1193 code of the request rejected by the user.
const USER_REJECTED_REQUEST: i64 = 4001;

/// MetaMask-specific code of the request already awaiting user action.
const RESOURCE_UNAVAILABLE: i64 = -32002;

/// EIP-3326 code of the chain not yet added to the wallet.
const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Call/transaction revert reason decoded by
/// the provided known ABI or in a generic raw form
/// if can not be decoded.
#[derive(Debug)]
pub enum RevertReason<R> {
    Known(R),
    Generic(String),
    Unknown,
}

/// Error returned by the wallet or RPC provider as a result of call or
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

    #[error("transaction reverted: {0:?}")]
    Reverted(Box<RevertReason<R>>),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction timed out")]
    Timeout,

    #[error("request rejected by the user")]
    UserRejected,

    #[error("wallet request already pending")]
    RequestPending,

    #[error("chain is not known to the wallet")]
    UnrecognizedChain,

    #[error("wallet can not switch to chain {0}")]
    ChainSwitchUnsupported(u64),

    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongChain { expected: u64, actual: u64 },

    #[error("no accounts returned by wallet")]
    NoAccounts,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("{0}")]
    InvalidForm(#[from] FormError),
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
                let msg = resp.message.to_ascii_lowercase();
                match resp.code {
                    USER_REJECTED_REQUEST => return Self::UserRejected,
                    RESOURCE_UNAVAILABLE => return Self::RequestPending,
                    UNRECOGNIZED_CHAIN => return Self::UnrecognizedChain,
                    // Some wallets wrap 4902 into an internal error
                    -32603 if msg.contains("unrecognized chain") => {
                        return Self::UnrecognizedChain;
                    }
                    _ => {}
                }
                // Heuristic to determine if eth_call failed due to OutOfGas or
                // if transaction was reverted during the gas estimation
                if (resp.code == -32603) && (msg.contains("gas") || msg.contains("oog")) {
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

impl<R: SolInterface> From<sol_types::Error> for ProviderError<R> {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
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

impl<R: SolInterface> From<Bytes> for RevertReason<R> {
    fn from(value: Bytes) -> Self {
        match R::abi_decode(&value) {
            Ok(known) => Self::Known(known),
            Err(_) => Self::Generic(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::address,
        rpc::json_rpc::ErrorPayload,
        sol_types::SolError,
        transports::{RpcError, TransportErrorKind},
    };

    use super::*;
    use crate::abi::perps::PerpsMarket;

    fn error_resp(code: i64, message: &'static str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_wallet_error_codes() {
        assert!(matches!(
            PerpsError::from(error_resp(4001, "User rejected the request.")),
            PerpsError::UserRejected
        ));
        assert!(matches!(
            PerpsError::from(error_resp(-32002, "Request already pending")),
            PerpsError::RequestPending
        ));
        assert!(matches!(
            PerpsError::from(error_resp(4902, "Unrecognized chain ID \"0x14a34\"")),
            PerpsError::UnrecognizedChain
        ));
        assert!(matches!(
            PerpsError::from(error_resp(
                -32603,
                "Unrecognized chain ID \"0x14a34\". Try adding the chain using wallet_addEthereumChain first."
            )),
            PerpsError::UnrecognizedChain
        ));
    }

    #[test]
    fn test_node_error_heuristics() {
        assert!(matches!(
            PerpsError::from(error_resp(-32603, "out of gas")),
            PerpsError::OutOfGas
        ));
        assert!(matches!(
            PerpsError::from(error_resp(-32601, "Method not found")),
            PerpsError::InvalidRequest(_)
        ));
        assert!(matches!(
            PerpsError::from(error_resp(-32000, "header not found")),
            PerpsError::Transport(_)
        ));
        assert!(matches!(
            PerpsError::from(RpcError::<TransportErrorKind>::NullResp),
            PerpsError::NullResp
        ));
    }

    #[test]
    fn test_revert_reason_from_bytes() {
        let account = address!("0x00000000000000000000000000000000000000aa");
        let data = Bytes::from(PerpsMarket::Unauthorized { account }.abi_encode());
        match RevertReason::<PerpsMarketErrors>::from(data) {
            RevertReason::Known(PerpsMarketErrors::Unauthorized(err)) => {
                assert_eq!(err.account, account)
            }
            other => panic!("unexpected revert reason: {other:?}"),
        }

        assert!(matches!(
            RevertReason::<PerpsMarketErrors>::from(Bytes::from_static(&[0xde, 0xad])),
            RevertReason::Generic(_)
        ));
    }
}
