use wasm_bindgen::{JsCast as _, JsValue};

/// Failures surfaced by a [`WalletAdapter`] operation.
///
/// Expected, user-resolvable conditions (wallet not installed when signing
/// in, network mismatch) are not errors: they are reported through the
/// [`StateStore`] instead.
///
/// [`WalletAdapter`]: crate::WalletAdapter
/// [`StateStore`]: crate::StateStore
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet not installed")]
    NotInstalled,
    #[error("Wallet was not initialized")]
    NotInitialized,
    #[error("Failed to sign in")]
    SignInRefused,
    #[error("Failed to sign out")]
    SignOutFailed,
    /// The wallet reported an error while signing or sending the
    /// transaction. The message is the one reported by the wallet.
    #[error("{0}")]
    Transaction(String),
    #[error("The wallet is signed in but did not report an account id")]
    MissingAccountId,
    #[error(transparent)]
    Injected(#[from] InjectedError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A rejected call on the injected wallet object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, serde::Deserialize)]
#[error("{message}")]
pub struct InjectedError {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid RPC response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum OptionsError {
    #[error("The contract id cannot be empty")]
    EmptyContractId,
    #[error("The network id cannot be empty")]
    EmptyNetworkId,
}

impl InjectedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// decode the value a wallet promise was rejected with
    ///
    /// Wallets reject with `Error` instances, plain strings or objects
    /// carrying a `message` property. Anything else is kept in its debug
    /// representation.
    pub fn from_js(error: JsValue) -> Self {
        if let Some(error) = error.dyn_ref::<js_sys::Error>() {
            return Self::new(String::from(error.message()));
        }

        if let Some(message) = error.as_string() {
            return Self::new(message);
        }

        serde_wasm_bindgen::from_value(error.clone())
            .unwrap_or_else(|_| Self::new(format!("Unexpected wallet error: {error:?}")))
    }
}

impl From<JsValue> for InjectedError {
    fn from(error: JsValue) -> Self {
        Self::from_js(error)
    }
}

impl From<JsValue> for WalletError {
    fn from(error: JsValue) -> Self {
        Self::Injected(InjectedError::from_js(error))
    }
}
