/*!
The capability contract every browser-injected wallet object has to
satisfy so the adapter lifecycle can be written once.

The injected object is untrusted and loaded asynchronously by the wallet
extension: every call may take arbitrarily long, and the change
notifications may fire at any time, including while another operation is
in flight.
*/

use crate::error::WalletError;
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, rc::Rc, time::Duration};

/// Called with the new account id when the user switches account inside
/// the wallet extension. The returned future is driven by the injected side.
pub type AccountChangedHandler = Rc<dyn Fn(String) -> LocalBoxFuture<'static, ()>>;

/// Called when the user switches the network of the wallet extension.
pub type NetworkChangedHandler = Rc<dyn Fn(RpcInfo)>;

/// Finds the injected wallet object of a given brand.
#[async_trait(?Send)]
pub trait Detector {
    type Wallet: InjectedWallet + 'static;

    /// check the wallet object is currently present. Must not have side
    /// effects.
    fn is_present(&self) -> bool;

    /// capture the wallet object, if present
    fn detect(&self) -> Option<Self::Wallet>;

    /// wait for `duration` using the host's timers
    async fn sleep(&self, duration: Duration);
}

/// The operations of an injected wallet object.
#[async_trait(?Send)]
pub trait InjectedWallet {
    /// handshake with the wallet for the given contract
    async fn initialize(&self, config: &InitConfig) -> Result<Value, WalletError>;

    /// the network the wallet is currently connected to
    async fn network_info(&self) -> Result<RpcInfo, WalletError>;

    fn on_network_changed(&self, handler: NetworkChangedHandler) -> Subscription;

    fn on_account_changed(&self, handler: AccountChangedHandler) -> Subscription;

    async fn is_signed_in(&self) -> Result<bool, WalletError>;

    /// the currently selected account, if any
    fn account_id(&self) -> Option<String>;

    async fn request_sign_in(&self, request: &SignInRequest)
    -> Result<SignInResponse, WalletError>;

    async fn sign_out(&self) -> Result<SignOutResponse, WalletError>;

    async fn sign_and_send_transaction(
        &self,
        params: &CallParams,
    ) -> Result<TransactionResponse, WalletError>;
}

/// Registration of a change handler.
///
/// The handler stops being called once the subscription is unsubscribed
/// or dropped.
#[must_use = "dropping a subscription unsubscribes the handler"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfig {
    pub contract_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcInfo {
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_url: Option<String>,
}

/// The envelope the network information comes in, both from the explicit
/// query and from the change notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcResponse {
    pub rpc: RpcInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub contract_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    #[serde(default)]
    pub access_key: Option<Value>,
}

impl SignInResponse {
    /// an access key was granted. An absent, null or empty access key
    /// means the user refused or the wallet failed.
    pub fn is_granted(&self) -> bool {
        match &self.access_key {
            None | Some(Value::Null) => false,
            Some(Value::String(key)) => !key.is_empty(),
            Some(Value::Object(key)) => !key.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
pub struct SignOutResponse {
    #[serde(default)]
    pub result: String,
}

impl SignOutResponse {
    pub const SUCCESS: &'static str = "success";

    pub fn is_success(&self) -> bool {
        self.result == Self::SUCCESS
    }
}

/// The raw outcome of a transaction, for the caller to interpret.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TransactionResponse {
    /// the error reported by the wallet, if any
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(message) if message.is_empty() => None,
            Value::String(message) => Some(message.clone()),
            Value::Object(error) => match error.get("message") {
                Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
                _ => Some(Value::Object(error.clone()).to_string()),
            },
            error => Some(error.to_string()),
        }
    }
}

/// A transaction to sign and send. The actions are passed to the wallet
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParams {
    pub receiver_id: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(pub Value);
