//! In-memory injected wallet, detector and provider for the tests.

use crate::{
    error::{InjectedError, ProviderError, WalletError},
    injected::{
        AccountChangedHandler, CallParams, Detector, InitConfig, InjectedWallet,
        NetworkChangedHandler, RpcInfo, SignInRequest, SignInResponse, SignOutResponse,
        Subscription, TransactionResponse,
    },
    provider::{AccountView, ProviderService},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

type Handlers<H> = RefCell<Vec<(Rc<Cell<bool>>, H)>>;

pub(crate) struct MockState {
    pub calls: RefCell<Vec<&'static str>>,
    pub network_id: RefCell<String>,
    pub signed_in: Cell<bool>,
    pub account_id: RefCell<Option<String>>,
    pub access_key: RefCell<Option<Value>>,
    pub sign_out_result: RefCell<String>,
    pub transaction: RefCell<Value>,
    pub signed_in_error: RefCell<Option<String>>,
    account_handlers: Handlers<AccountChangedHandler>,
    network_handlers: Handlers<NetworkChangedHandler>,
}

#[derive(Clone)]
pub(crate) struct MockWallet {
    pub state: Rc<MockState>,
}

#[derive(Clone)]
pub(crate) struct MockDetector {
    pub wallet: MockWallet,
    pub present: Rc<Cell<bool>>,
    pub sleeps: Rc<RefCell<Vec<Duration>>>,
}

pub(crate) struct MockProvider {
    pub amount: String,
    pub queries: RefCell<Vec<String>>,
    /// `(code, message)` of the RPC error to answer with
    pub failure: RefCell<Option<(i64, String)>>,
}

impl MockState {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    pub fn active_account_handlers(&self) -> usize {
        Self::active(&self.account_handlers).len()
    }

    pub fn active_network_handlers(&self) -> usize {
        Self::active(&self.network_handlers).len()
    }

    fn active<H: Clone>(handlers: &Handlers<H>) -> Vec<H> {
        handlers
            .borrow()
            .iter()
            .filter(|(active, _)| active.get())
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    fn register<H>(handlers: &Handlers<H>, handler: H) -> Subscription {
        let active = Rc::new(Cell::new(true));
        handlers.borrow_mut().push((active.clone(), handler));
        Subscription::new(move || active.set(false))
    }
}

impl MockWallet {
    pub fn new(network_id: &str) -> Self {
        Self {
            state: Rc::new(MockState {
                calls: RefCell::new(Vec::new()),
                network_id: RefCell::new(network_id.to_owned()),
                signed_in: Cell::new(false),
                account_id: RefCell::new(Some("alice.testnet".to_owned())),
                access_key: RefCell::new(Some(json!("x"))),
                sign_out_result: RefCell::new(SignOutResponse::SUCCESS.to_owned()),
                transaction: RefCell::new(json! { {
                    "method": "signAndSendTransaction",
                    "response": [{ "transaction": { "hash": "8d6dAgjBvwfLqMTvN4ZKX6LnFyNJ1Vy8wDSfMznGr1BZ" } }],
                }}),
                signed_in_error: RefCell::new(None),
                account_handlers: RefCell::new(Vec::new()),
                network_handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// the user switched account in the extension
    pub async fn switch_account(&self, account_id: &str) {
        *self.state.account_id.borrow_mut() = Some(account_id.to_owned());
        for handler in MockState::active(&self.state.account_handlers) {
            handler(account_id.to_owned()).await;
        }
    }

    /// the user switched network in the extension
    pub fn switch_network(&self, network_id: &str) {
        *self.state.network_id.borrow_mut() = network_id.to_owned();
        for handler in MockState::active(&self.state.network_handlers) {
            handler(RpcInfo {
                network_id: network_id.to_owned(),
                node_url: None,
            });
        }
    }
}

#[async_trait(?Send)]
impl InjectedWallet for MockWallet {
    async fn initialize(&self, config: &InitConfig) -> Result<Value, WalletError> {
        self.state.record("init");
        tokio::task::yield_now().await;
        Ok(json! { { "accessKey": null, "contractId": config.contract_id.clone() } })
    }

    async fn network_info(&self) -> Result<RpcInfo, WalletError> {
        self.state.record("get_rpc");
        tokio::task::yield_now().await;
        Ok(RpcInfo {
            network_id: self.state.network_id.borrow().clone(),
            node_url: None,
        })
    }

    fn on_network_changed(&self, handler: NetworkChangedHandler) -> Subscription {
        MockState::register(&self.state.network_handlers, handler)
    }

    fn on_account_changed(&self, handler: AccountChangedHandler) -> Subscription {
        MockState::register(&self.state.account_handlers, handler)
    }

    async fn is_signed_in(&self) -> Result<bool, WalletError> {
        self.state.record("is_signed_in");
        if let Some(message) = self.state.signed_in_error.borrow().clone() {
            return Err(InjectedError::new(message).into());
        }
        Ok(self.state.signed_in.get())
    }

    fn account_id(&self) -> Option<String> {
        self.state.account_id.borrow().clone()
    }

    async fn request_sign_in(
        &self,
        _request: &SignInRequest,
    ) -> Result<SignInResponse, WalletError> {
        self.state.record("request_sign_in");
        tokio::task::yield_now().await;
        let response = SignInResponse {
            access_key: self.state.access_key.borrow().clone(),
        };
        if response.is_granted() {
            self.state.signed_in.set(true);
        }
        Ok(response)
    }

    async fn sign_out(&self) -> Result<SignOutResponse, WalletError> {
        self.state.record("sign_out");
        tokio::task::yield_now().await;
        let response = SignOutResponse {
            result: self.state.sign_out_result.borrow().clone(),
        };
        if response.is_success() {
            self.state.signed_in.set(false);
        }
        Ok(response)
    }

    async fn sign_and_send_transaction(
        &self,
        _params: &CallParams,
    ) -> Result<TransactionResponse, WalletError> {
        self.state.record("sign_and_send_transaction");
        Ok(serde_json::from_value(self.state.transaction.borrow().clone())
            .map_err(|error| InjectedError::new(error.to_string()))?)
    }
}

impl MockDetector {
    pub fn installed(network_id: &str) -> Self {
        Self {
            wallet: MockWallet::new(network_id),
            present: Rc::new(Cell::new(true)),
            sleeps: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn missing() -> Self {
        let detector = Self::installed("testnet");
        detector.present.set(false);
        detector
    }
}

#[async_trait(?Send)]
impl Detector for MockDetector {
    type Wallet = MockWallet;

    fn is_present(&self) -> bool {
        self.present.get()
    }

    fn detect(&self) -> Option<MockWallet> {
        self.present.get().then(|| self.wallet.clone())
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        tokio::task::yield_now().await;
    }
}

impl MockProvider {
    pub fn new(amount: &str) -> Self {
        Self {
            amount: amount.to_owned(),
            queries: RefCell::new(Vec::new()),
            failure: RefCell::new(None),
        }
    }
}

#[async_trait(?Send)]
impl ProviderService for MockProvider {
    async fn view_account(&self, account_id: &str) -> Result<AccountView, ProviderError> {
        self.queries.borrow_mut().push(account_id.to_owned());
        tokio::task::yield_now().await;
        if let Some((code, message)) = self.failure.borrow().clone() {
            return Err(ProviderError::Rpc { code, message });
        }
        Ok(AccountView {
            amount: self.amount.clone(),
            locked: "0".to_owned(),
            code_hash: "11111111111111111111111111111111".to_owned(),
            storage_usage: 182,
            block_height: 17795474,
            block_hash: "9MjpcnwW3TSdzGweNfPbkx8M74q1XzUcT1PAN8G5bNDz".to_owned(),
        })
    }
}
