/*!
[Sender](https://senderwallet.io) injects its wallet object as
`window.wallet` once the extension has loaded.
*/

use crate::{
    adapter::{AccountInfo, AdapterStatus, InjectedAdapter, WalletAdapter, WalletInfo},
    error::{InjectedError, WalletError},
    ffi,
    injected::{
        AccountChangedHandler, CallParams, Detector, InitConfig, InjectedWallet,
        NetworkChangedHandler, RpcInfo, RpcResponse, SignInRequest, SignInResponse,
        SignOutResponse, Subscription, TransactionResponse,
    },
    options::Options,
    provider::ProviderService,
    state::StateStore,
};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// the global the extension injects its object in
const INJECTION_KEY: &str = "wallet";

/// The Sender wallet adapter.
///
/// ```no_run
/// use near_connector::{JsonRpcProvider, Options, StateStore, WalletAdapter, wallets::Sender};
/// use std::rc::Rc;
///
/// # async fn test() -> anyhow::Result<()> {
/// let options = Options::new("guest-book.testnet", "testnet")?;
/// let provider = JsonRpcProvider::for_network(options.network_id()).unwrap();
/// let sender = Sender::new(Rc::new(provider), StateStore::default(), options);
///
/// if !sender.is_installed() {
///     println!("{} is not installed", sender.info().name);
/// }
/// # Ok(()) }
/// ```
pub struct Sender<D: Detector = SenderDetector> {
    adapter: InjectedAdapter<D>,
}

/// Finds the Sender wallet object in the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderDetector;

/// The captured Sender wallet object.
#[derive(Clone)]
pub struct SenderHandle {
    wallet: ffi::SenderWallet,
    network_handler: Rc<HandlerSlot<NetworkChangedHandler>>,
    account_handler: Rc<HandlerSlot<AccountChangedHandler>>,
}

/// The handler a change callback of the extension forwards to.
///
/// The extension has no way to remove a callback, so each callback is
/// registered once per captured wallet and subscribing swaps the handler
/// behind it. Every handler gets a new generation: unsubscribing only
/// clears the slot if it still holds that same handler.
struct HandlerSlot<H> {
    handler: RefCell<Option<(u64, H)>>,
    generation: Cell<u64>,
    registered: Cell<bool>,
}

pub fn info() -> WalletInfo {
    WalletInfo {
        id: "senderwallet".to_owned(),
        name: "Sender Wallet".to_owned(),
        description: "Sender Wallet".to_owned(),
        icon_url: "https://senderwallet.io/logo.png".to_owned(),
    }
}

impl Sender<SenderDetector> {
    pub fn new(provider: Rc<dyn ProviderService>, store: StateStore, options: Options) -> Self {
        Self::with_detector(SenderDetector, provider, store, options)
    }
}

impl<D: Detector + 'static> Sender<D> {
    pub fn with_detector(
        detector: D,
        provider: Rc<dyn ProviderService>,
        store: StateStore,
        options: Options,
    ) -> Self {
        Self {
            adapter: InjectedAdapter::new(detector, provider, store, options),
        }
    }

    pub fn status(&self) -> AdapterStatus {
        self.adapter.status()
    }
}

#[async_trait(?Send)]
impl<D: Detector + 'static> WalletAdapter for Sender<D> {
    fn info(&self) -> WalletInfo {
        info()
    }

    fn is_installed(&self) -> bool {
        self.adapter.is_installed()
    }

    async fn init(&self) -> Result<(), WalletError> {
        self.adapter.init().await
    }

    async fn sign_in(&self) -> Result<(), WalletError> {
        self.adapter.sign_in().await
    }

    async fn is_connected(&self) -> bool {
        self.adapter.is_connected().await
    }

    async fn account(&self) -> Result<Option<AccountInfo>, WalletError> {
        self.adapter.account().await
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.adapter.disconnect().await
    }

    async fn call(&self, params: CallParams) -> Result<TransactionResponse, WalletError> {
        self.adapter.call(params).await
    }
}

/// read `window.wallet` again: the extension may inject it at any time
/// after the page has loaded
fn injected() -> Option<ffi::SenderWallet> {
    let wallet = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(INJECTION_KEY)).ok()?;

    looks_like_sender_wallet(&wallet).then(|| wallet.unchecked_into())
}

fn looks_like_sender_wallet(value: &JsValue) -> bool {
    if !value.is_object() {
        return false;
    }

    let has_function_property = |prop: &str| {
        js_sys::Reflect::get(value, &JsValue::from_str(prop))
            .ok()
            .map(|v| v.is_function())
            .unwrap_or(false)
    };

    [
        "init",
        "getRpc",
        "onRpcChanged",
        "onAccountChanged",
        "isSignedIn",
        "getAccountId",
        "requestSignIn",
        "signOut",
        "signAndSendTransaction",
    ]
    .into_iter()
    .all(has_function_property)
}

#[async_trait(?Send)]
impl Detector for SenderDetector {
    type Wallet = SenderHandle;

    fn is_present(&self) -> bool {
        injected().is_some()
    }

    fn detect(&self) -> Option<SenderHandle> {
        injected().map(SenderHandle::new)
    }

    async fn sleep(&self, duration: Duration) {
        let timeout = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            ffi::sender::set_timeout(&resolve, timeout);
        });

        // a timer never rejects
        let _ = JsFuture::from(promise).await;
    }
}

impl<H: Clone + 'static> HandlerSlot<H> {
    fn new() -> Self {
        Self {
            handler: RefCell::new(None),
            generation: Cell::new(0),
            registered: Cell::new(false),
        }
    }

    /// `true` only the first time: the caller registers the JS callback
    fn register(&self) -> bool {
        !self.registered.replace(true)
    }

    fn set(self: &Rc<Self>, handler: H) -> Subscription {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        *self.handler.borrow_mut() = Some((generation, handler));

        let slot = Rc::clone(self);
        Subscription::new(move || slot.clear(generation))
    }

    fn clear(&self, generation: u64) {
        let mut handler = self.handler.borrow_mut();
        if matches!(*handler, Some((current, _)) if current == generation) {
            *handler = None;
        }
    }

    /// cloned out so the handler may subscribe again while it runs
    fn current(&self) -> Option<H> {
        self.handler.borrow().as_ref().map(|(_, handler)| handler.clone())
    }
}

impl SenderHandle {
    fn new(wallet: ffi::SenderWallet) -> Self {
        Self {
            wallet,
            network_handler: Rc::new(HandlerSlot::new()),
            account_handler: Rc::new(HandlerSlot::new()),
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, WalletError> {
    // actions are `serde_json` values, they have to become plain JS objects
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|error| {
            WalletError::from(InjectedError::new(format!(
                "Couldn't encode the wallet request: {error}"
            )))
        })
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, WalletError> {
    serde_wasm_bindgen::from_value(value).map_err(|error| {
        WalletError::from(InjectedError::new(format!(
            "Couldn't decode the wallet response: {error}"
        )))
    })
}

#[async_trait(?Send)]
impl InjectedWallet for SenderHandle {
    async fn initialize(&self, config: &InitConfig) -> Result<Value, WalletError> {
        from_js(self.wallet.init(to_js(config)?).await?)
    }

    async fn network_info(&self) -> Result<RpcInfo, WalletError> {
        let response: RpcResponse = from_js(self.wallet.get_rpc().await?)?;
        Ok(response.rpc)
    }

    fn on_network_changed(&self, handler: NetworkChangedHandler) -> Subscription {
        let subscription = self.network_handler.set(handler);

        if self.network_handler.register() {
            let slot = Rc::clone(&self.network_handler);
            let callback = Closure::<dyn FnMut(JsValue)>::new(move |response: JsValue| {
                let Some(handler) = slot.current() else {
                    return;
                };

                match serde_wasm_bindgen::from_value::<RpcResponse>(response) {
                    Ok(response) => handler(response.rpc),
                    Err(error) => {
                        tracing::warn!(%error, "Unexpected network change notification");
                    }
                }
            });

            self.wallet.on_rpc_changed(callback.as_ref().unchecked_ref());
            // the extension holds on the callback for the lifetime of the page
            callback.forget();
        }

        subscription
    }

    fn on_account_changed(&self, handler: AccountChangedHandler) -> Subscription {
        let subscription = self.account_handler.set(handler);

        if self.account_handler.register() {
            let slot = Rc::clone(&self.account_handler);
            let callback = Closure::<dyn FnMut(JsValue)>::new(move |account_id: JsValue| {
                let Some(handler) = slot.current() else {
                    return;
                };

                let Some(account_id) = account_id.as_string() else {
                    tracing::warn!(?account_id, "Unexpected account change notification");
                    return;
                };

                wasm_bindgen_futures::spawn_local(handler(account_id));
            });

            self.wallet
                .on_account_changed(callback.as_ref().unchecked_ref());
            callback.forget();
        }

        subscription
    }

    async fn is_signed_in(&self) -> Result<bool, WalletError> {
        let signed_in = self.wallet.is_signed_in()?;
        let signed_in = JsFuture::from(js_sys::Promise::resolve(&signed_in)).await?;

        signed_in.as_bool().ok_or_else(|| {
            WalletError::from(InjectedError::new(format!(
                "Unexpected sign in status: {signed_in:?}"
            )))
        })
    }

    fn account_id(&self) -> Option<String> {
        self.wallet
            .get_account_id()
            .as_string()
            .filter(|account_id| !account_id.is_empty())
    }

    async fn request_sign_in(
        &self,
        request: &SignInRequest,
    ) -> Result<SignInResponse, WalletError> {
        from_js(self.wallet.request_sign_in(to_js(request)?).await?)
    }

    async fn sign_out(&self) -> Result<SignOutResponse, WalletError> {
        from_js(self.wallet.sign_out().await?)
    }

    async fn sign_and_send_transaction(
        &self,
        params: &CallParams,
    ) -> Result<TransactionResponse, WalletError> {
        from_js(self.wallet.sign_and_send_transaction(to_js(params)?).await?)
    }
}
