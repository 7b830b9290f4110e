use crate::{
    error::WalletError,
    injected::{
        AccountChangedHandler, CallParams, Detector, InitConfig, InjectedWallet,
        NetworkChangedHandler, RpcInfo, SignInRequest, Subscription, TransactionResponse,
    },
    options::Options,
    provider::ProviderService,
    state::{self, StateStore},
};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Static description of a wallet brand, used to present the wallet to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_id: String,
    /// yoctoNEAR balance, as a decimal string
    pub balance: String,
}

/// Where the adapter is in its connection lifecycle.
///
/// This is informational only: whether the wallet is signed in is always
/// asked to the wallet itself (see [`WalletAdapter::is_connected`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdapterStatus {
    #[default]
    Uninitialized,
    Detecting,
    /// the wallet object was captured, no session
    Ready,
    SigningIn,
    Connected,
    Disconnecting,
}

/// The lifecycle every wallet brand exposes to the application.
#[async_trait(?Send)]
pub trait WalletAdapter {
    fn info(&self) -> WalletInfo;

    /// check the wallet extension's object is present in the page
    fn is_installed(&self) -> bool;

    /// wait for the extension to inject its object, capture it and
    /// perform the handshake
    ///
    /// Fails with [`WalletError::NotInstalled`] if the object is still
    /// missing after the grace period.
    async fn init(&self) -> Result<(), WalletError>;

    /// sign in to the application's contract
    ///
    /// A missing extension or a wallet on the wrong network are reported
    /// to the user through the [`StateStore`] and return `Ok(())`.
    async fn sign_in(&self) -> Result<(), WalletError>;

    /// `false` if the wallet was never initialized
    async fn is_connected(&self) -> bool;

    /// the signed in account and its balance, `None` if not signed in
    async fn account(&self) -> Result<Option<AccountInfo>, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// sign and send a transaction, returning the wallet's raw response
    async fn call(&self, params: CallParams) -> Result<TransactionResponse, WalletError>;
}

/// The connection lifecycle shared by every injected wallet brand.
///
/// Brand adapters own one of these and delegate to it. Cloning gives
/// another handle on the same adapter.
///
/// Operations take `&self` and may interleave: a change notification from
/// the wallet may re-enter the adapter while a `sign_in` is in flight. No
/// borrow of the adapter's state is held across a wallet call.
pub struct InjectedAdapter<D: Detector> {
    shared: Rc<Shared<D>>,
}

struct Shared<D: Detector> {
    detector: D,
    provider: Rc<dyn ProviderService>,
    store: StateStore,
    options: Options,
    wallet: RefCell<Option<Rc<D::Wallet>>>,
    subscriptions: RefCell<Vec<Subscription>>,
    status: Cell<AdapterStatus>,
}

impl<D: Detector> Clone for InjectedAdapter<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<D: Detector> fmt::Debug for InjectedAdapter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedAdapter")
            .field("options", &self.shared.options)
            .field("status", &self.shared.status.get())
            .field("captured", &self.shared.wallet.borrow().is_some())
            .finish()
    }
}

impl<D: Detector + 'static> InjectedAdapter<D> {
    pub fn new(
        detector: D,
        provider: Rc<dyn ProviderService>,
        store: StateStore,
        options: Options,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                detector,
                provider,
                store,
                options,
                wallet: RefCell::new(None),
                subscriptions: RefCell::new(Vec::new()),
                status: Cell::new(AdapterStatus::Uninitialized),
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    pub fn store(&self) -> &StateStore {
        &self.shared.store
    }

    pub fn status(&self) -> AdapterStatus {
        self.shared.status.get()
    }

    fn set_status(&self, status: AdapterStatus) {
        let previous = self.shared.status.replace(status);
        if previous != status {
            tracing::trace!(?previous, ?status, "adapter status");
        }
    }

    fn wallet(&self) -> Option<Rc<D::Wallet>> {
        self.shared.wallet.borrow().clone()
    }

    pub fn is_installed(&self) -> bool {
        self.shared.detector.is_present()
    }

    pub async fn init(&self) -> Result<(), WalletError> {
        let previous = self.status();
        self.set_status(AdapterStatus::Detecting);

        self.shared
            .detector
            .sleep(self.shared.options.grace_period())
            .await;

        let Some(wallet) = self.shared.detector.detect() else {
            self.set_status(if self.wallet().is_some() {
                AdapterStatus::Ready
            } else {
                AdapterStatus::Uninitialized
            });
            return Err(WalletError::NotInstalled);
        };

        let wallet = Rc::new(wallet);
        *self.shared.wallet.borrow_mut() = Some(Rc::clone(&wallet));
        self.subscribe(wallet.as_ref());

        let config = InitConfig {
            contract_id: self.shared.options.contract_id().to_owned(),
        };
        let result = wallet.initialize(&config).await;

        self.set_status(if previous == AdapterStatus::Connected {
            AdapterStatus::Connected
        } else {
            AdapterStatus::Ready
        });

        let response = result?;
        tracing::debug!(%response, "wallet initialized");

        Ok(())
    }

    /// register the change handlers, replacing the previous registrations
    fn subscribe(&self, wallet: &D::Wallet) {
        let adapter = Rc::downgrade(&self.shared);
        let on_account: AccountChangedHandler =
            Rc::new(move |account_id: String| -> LocalBoxFuture<'static, ()> {
                let adapter = adapter.clone();
                Box::pin(async move {
                    if let Some(shared) = adapter.upgrade() {
                        InjectedAdapter { shared }.account_changed(account_id).await;
                    }
                })
            });

        let adapter = Rc::downgrade(&self.shared);
        let on_network: NetworkChangedHandler = Rc::new(move |rpc: RpcInfo| {
            if let Some(shared) = adapter.upgrade() {
                InjectedAdapter { shared }.network_matches(&rpc);
            }
        });

        let subscriptions = vec![
            wallet.on_account_changed(on_account),
            wallet.on_network_changed(on_network),
        ];

        drop(self.shared.subscriptions.replace(subscriptions));
    }

    fn ensure_subscribed(&self, wallet: &D::Wallet) {
        if self.shared.subscriptions.borrow().is_empty() {
            self.subscribe(wallet);
        }
    }

    /// check the wallet is on the configured network
    ///
    /// On mismatch, the user is asked to switch network.
    pub fn network_matches(&self, rpc: &RpcInfo) -> bool {
        let expected = self.shared.options.network_id();

        if rpc.network_id == expected {
            return true;
        }

        tracing::info!(
            expected,
            actual = %rpc.network_id,
            "wallet is connected to another network"
        );
        self.shared.store.update(state::switch_network_prompt);

        false
    }

    pub async fn sign_in(&self) -> Result<(), WalletError> {
        if !self.is_installed() {
            self.shared.store.update(state::not_installed_prompt);
            return Ok(());
        }

        let wallet = match self.wallet() {
            Some(wallet) => wallet,
            None => {
                self.init().await?;
                self.wallet().ok_or(WalletError::NotInitialized)?
            }
        };
        self.ensure_subscribed(wallet.as_ref());

        let previous = self.status();
        self.set_status(AdapterStatus::SigningIn);
        let result = self.request_sign_in(wallet.as_ref()).await;
        self.set_status(match result {
            Ok(true) => AdapterStatus::Connected,
            // an aborted sign in leaves an existing session untouched
            Ok(false) | Err(_) if previous == AdapterStatus::Connected => {
                AdapterStatus::Connected
            }
            Ok(false) | Err(_) => AdapterStatus::Ready,
        });

        result.map(|_| ())
    }

    /// returns `false` if the sign in was aborted because of a network
    /// mismatch
    async fn request_sign_in(&self, wallet: &D::Wallet) -> Result<bool, WalletError> {
        let rpc = wallet.network_info().await?;

        if !self.network_matches(&rpc) {
            return Ok(false);
        }

        let request = SignInRequest {
            contract_id: self.shared.options.contract_id().to_owned(),
        };
        let response = wallet.request_sign_in(&request).await?;

        if !response.is_granted() {
            return Err(WalletError::SignInRefused);
        }

        Ok(true)
    }

    pub async fn is_connected(&self) -> bool {
        let Some(wallet) = self.wallet() else {
            return false;
        };

        match wallet.is_signed_in().await {
            Ok(signed_in) => signed_in,
            Err(error) => {
                tracing::warn!(%error, "Failed to query the wallet's sign in status");
                false
            }
        }
    }

    /// the signed in account and its balance, `None` whenever
    /// [`is_connected`](Self::is_connected) is `false`
    pub async fn account(&self) -> Result<Option<AccountInfo>, WalletError> {
        if !self.is_connected().await {
            return Ok(None);
        }
        let wallet = self.wallet().ok_or(WalletError::NotInitialized)?;

        let account_id = wallet
            .account_id()
            .filter(|account_id| !account_id.is_empty())
            .ok_or(WalletError::MissingAccountId)?;
        let account = self.shared.provider.view_account(&account_id).await?;

        Ok(Some(AccountInfo {
            account_id,
            balance: account.amount,
        }))
    }

    /// sign out of the wallet
    ///
    /// The captured wallet object is kept for the next `sign_in`, the
    /// change handlers are dropped until then. While disconnected the
    /// network guard is off: switching the wallet's network raises no
    /// prompt until the next `sign_in` checks it again.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let wallet = self.wallet().ok_or(WalletError::NotInitialized)?;

        let previous = self.status();
        self.set_status(AdapterStatus::Disconnecting);

        let response = match wallet.sign_out().await {
            Ok(response) => response,
            Err(error) => {
                self.set_status(previous);
                return Err(error);
            }
        };

        if !response.is_success() {
            self.set_status(previous);
            return Err(WalletError::SignOutFailed);
        }

        drop(self.shared.subscriptions.take());
        self.set_status(AdapterStatus::Ready);

        Ok(())
    }

    pub async fn call(&self, params: CallParams) -> Result<TransactionResponse, WalletError> {
        let wallet = self.wallet().ok_or(WalletError::NotInitialized)?;

        tracing::debug!(
            receiver_id = %params.receiver_id,
            actions = params.actions.len(),
            "sign and send transaction"
        );

        let response = wallet.sign_and_send_transaction(&params).await?;

        if let Some(message) = response.error_message() {
            return Err(WalletError::Transaction(message));
        }

        Ok(response)
    }

    /// the user switched account inside the extension: start a new session
    ///
    /// Runs outside of the application's control flow, failures are only
    /// logged.
    async fn account_changed(&self, account_id: String) {
        tracing::info!(%account_id, "wallet account changed");

        if let Err(error) = self.reconnect().await {
            tracing::warn!(%error, "Failed to change account");
        }
    }

    async fn reconnect(&self) -> Result<(), WalletError> {
        self.disconnect().await?;
        self.sign_in().await
    }
}
