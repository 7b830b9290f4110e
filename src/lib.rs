/*!

# NEAR Connector for browser injected wallets

This library is meant to be used for web applications that need to let
their users sign in and send transactions with a NEAR wallet extension
(such as [Sender](https://senderwallet.io)). Every wallet brand exposes the
same [`WalletAdapter`] lifecycle, whatever extension is behind it.

## Features

- Detect the wallet extension, tolerating late injection
- Sign in to the application's contract, sign out
- Detect the wallet is connected to the wrong network
- Follow account switches made inside the extension
- Retrieve the account balance
- Sign and send transactions

## Usage

The adapter reports the conditions the user has to resolve (extension
missing, wrong network) through a shared [`StateStore`] the UI observes:

```no_run
use near_connector::{JsonRpcProvider, Options, StateStore, WalletAdapter, wallets::Sender};
use std::rc::Rc;

# async fn test() -> anyhow::Result<()> {
let options = Options::new("guest-book.testnet", "testnet")?;
let provider = JsonRpcProvider::for_network(options.network_id()).unwrap();
let store = StateStore::default();

let sender = Sender::new(Rc::new(provider), store.clone(), options);
sender.sign_in().await?;

if store.snapshot().show_switch_network {
    println!("please switch your wallet to testnet");
}

if let Some(account) = sender.account().await? {
    println!("{} has {} yoctoNEAR", account.account_id, account.balance);
}
# Ok(()) }
```

Supporting another wallet brand means implementing [`Detector`] and
[`InjectedWallet`] for its injected object and delegating to an
[`InjectedAdapter`].

*/

mod adapter;
pub mod error;
pub mod ffi;
pub mod injected;
#[cfg(test)]
mod mock;
mod options;
pub mod provider;
pub mod state;
pub mod wallets;

pub use self::{
    adapter::{AccountInfo, AdapterStatus, InjectedAdapter, WalletAdapter, WalletInfo},
    error::WalletError,
    injected::{Action, CallParams, Detector, InjectedWallet, RpcInfo, TransactionResponse},
    options::{DEFAULT_GRACE_PERIOD, Options},
    provider::{JsonRpcProvider, ProviderService},
    state::{StateStore, UiState},
};
