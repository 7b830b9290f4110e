use std::sync::Arc;
use tokio::sync::watch;

/// The connection related flags the UI renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub show_modal: bool,
    pub show_wallet_options: bool,
    pub show_switch_network: bool,
    pub show_wallet_not_installed: bool,
}

/// Shared, observable [`UiState`].
///
/// The state is only ever replaced as a whole with the result of a pure
/// function of the previous state. Updates are serialised by the channel's
/// writer so two handlers updating concurrently never lose each other's
/// changes, and readers always see a committed state.
///
/// Cloning the store gives another handle on the same state.
#[derive(Debug, Clone)]
pub struct StateStore {
    sender: Arc<watch::Sender<UiState>>,
}

impl StateStore {
    pub fn new(initial: UiState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// replace the state with `f(previous)`
    ///
    /// `f` runs while the store is locked: it must not have side effects
    /// and must not access the store itself.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&UiState) -> UiState,
    {
        self.sender.send_modify(|state| {
            let next = f(state);
            *state = next;
        });
    }

    /// the last committed state
    pub fn snapshot(&self) -> UiState {
        *self.sender.borrow()
    }

    /// observe the state, the receiver is notified on every update
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.sender.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(UiState::default())
    }
}

/// ask the user to switch the wallet to the expected network
pub fn switch_network_prompt(state: &UiState) -> UiState {
    UiState {
        show_wallet_options: false,
        show_switch_network: true,
        ..*state
    }
}

/// tell the user the wallet extension is not installed
pub fn not_installed_prompt(state: &UiState) -> UiState {
    UiState {
        show_wallet_options: false,
        show_wallet_not_installed: true,
        ..*state
    }
}
