use crate::error::OptionsError;
use std::time::Duration;
use wasm_bindgen::JsValue;

/// time given to the wallet extension to inject its object in the page
/// before [`init`] gives up on it.
///
/// This is a practical accommodation for extensions that inject their
/// object after the page has loaded, not a synchronisation guarantee.
///
/// [`init`]: crate::WalletAdapter::init
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(200);

/// Adapter configuration, fixed for the lifetime of the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "RawOptions")]
pub struct Options {
    contract_id: String,
    network_id: String,
    grace_period: Duration,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    contract_id: String,
    network_id: String,
    #[serde(default)]
    grace_period_ms: Option<u64>,
}

impl Options {
    pub fn new(
        contract_id: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Result<Self, OptionsError> {
        let contract_id = contract_id.into();
        let network_id = network_id.into();

        if contract_id.is_empty() {
            return Err(OptionsError::EmptyContractId);
        }
        if network_id.is_empty() {
            return Err(OptionsError::EmptyNetworkId);
        }

        Ok(Self {
            contract_id,
            network_id,
            grace_period: DEFAULT_GRACE_PERIOD,
        })
    }

    /// decode the options from a JS object such as
    /// `{ contractId: "guest-book.testnet", networkId: "testnet" }`
    pub fn from_js(value: JsValue) -> Result<Self, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::from_value(value)
    }

    pub fn with_grace_period(self, grace_period: Duration) -> Self {
        Self {
            grace_period,
            ..self
        }
    }

    /// the account of the application's contract on the ledger
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// the network the application expects the wallet to be connected to
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl TryFrom<RawOptions> for Options {
    type Error = OptionsError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let options = Self::new(raw.contract_id, raw.network_id)?;

        Ok(match raw.grace_period_ms {
            Some(ms) => options.with_grace_period(Duration::from_millis(ms)),
            None => options,
        })
    }
}
