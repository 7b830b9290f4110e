use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// Read-only ledger queries made on behalf of a connected wallet.
#[async_trait(?Send)]
pub trait ProviderService {
    async fn view_account(&self, account_id: &str) -> Result<AccountView, ProviderError>;
}

/// The state of an account as returned by the `view_account` query.
///
/// Balances are yoctoNEAR amounts kept as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct AccountView {
    pub amount: String,
    #[serde(default)]
    pub locked: String,
    #[serde(default)]
    pub code_hash: String,
    #[serde(default)]
    pub storage_usage: u64,
    #[serde(default)]
    pub block_height: u64,
    #[serde(default)]
    pub block_hash: String,
}

/// [`ProviderService`] talking to a NEAR RPC node over JSON-RPC.
#[derive(Debug, Clone)]
pub struct JsonRpcProvider {
    node_url: Url,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcProvider {
    pub fn new(node_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), node_url)
    }

    pub fn with_client(http_client: reqwest::Client, node_url: Url) -> Self {
        Self {
            node_url,
            http_client,
        }
    }

    /// provider for the public RPC node of a known network
    ///
    /// returns `None` if the network id is not one of `mainnet`, `testnet`
    /// or `betanet`.
    pub fn for_network(network_id: &str) -> Option<Self> {
        let url = match network_id {
            "mainnet" => "https://rpc.mainnet.near.org",
            "testnet" => "https://rpc.testnet.near.org",
            "betanet" => "https://rpc.betanet.near.org",
            _ => return None,
        };

        Url::parse(url).ok().map(Self::new)
    }

    pub fn node_url(&self) -> &Url {
        &self.node_url
    }

    async fn query(&self, params: Value) -> Result<Value, ProviderError> {
        let response: Value = self
            .http_client
            .post(self.node_url.clone())
            .json(&query_request(params))
            .send()
            .await?
            .json()
            .await?;

        query_result(response)
    }
}

#[async_trait(?Send)]
impl ProviderService for JsonRpcProvider {
    async fn view_account(&self, account_id: &str) -> Result<AccountView, ProviderError> {
        let result = self.query(view_account_params(account_id)).await?;

        Ok(serde_json::from_value(result)?)
    }
}

fn view_account_params(account_id: &str) -> Value {
    json!({
        "request_type": "view_account",
        "finality": "final",
        "account_id": account_id,
    })
}

fn query_request(params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "dontcare",
        "method": "query",
        "params": params,
    })
}

fn query_result(response: Value) -> Result<Value, ProviderError> {
    let response: RpcResponse = serde_json::from_value(response)?;

    if let Some(RpcError {
        code,
        message,
        data,
    }) = response.error
    {
        // the node puts the useful part (e.g. "account does not exist") in `data`
        let message = match data {
            Some(Value::String(data)) if !data.is_empty() => format!("{message}: {data}"),
            _ => message,
        };
        return Err(ProviderError::Rpc { code, message });
    }

    response.result.ok_or_else(|| ProviderError::Rpc {
        code: -32603,
        message: "No result returned".to_owned(),
    })
}
