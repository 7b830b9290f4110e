use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// the global `setTimeout`, available both in windows and workers
    #[wasm_bindgen(js_name = "setTimeout")]
    pub fn set_timeout(handler: &js_sys::Function, timeout: i32) -> JsValue;
}

#[wasm_bindgen]
extern "C" {
    /// The object the Sender extension injects as `window.wallet`.
    #[derive(Clone, PartialEq)]
    pub type SenderWallet;

    /// Handshake with the wallet for the given `{ contractId }`.
    #[wasm_bindgen(method, catch, js_name = "init")]
    pub async fn init(this: &SenderWallet, config: JsValue) -> Result<JsValue, JsValue>;

    /// Returns `{ rpc: { networkId, nodeUrl } }`, the network the wallet is
    /// currently connected to.
    #[wasm_bindgen(method, catch, js_name = "getRpc")]
    pub async fn get_rpc(this: &SenderWallet) -> Result<JsValue, JsValue>;

    /// Register a callback called with `{ rpc: { networkId, nodeUrl } }`
    /// every time the user switches the wallet's network.
    #[wasm_bindgen(method, js_name = "onRpcChanged")]
    pub fn on_rpc_changed(this: &SenderWallet, callback: &js_sys::Function);

    /// Register a callback called with the new account id every time the
    /// user switches account in the wallet.
    #[wasm_bindgen(method, js_name = "onAccountChanged")]
    pub fn on_account_changed(this: &SenderWallet, callback: &js_sys::Function);

    /// Depending on the version of the extension this is either a boolean
    /// or a promise of a boolean.
    #[wasm_bindgen(method, catch, js_name = "isSignedIn")]
    pub fn is_signed_in(this: &SenderWallet) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_name = "getAccountId")]
    pub fn get_account_id(this: &SenderWallet) -> JsValue;

    /// Prompts the user to sign in to `{ contractId }`. Resolves with
    /// `{ accessKey }`, the access key is missing if the user refused.
    #[wasm_bindgen(method, catch, js_name = "requestSignIn")]
    pub async fn request_sign_in(this: &SenderWallet, request: JsValue)
    -> Result<JsValue, JsValue>;

    /// Resolves with `{ result }`, `"success"` if the user was signed out.
    #[wasm_bindgen(method, catch, js_name = "signOut")]
    pub async fn sign_out(this: &SenderWallet) -> Result<JsValue, JsValue>;

    /// Prompts the user to sign `{ receiverId, actions }` and sends the
    /// signed transaction. The response carries an `error` field if the
    /// transaction failed.
    #[wasm_bindgen(method, catch, js_name = "signAndSendTransaction")]
    pub async fn sign_and_send_transaction(
        this: &SenderWallet,
        params: JsValue,
    ) -> Result<JsValue, JsValue>;
}
