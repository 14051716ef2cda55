use crate::error::NativeError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Free-form parameters forwarded to the native connect command.
pub type ConnectParams = Map<String, Value>;

/// Outbound commands understood by the native telephony module.
#[async_trait]
pub trait NativeModule: Send + Sync {
    /// Place an outgoing call. Resolves with the raw call object once the
    /// native SDK has accepted the request.
    async fn connect(&self, token: &str, params: &ConnectParams) -> Result<Value, NativeError>;

    async fn get_version(&self) -> Result<String, NativeError>;

    /// Hang up a call. `None` targets whatever call the native side considers
    /// active (the sid is not known until the first payload carries it).
    async fn disconnect(&self, call_sid: Option<&str>) -> Result<(), NativeError>;
}
