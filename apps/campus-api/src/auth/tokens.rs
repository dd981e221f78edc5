//! Opaque bearer access tokens, shared by the REST extractor and the push
//! channel handshake.

use serde::{Deserialize, Serialize};

use crate::db::kv::KeyValueStore;
use crate::error::ApiError;

/// Generate an opaque random token with the given prefix.
pub fn generate_opaque_token(prefix: &str, bytes: usize) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(&mut buf[..]);
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(&buf))
}

/// Access token TTL in seconds (7 days).
pub const ACCESS_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;

/// Data stored alongside an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenData {
    pub user_id: String,
}

fn key(token: &str) -> String {
    format!("campus:token:{}", token)
}

/// Mint and store a new access token for `user_id`.
pub async fn issue_access_token(kv: &dyn KeyValueStore, user_id: &str) -> Result<String, ApiError> {
    let token = generate_opaque_token("cat", 32);
    let data = AccessTokenData {
        user_id: user_id.to_string(),
    };
    let value = serde_json::to_string(&data).map_err(|_| ApiError::internal("serialization"))?;
    kv.set_ex(&key(&token), &value, ACCESS_TOKEN_TTL_SECS).await?;
    Ok(token)
}

pub async fn lookup_access_token(
    kv: &dyn KeyValueStore,
    token: &str,
) -> Result<Option<AccessTokenData>, ApiError> {
    match kv.get(&key(token)).await? {
        Some(v) => {
            let data: AccessTokenData =
                serde_json::from_str(&v).map_err(|_| ApiError::internal("corrupt token data"))?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

/// Invalidate an access token. Unknown tokens are ignored.
pub async fn revoke_access_token(kv: &dyn KeyValueStore, token: &str) -> Result<(), ApiError> {
    kv.del(&key(token)).await
}
