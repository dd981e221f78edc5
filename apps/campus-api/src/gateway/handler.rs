//! Inbound client frame dispatch.

use super::events::ClientFrame;
use super::typing::TypingTracker;

/// Handle one text frame from a connected user. Malformed JSON and unknown
/// frame types are logged and dropped; the connection stays open.
pub async fn handle_client_text(typing: &TypingTracker, user_id: &str, user_name: &str, text: &str) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(%user_id, %e, "malformed client frame");
            return;
        }
    };

    match frame {
        ClientFrame::TypingStart { group_id } => {
            typing.typing_start(&group_id, user_id, user_name).await;
        }
        ClientFrame::TypingStop { group_id } => {
            typing.typing_stop(&group_id, user_id).await;
        }
        ClientFrame::Unknown => {
            tracing::debug!(%user_id, "ignoring unknown client frame type");
        }
    }
}
