use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use super::{FrameStream, LiveError, Transport};

/// WebSocket transport for desktop builds and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteTransport;

#[async_trait(?Send)]
impl Transport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<FrameStream, LiveError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        tracing::debug!("WebSocket open: {}", redact_token(url));

        let frames = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Binary(bytes)) => Some(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|e| LiveError::Malformed(e.to_string())),
                ),
                // Ping/pong are answered by tungstenite; the stream ends after Close
                Ok(_) => None,
                Err(e) => Some(Err(LiveError::Transport(e.to_string()))),
            }
        });
        Ok(frames.boxed_local())
    }
}

fn redact_token(url: &str) -> String {
    match url.split_once("token=") {
        Some((head, _)) => format!("{}token=…", head),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_not_logged() {
        assert_eq!(
            redact_token("ws://h/live/visitors?id=p&token=secret"),
            "ws://h/live/visitors?id=p&token=…"
        );
        assert_eq!(redact_token("ws://h/x"), "ws://h/x");
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        let err = TungsteniteTransport
            .connect("ws://127.0.0.1:9/live/visitors")
            .await
            .err();
        assert!(matches!(err, Some(LiveError::Connect(_))));
    }
}
