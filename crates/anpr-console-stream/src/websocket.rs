//! WebSocket push channel.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use anpr_console_core::ConnectionError;

use crate::channel::{PushChannel, PushConnector};
use crate::query::StreamFilter;

/// Builds the stream endpoint from the REST base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; the filter is appended as
/// the query string.
pub fn stream_url(base_url: &str, path: &str, filter: &StreamFilter) -> Result<Url, ConnectionError> {
    let invalid = |reason: String| ConnectionError::Connect {
        url: base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid(format!("cannot switch to {}", scheme)))?;

    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);

    let pairs = filter.to_query_pairs();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    Ok(url)
}

/// Connects to the backend's `/events/stream` socket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: String,
    path: String,
}

impl WebSocketConnector {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(
        &self,
        filter: &StreamFilter,
    ) -> Result<Box<dyn PushChannel>, ConnectionError> {
        let url = stream_url(&self.base_url, &self.path, filter)?;
        tracing::info!("Opening push channel {}", url);

        let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            ConnectionError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Box::new(WebSocketChannel { stream }))
    }
}

/// An open WebSocket connection.
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushChannel for WebSocketChannel {
    async fn next_message(&mut self) -> Option<Result<String, ConnectionError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::warn!("Dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed push channel: {:?}", frame);
                    return None;
                }
                // ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => {
                    return Some(Err(ConnectionError::Channel {
                        reason: e.to_string(),
                    }))
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("Push channel close: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_base_maps_to_ws() {
        let url = stream_url("http://localhost:8000", "/events/stream", &StreamFilter::new()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/events/stream");
    }

    #[test]
    fn test_https_base_with_prefix_and_filter() {
        let filter = StreamFilter::new().with_plate("AB 12").with_zone(3);
        let url = stream_url("https://anpr.example.com/api/", "events/stream", &filter).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://anpr.example.com/api/events/stream?plate=AB+12&zone_id=3"
        );
    }

    #[test]
    fn test_bad_base_url() {
        assert!(matches!(
            stream_url("ftp://host", "/events/stream", &StreamFilter::new()),
            Err(ConnectionError::Connect { .. })
        ));
        assert!(stream_url("not a url", "/x", &StreamFilter::new()).is_err());
    }
}
