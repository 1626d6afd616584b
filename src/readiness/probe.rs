//! Single readiness probe attempts.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::readiness::target::{ProbeKind, WaitTarget};

/// Why a single probe attempt failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Probe a target once.
///
/// TCP targets are ready as soon as the connection is accepted; the stream is
/// dropped immediately. HTTP targets additionally need a 2xx answer.
pub async fn probe(
    target: &WaitTarget,
    timeout: Duration,
    client: &reqwest::Client,
) -> Result<(), ProbeError> {
    match &target.kind {
        ProbeKind::Tcp => {
            let connect = TcpStream::connect(target.address());
            match time::timeout(timeout, connect).await {
                Ok(Ok(_stream)) => Ok(()),
                Ok(Err(e)) => Err(ProbeError::Connect(e)),
                Err(_) => Err(ProbeError::Timeout(timeout)),
            }
        }
        ProbeKind::Http(url) => {
            let request = client
                .get(url.clone())
                .header("user-agent", "app-entrypoint-readiness")
                .send();
            match time::timeout(timeout, request).await {
                Ok(Ok(response)) if response.status().is_success() => Ok(()),
                Ok(Ok(response)) => Err(ProbeError::Status(response.status().as_u16())),
                Ok(Err(e)) => Err(ProbeError::Http(e)),
                Err(_) => Err(ProbeError::Timeout(timeout)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_probe_succeeds_against_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = WaitTarget::tcp("127.0.0.1", port);
        let client = reqwest::Client::new();
        probe(&target, Duration::from_secs(1), &client).await.unwrap();
    }

    #[tokio::test]
    async fn tcp_probe_fails_on_closed_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let target = WaitTarget::tcp("127.0.0.1", port);
        let client = reqwest::Client::new();
        let err = probe(&target, Duration::from_secs(1), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Connect(_)));
    }

    #[tokio::test]
    async fn http_probe_reports_non_success_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        let target = WaitTarget::parse(&format!("http://127.0.0.1:{}/health", port)).unwrap();
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = probe(&target, Duration::from_secs(2), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Status(503)));
    }
}
