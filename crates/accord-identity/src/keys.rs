//! Issuer key material fetching.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::verifier::VerifyError;

/// Default timeout on key material requests.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Key material published by an issuer, JWKS-shaped.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyMaterial {
    /// The published keys, passed through as-is to whatever verifier
    /// consumes them.
    pub keys: Vec<Value>,
}

/// Fetches issuer key material over HTTP with a bounded timeout.
///
/// Every failure mode (connect, timeout, bad status, bad body) surfaces as
/// [`VerifyError::KeySource`]; this client never panics and never hangs
/// past its timeout.
#[derive(Debug, Clone)]
pub struct KeyMaterialClient {
    http: reqwest::Client,
    url: String,
}

impl KeyMaterialClient {
    /// Creates a client for the given JWKS URL with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, VerifyError> {
        Self::with_timeout(url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| VerifyError::KeySource(err.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// The URL this client fetches from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the current key material.
    pub async fn fetch(&self) -> Result<KeyMaterial, VerifyError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|err| VerifyError::KeySource(err.to_string()))?;
        if !response.status().is_success() {
            return Err(VerifyError::KeySource(format!(
                "issuer returned {}",
                response.status()
            )));
        }
        response
            .json::<KeyMaterial>()
            .await
            .map_err(|err| VerifyError::KeySource(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    async fn serve_once(body: &'static str, status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/keys")
    }

    #[tokio::test]
    async fn test_fetch_parses_key_material() {
        let url = serve_once(r#"{"keys":[{"kid":"a"},{"kid":"b"}]}"#, "200 OK").await;
        let client = KeyMaterialClient::new(url).unwrap();
        let material = client.fetch().await.unwrap();
        assert_eq!(material.keys.len(), 2);
        assert_eq!(material.keys[0]["kid"], "a");
    }

    #[tokio::test]
    async fn test_error_status_is_key_source_error() {
        let url = serve_once("{}", "503 Service Unavailable").await;
        let client = KeyMaterialClient::new(url).unwrap();
        assert!(matches!(
            client.fetch().await.unwrap_err(),
            VerifyError::KeySource(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_issuer_is_key_source_error() {
        // Bind then drop, so the port is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            KeyMaterialClient::with_timeout(format!("http://{addr}/keys"), Duration::from_millis(500))
                .unwrap();
        assert!(matches!(
            client.fetch().await.unwrap_err(),
            VerifyError::KeySource(_)
        ));
    }
}
