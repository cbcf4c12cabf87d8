use crate::model::{
    DevicePositions, Receiver, ReceiverList, RssiSampleSet, SavePositionsRequest, ScannedDevice,
    ValidDevicesResponse,
};
use crate::prelude::{Acknowledgement, FetchError, FetchResult};
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEVICE_POSITIONS_PATH: &str = "/get_device_positions_and_receiver_positions";
pub const RECEIVER_POSITIONS_PATH: &str = "/get_receiver_positions";
pub const SAVE_RECEIVER_POSITIONS_PATH: &str = "/save_receiver_positions";
pub const VALID_DEVICES_PATH: &str = "/api/valid_devices";
pub const RSSI_PATH: &str = "/api/rssi";
pub const SCANNED_DEVICES_PATH: &str = "/api/scanned_devices";

/// JSON client for the tracking backend. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn device_positions(&self) -> FetchResult<DevicePositions> {
        self.get_json(DEVICE_POSITIONS_PATH).await
    }

    pub async fn receiver_positions(&self) -> FetchResult<Vec<Receiver>> {
        let list: ReceiverList = self.get_json(RECEIVER_POSITIONS_PATH).await?;
        Ok(list.receivers)
    }

    pub async fn save_receiver_positions(
        &self,
        request: &SavePositionsRequest,
    ) -> FetchResult<Acknowledgement> {
        let response = self
            .http
            .post(self.url(SAVE_RECEIVER_POSITIONS_PATH))
            .json(request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        decode(response).await
    }

    pub async fn valid_devices(&self) -> FetchResult<u32> {
        let body: ValidDevicesResponse = self.get_json(VALID_DEVICES_PATH).await?;
        Ok(body.valid_device_count)
    }

    pub async fn rssi(&self) -> FetchResult<RssiSampleSet> {
        self.get_json(RSSI_PATH).await
    }

    pub async fn scanned_devices(&self) -> FetchResult<Vec<ScannedDevice>> {
        self.get_json(SCANNED_DEVICES_PATH).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> FetchResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response on an ephemeral port.
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn urls_join_base_and_path_without_double_slash() {
        let client = BackendClient::new("http://127.0.0.1:5050/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5050");
        assert_eq!(
            client.url(RSSI_PATH),
            "http://127.0.0.1:5050/api/rssi"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let error = client.valid_devices().await.unwrap_err();
        assert!(matches!(error, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_a_status_error() {
        let base = serve_once("503 Service Unavailable", "text/plain", "down").await;
        let client = BackendClient::new(base, Duration::from_secs(2)).unwrap();
        match client.valid_devices().await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let base = serve_once("200 OK", "text/html", "<html>maintenance</html>").await;
        let client = BackendClient::new(base, Duration::from_secs(2)).unwrap();
        let error = client.scanned_devices().await.unwrap_err();
        assert!(matches!(error, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn well_formed_body_decodes() {
        let base = serve_once("200 OK", "application/json", r#"{"valid_device_count":4}"#).await;
        let client = BackendClient::new(base, Duration::from_secs(2)).unwrap();
        assert_eq!(client.valid_devices().await.unwrap(), 4);
    }
}
