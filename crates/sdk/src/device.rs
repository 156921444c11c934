//! Device management operations on top of [`IotClient`].
//!
//! Each operation validates its parameters, builds the request body, sends it
//! and returns the envelope. Only RRPC decodes anything from the reply.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

use crate::client::IotClient;
use crate::error::{IotError, Result};
use crate::types::{
    BatchStatusRequest, CustomCommandRequest, DeviceLookupRequest, Envelope,
    RegisterDeviceRequest, RrpcRequest, RrpcResponse,
};

pub const REGISTER_ENDPOINT: &str = "/api/v1/quickdevice/register";
pub const DETAIL_ENDPOINT: &str = "/api/v1/quickdevice/detail";
pub const STATUS_ENDPOINT: &str = "/api/v1/quickdevice/status";
pub const BATCH_STATUS_ENDPOINT: &str = "/api/v1/quickdevice/batchGetDeviceState";
pub const RRPC_ENDPOINT: &str = "/api/v1/device/rrpc";
pub const CUSTOM_COMMAND_ENDPOINT: &str = "/api/v1/device/down/record/add/custom";

/// Server-side cap on identifiers per batch status request.
pub const MAX_BATCH_DEVICES: usize = 100;

/// Default time a device has to answer an RRPC message, in milliseconds.
pub const DEFAULT_RRPC_TIMEOUT_MS: u64 = 5000;

// ─────────────────────────────────────────────────────────────────────────────
// Payload Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Failure to turn a device payload back into text.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Base64 of the UTF-8 bytes of `message`.
pub fn encode_message(message: &str) -> String {
    STANDARD.encode(message.as_bytes())
}

/// Inverse of [`encode_message`].
pub fn decode_payload(encoded: &str) -> std::result::Result<String, PayloadError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Builders
// ─────────────────────────────────────────────────────────────────────────────

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(IotError::invalid_request(format!("{} is required", name)));
    }
    Ok(())
}

/// Build a single-device lookup. At least one identifier must be non-empty.
pub fn lookup_request(
    device_name: Option<&str>,
    device_id: Option<&str>,
) -> Result<DeviceLookupRequest> {
    let request = DeviceLookupRequest {
        device_name: present(device_name),
        device_id: present(device_id),
    };
    if request.device_name.is_none() && request.device_id.is_none() {
        return Err(IotError::invalid_request(
            "At least one of device_name or device_id must be provided",
        ));
    }
    Ok(request)
}

/// Build a batch status lookup holding at most [`MAX_BATCH_DEVICES`] identifiers.
pub fn batch_status_request(
    device_names: &[String],
    device_ids: &[String],
) -> Result<BatchStatusRequest> {
    let request = BatchStatusRequest {
        device_names: device_names.to_vec(),
        device_ids: device_ids.to_vec(),
    };
    if request.is_empty() {
        return Err(IotError::invalid_request(
            "At least one of device_name_list or device_id_list must be provided",
        ));
    }
    if request.len() > MAX_BATCH_DEVICES {
        return Err(IotError::invalid_request(format!(
            "Maximum {} devices per request, current request has {} devices",
            MAX_BATCH_DEVICES,
            request.len()
        )));
    }
    Ok(request)
}

// ─────────────────────────────────────────────────────────────────────────────
// Device Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Device operations facade.
#[derive(Debug, Clone)]
pub struct DeviceManager {
    client: IotClient,
}

impl DeviceManager {
    pub fn new(client: IotClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &IotClient {
        &self.client
    }

    /// Register a new device under a product.
    ///
    /// The server generates a device name when none is given.
    ///
    /// POST /api/v1/quickdevice/register
    pub async fn register_device(
        &self,
        product_key: &str,
        device_name: Option<&str>,
        nick_name: Option<&str>,
    ) -> Result<Envelope> {
        require(product_key, "product_key")?;

        let payload = RegisterDeviceRequest {
            product_key: product_key.to_string(),
            device_name: present(device_name),
            nick_name: present(nick_name),
        };
        let envelope = self.client.post(REGISTER_ENDPOINT, &payload).await?;

        if self.client.check_response(&envelope) {
            let assigned = envelope
                .data
                .as_ref()
                .and_then(|data| data.get("deviceName"))
                .and_then(Value::as_str);
            if let Some(name) = assigned {
                self.client
                    .logger()
                    .info(&format!("Device registered successfully: {}", name));
            }
        }

        Ok(envelope)
    }

    /// Query device details.
    ///
    /// POST /api/v1/quickdevice/detail
    pub async fn get_device_detail(
        &self,
        device_name: Option<&str>,
        device_id: Option<&str>,
    ) -> Result<Envelope> {
        let payload = lookup_request(device_name, device_id)?;
        self.client.post(DETAIL_ENDPOINT, &payload).await
    }

    /// Query a device's online status.
    ///
    /// POST /api/v1/quickdevice/status
    pub async fn get_device_status(
        &self,
        device_name: Option<&str>,
        device_id: Option<&str>,
    ) -> Result<Envelope> {
        let payload = lookup_request(device_name, device_id)?;
        self.client.post(STATUS_ENDPOINT, &payload).await
    }

    /// Query the status of up to [`MAX_BATCH_DEVICES`] devices in one request.
    ///
    /// Names and ids go out in the same request when both are given. Decode
    /// the reply with [`Envelope::status_records`].
    ///
    /// POST /api/v1/quickdevice/batchGetDeviceState
    pub async fn batch_get_device_status(
        &self,
        device_names: &[String],
        device_ids: &[String],
    ) -> Result<Envelope> {
        let payload = batch_status_request(device_names, device_ids)?;
        self.client.post(BATCH_STATUS_ENDPOINT, &payload).await
    }

    /// Send a synchronous RRPC message and decode the device's answer.
    ///
    /// `timeout_ms` defaults to [`DEFAULT_RRPC_TIMEOUT_MS`]. A reply payload
    /// that is not valid Base64/UTF-8 is logged and left undecoded.
    ///
    /// POST /api/v1/device/rrpc
    pub async fn send_rrpc_message(
        &self,
        device_name: &str,
        product_key: &str,
        message_content: &str,
        timeout_ms: Option<u64>,
    ) -> Result<RrpcResponse> {
        require(device_name, "device_name")?;
        require(product_key, "product_key")?;

        let payload = RrpcRequest {
            device_name: device_name.to_string(),
            product_key: product_key.to_string(),
            request_base64: encode_message(message_content),
            timeout: timeout_ms.unwrap_or(DEFAULT_RRPC_TIMEOUT_MS),
        };
        let envelope = self.client.post(RRPC_ENDPOINT, &payload).await?;
        let succeeded = self.client.check_response(&envelope);

        Ok(self.decode_rrpc(envelope, succeeded))
    }

    fn decode_rrpc(&self, envelope: Envelope, succeeded: bool) -> RrpcResponse {
        let decoded = if succeeded {
            envelope.payload_base64().map(decode_payload)
        } else {
            None
        };

        let mut response = RrpcResponse {
            envelope,
            ..Default::default()
        };
        match decoded {
            Some(Ok(text)) => {
                response.decoded_json = serde_json::from_str(&text).ok();
                response.decoded_response = Some(text);
            }
            Some(Err(e)) => {
                self.client
                    .logger()
                    .error(&format!("Failed to parse response content: {}", e));
            }
            None => {}
        }
        response
    }

    /// Queue an asynchronous custom command. Nothing comes back from the device.
    ///
    /// POST /api/v1/device/down/record/add/custom
    pub async fn send_custom_command(
        &self,
        device_name: &str,
        message_content: &str,
    ) -> Result<Envelope> {
        require(device_name, "device_name")?;

        let payload = CustomCommandRequest {
            device_name: device_name.to_string(),
            message_content: encode_message(message_content),
        };
        self.client.post(CUSTOM_COMMAND_ENDPOINT, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientOptions, Session};
    use crate::logging::testing::{Level, RecordingLogger};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Arc;

    fn manager_for(url: &str, logger: Arc<RecordingLogger>) -> DeviceManager {
        let client = IotClient::from_session(
            Session::new(url, "tok123").unwrap(),
            ClientOptions::default().with_logger(logger),
        )
        .unwrap();
        DeviceManager::new(client)
    }

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("dev-{i}")).collect()
    }

    #[test]
    fn test_lookup_request_validation() {
        assert!(lookup_request(None, None).unwrap_err().is_invalid_request());
        assert!(lookup_request(Some(""), Some("")).is_err());

        let by_name = lookup_request(Some("d1"), None).unwrap();
        assert_eq!(by_name.device_name.as_deref(), Some("d1"));
        assert!(by_name.device_id.is_none());

        let by_id = lookup_request(None, Some("id1")).unwrap();
        assert_eq!(serde_json::to_value(&by_id).unwrap(), json!({ "deviceId": "id1" }));
    }

    #[test]
    fn test_batch_request_limits() {
        assert!(batch_status_request(&[], &[]).is_err());
        assert!(batch_status_request(&names(100), &[]).is_ok());
        assert!(batch_status_request(&names(60), &names(40)).is_ok());

        let err = batch_status_request(&names(60), &names(41)).unwrap_err();
        assert!(err.to_string().contains("current request has 101 devices"));
    }

    #[test]
    fn test_payload_round_trip() {
        let message = r#"{"cmd":"reboot","note":"héllo"}"#;
        let encoded = encode_message(message);
        assert_eq!(decode_payload(&encoded).unwrap(), message);
        assert!(matches!(decode_payload("%%%"), Err(PayloadError::Base64(_))));
        assert!(matches!(
            decode_payload(&STANDARD.encode([0xff, 0xfe])),
            Err(PayloadError::Utf8(_))
        ));
    }

    #[tokio::test]
    async fn test_get_device_status_without_identity_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", STATUS_ENDPOINT)
            .expect(0)
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let err = manager.get_device_status(None, None).await.unwrap_err();

        assert!(err.is_invalid_request());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_device_detail_sends_both_identifiers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", DETAIL_ENDPOINT)
            .match_header("token", "tok123")
            .match_body(Matcher::Json(json!({ "deviceName": "d1", "deviceId": "id1" })))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"deviceName": "d1", "productKey": "pk"}}"#)
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let envelope = manager
            .get_device_detail(Some("d1"), Some("id1"))
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()["productKey"], "pk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_device_omits_absent_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", REGISTER_ENDPOINT)
            .match_body(Matcher::Json(json!({ "productKey": "pk" })))
            .with_status(200)
            .with_body(
                r#"{"success": true, "code": 200,
                    "data": {"deviceName": "auto-7f3a", "deviceSecret": "s"}}"#,
            )
            .create_async()
            .await;

        let logger = Arc::new(RecordingLogger::default());
        let manager = manager_for(&server.url(), logger.clone());
        let envelope = manager.register_device("pk", None, Some("")).await.unwrap();

        assert!(envelope.success);
        assert_eq!(
            logger.messages_at(Level::Info),
            vec!["Device registered successfully: auto-7f3a".to_string()]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_device_requires_product_key() {
        let manager = manager_for("http://127.0.0.1:9", Arc::default());
        let err = manager.register_device("", Some("d1"), None).await.unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_register_device_failure_is_returned() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", REGISTER_ENDPOINT)
            .with_status(200)
            .with_body(r#"{"success": false, "errorMessage": "device exists"}"#)
            .create_async()
            .await;

        let logger = Arc::new(RecordingLogger::default());
        let manager = manager_for(&server.url(), logger.clone());
        let envelope = manager
            .register_device("pk", Some("d1"), Some("Kitchen"))
            .await
            .unwrap();

        assert!(!envelope.success);
        assert!(logger.messages_at(Level::Info).is_empty());
        assert_eq!(
            logger.messages_at(Level::Warn),
            vec!["API call failed: device exists".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_over_limit_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", BATCH_STATUS_ENDPOINT)
            .expect(0)
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let err = manager
            .batch_get_device_status(&names(101), &[])
            .await
            .unwrap_err();

        assert!(err.is_invalid_request());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_carries_both_lists() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", BATCH_STATUS_ENDPOINT)
            .match_body(Matcher::Json(json!({ "deviceName": ["d1"], "deviceId": ["id2"] })))
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": [
                    {"deviceName": "d1", "deviceStatus": {"status": "ONLINE"}},
                    {"deviceName": "d2", "deviceStatus": {"status": "UNACTIVE"}}
                ]}"#,
            )
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let envelope = manager
            .batch_get_device_status(&["d1".to_string()], &["id2".to_string()])
            .await
            .unwrap();

        let records = envelope.status_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].device_name(), "d2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rrpc_round_trip() {
        let mut server = Server::new_async().await;
        let reply = "pong";
        let mock = server
            .mock("POST", RRPC_ENDPOINT)
            .match_body(Matcher::Json(json!({
                "deviceName": "d1",
                "productKey": "pk",
                "requestBase64Byte": encode_message("ping"),
                "timeout": 5000
            })))
            .with_status(200)
            .with_body(
                json!({ "success": true, "payloadBase64Byte": encode_message(reply) }).to_string(),
            )
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let response = manager
            .send_rrpc_message("d1", "pk", "ping", None)
            .await
            .unwrap();

        assert_eq!(response.decoded_response.as_deref(), Some(reply));
        assert!(response.decoded_json.is_none());
        assert_eq!(response.envelope.payload_base64(), Some("cG9uZw=="));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rrpc_decodes_json_payload() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", RRPC_ENDPOINT)
            .match_body(Matcher::PartialJson(json!({ "timeout": 1500 })))
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "payloadBase64Byte": encode_message(r#"{"temp": 21.5}"#)
                })
                .to_string(),
            )
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let response = manager
            .send_rrpc_message("d1", "pk", "read", Some(1500))
            .await
            .unwrap();

        assert_eq!(response.decoded_json, Some(json!({ "temp": 21.5 })));
    }

    #[tokio::test]
    async fn test_rrpc_bad_payload_is_logged() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", RRPC_ENDPOINT)
            .with_status(200)
            .with_body(r#"{"success": true, "payloadBase64Byte": "not*base64"}"#)
            .create_async()
            .await;

        let logger = Arc::new(RecordingLogger::default());
        let manager = manager_for(&server.url(), logger.clone());
        let response = manager
            .send_rrpc_message("d1", "pk", "ping", None)
            .await
            .unwrap();

        assert!(response.decoded_response.is_none());
        assert_eq!(response.envelope.payload_base64(), Some("not*base64"));
        let errors = logger.messages_at(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to parse response content"));
    }

    #[tokio::test]
    async fn test_rrpc_failure_skips_decoding() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", RRPC_ENDPOINT)
            .with_status(200)
            .with_body(
                json!({
                    "success": false,
                    "errorMessage": "device offline",
                    "payloadBase64Byte": encode_message("stale")
                })
                .to_string(),
            )
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let response = manager
            .send_rrpc_message("d1", "pk", "ping", None)
            .await
            .unwrap();

        assert!(!response.envelope.success);
        assert!(response.decoded_response.is_none());
    }

    #[tokio::test]
    async fn test_custom_command_encodes_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", CUSTOM_COMMAND_ENDPOINT)
            .match_body(Matcher::Json(json!({
                "deviceName": "d1",
                "messageContent": "eyJsZWQiOiJvbiJ9"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "data": "msg-42"}"#)
            .create_async()
            .await;

        let manager = manager_for(&server.url(), Arc::default());
        let envelope = manager
            .send_custom_command("d1", r#"{"led":"on"}"#)
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!("msg-42")));
        mock.assert_async().await;
    }
}
