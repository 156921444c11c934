//! Types for IoT platform API requests and responses.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder used when the server omits `errorMessage`.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Treats an explicit JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

/// Application credentials used for the authentication exchange.
///
/// Field names match the on-disk credentials file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level JSON object every API response is wrapped in.
///
/// Operation-specific top-level fields (e.g. `payloadBase64Byte`) are kept in
/// [`extra`](Self::extra) untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// The server's error message, or a generic placeholder.
    pub fn error_message_or_default(&self) -> &str {
        self.error_message.as_deref().unwrap_or(UNKNOWN_ERROR)
    }

    /// Look up an operation-specific top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Base64 device payload carried by RRPC replies, if any.
    pub fn payload_base64(&self) -> Option<&str> {
        self.field("payloadBase64Byte")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Decode `data` as an ordered list of device status records.
    ///
    /// A missing or `null` `data` decodes to an empty list.
    pub fn status_records(&self) -> serde_json::Result<Vec<DeviceStatusRecord>> {
        match &self.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Vec::<DeviceStatusRecord>::deserialize(value),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Device Status Types
// ─────────────────────────────────────────────────────────────────────────────

/// Online state reported for a device.
///
/// Values outside the documented set are kept verbatim in
/// [`Other`](Self::Other) so they survive diffing and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Online,
    Offline,
    /// Registered but never activated
    Unactive,
    /// Any other value the server reports
    Other(String),
    /// No status in the record
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// Interpret a raw `deviceStatus.status` value.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => DeviceStatus::Unknown,
            Some(Value::String(s)) => DeviceStatus::from(s.as_str()),
            Some(other) => DeviceStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceStatus::Online => "ONLINE",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Unactive => "UNACTIVE",
            DeviceStatus::Other(raw) => raw,
            DeviceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for DeviceStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "ONLINE" => DeviceStatus::Online,
            "OFFLINE" => DeviceStatus::Offline,
            "UNACTIVE" => DeviceStatus::Unactive,
            other => DeviceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a batch status reply, kept exactly as the server sent it.
///
/// Accessors read the documented fields; serializing writes the original
/// object back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStatusRecord(Map<String, Value>);

impl DeviceStatusRecord {
    pub fn device_name(&self) -> &str {
        self.0.get("deviceName").and_then(Value::as_str).unwrap_or_default()
    }

    /// The raw `deviceStatus` object, when it is one.
    pub fn device_status(&self) -> Option<&Map<String, Value>> {
        self.0.get("deviceStatus").and_then(Value::as_object)
    }

    /// Raw `deviceStatus.status`.
    pub fn status_value(&self) -> Option<&Value> {
        self.device_status().and_then(|info| info.get("status"))
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::from_value(self.status_value())
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.device_status().and_then(|info| info.get("timestamp"))
    }

    pub fn last_online_time(&self) -> Option<&Value> {
        self.0.get("lastOnlineTime")
    }

    /// Any other top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Body of the authentication exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthRequest<'a> {
    pub app_id: &'a str,
    pub app_secret: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub product_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
}

/// Single-device lookup by name and/or id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLookupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// Batched lookup; the server takes list values under the singular keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStatusRequest {
    #[serde(rename = "deviceName", skip_serializing_if = "Vec::is_empty")]
    pub device_names: Vec<String>,
    #[serde(rename = "deviceId", skip_serializing_if = "Vec::is_empty")]
    pub device_ids: Vec<String>,
}

impl BatchStatusRequest {
    pub fn len(&self) -> usize {
        self.device_names.len() + self.device_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RrpcRequest {
    pub device_name: String,
    pub product_key: String,
    #[serde(rename = "requestBase64Byte")]
    pub request_base64: String,
    /// Milliseconds the device has to answer
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCommandRequest {
    pub device_name: String,
    pub message_content: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoded Responses
// ─────────────────────────────────────────────────────────────────────────────

/// RRPC reply with the device payload decoded where possible.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RrpcResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    /// UTF-8 text of `payloadBase64Byte`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_response: Option<String>,
    /// `decoded_response` parsed as JSON, when it is JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_json: Option<Value>,
}

/// Response of any facade operation.
///
/// Pass-through operations return the bare envelope; RRPC carries decoded
/// payload fields on top of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Envelope(Envelope),
    Rrpc(RrpcResponse),
}

impl ApiResponse {
    pub fn envelope(&self) -> &Envelope {
        match self {
            ApiResponse::Envelope(envelope) => envelope,
            ApiResponse::Rrpc(rrpc) => &rrpc.envelope,
        }
    }
}

impl From<Envelope> for ApiResponse {
    fn from(envelope: Envelope) -> Self {
        ApiResponse::Envelope(envelope)
    }
}

impl From<RrpcResponse> for ApiResponse {
    fn from(rrpc: RrpcResponse) -> Self {
        ApiResponse::Rrpc(rrpc)
    }
}
