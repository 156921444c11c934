//! Authenticated transport client for the IoT platform API.
//!
//! One client owns one session (base URL + token) and performs a single HTTP
//! exchange per call. There is no retry and no token refresh.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{IotError, Result};
use crate::logging::{default_logger, ClientLogger, SharedLogger};
use crate::types::{AuthRequest, Credentials, Envelope};

/// Authentication endpoint, relative to the base URL.
pub const AUTH_ENDPOINT: &str = "/api/v1/oauth/auth";

/// Header carrying the session token on authenticated calls.
pub const TOKEN_HEADER: &str = "token";

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Base URL and bearer token of an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    token: String,
}

impl Session {
    /// Create a session. The base URL loses any trailing slash; neither part
    /// may be empty.
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        let token = token.into();
        if token.is_empty() {
            return Err(IotError::config("Invalid token"));
        }
        Ok(Self { base_url, token })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Full URL of an endpoint path.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(IotError::config("Invalid base_url"));
    }
    Ok(trimmed.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout. `None` keeps the HTTP client's default (no timeout).
    pub timeout: Option<Duration>,
    pub logger: SharedLogger,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            logger: default_logger(),
        }
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the IoT platform API.
#[derive(Debug, Clone)]
pub struct IotClient {
    http: reqwest::Client,
    session: Session,
    logger: SharedLogger,
}

impl IotClient {
    /// Exchange application credentials for a session token.
    ///
    /// POST /api/v1/oauth/auth
    pub async fn authenticate(credentials: &Credentials, options: ClientOptions) -> Result<Self> {
        let base_url = normalize_base_url(&credentials.base_url)?;
        let http = build_http_client(options.timeout)?;
        let logger = options.logger;

        let url = format!("{}{}", base_url, AUTH_ENDPOINT);
        let body = AuthRequest {
            app_id: &credentials.app_id,
            app_secret: &credentials.app_secret,
        };

        let response = http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                logger.error(&format!("Authentication request error: {}", e));
                IotError::from(e)
            })?;

        let envelope = Self::parse_response(response, logger.as_ref())
            .await
            .map_err(|e| {
                logger.error(&format!("Authentication response error: {}", e));
                e
            })?;

        if !envelope.success || envelope.code != Some(200) {
            return Err(IotError::auth(envelope.error_message_or_default()));
        }

        let token = match envelope.data {
            Some(Value::String(token)) => token,
            _ => return Err(IotError::auth("response did not carry a token")),
        };
        logger.info("Authentication successful");

        Ok(Self {
            http,
            session: Session::new(base_url, token)?,
            logger,
        })
    }

    /// Wrap an existing session without contacting the server.
    pub fn from_session(session: Session, options: ClientOptions) -> Result<Self> {
        Ok(Self {
            http: build_http_client(options.timeout)?,
            session,
            logger: options.logger,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn logger(&self) -> &dyn ClientLogger {
        self.logger.as_ref()
    }

    /// Create headers for an authenticated request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = HeaderValue::from_str(self.session.token())
            .map_err(|_| IotError::auth("Invalid token format"))?;
        headers.insert(TOKEN_HEADER, token);

        Ok(headers)
    }

    /// Decode a response body into an envelope.
    async fn parse_response(
        response: reqwest::Response,
        logger: &dyn ClientLogger,
    ) -> Result<Envelope> {
        let status = response.status();
        let body = response.text().await?;
        logger.debug(&format!("API response ({}): {}", status, body));

        if !status.is_success() {
            return Err(IotError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            logger.error(&format!("JSON parse error: {}", e));
            IotError::Json(e)
        })
    }

    /// Send one authenticated request.
    ///
    /// POST sends `payload` as the JSON body; GET sends it as query
    /// parameters. Other methods are rejected.
    pub async fn request<T>(
        &self,
        endpoint: &str,
        payload: Option<&T>,
        method: Method,
    ) -> Result<Envelope>
    where
        T: Serialize + ?Sized,
    {
        let url = self.session.url(endpoint);

        let builder = if method == Method::POST {
            let builder = self.http.post(&url);
            match payload {
                Some(payload) => builder.json(payload),
                None => builder,
            }
        } else if method == Method::GET {
            let builder = self.http.get(&url);
            match payload {
                Some(payload) => builder.query(payload),
                None => builder,
            }
        } else {
            return Err(IotError::invalid_request(format!(
                "Unsupported HTTP method: {}",
                method
            )));
        };

        let response = builder.headers(self.headers()?).send().await.map_err(|e| {
            self.logger.error(&format!("Request error: {}", e));
            IotError::from(e)
        })?;

        Self::parse_response(response, self.logger.as_ref())
            .await
            .map_err(|e| {
                if let IotError::Api { .. } = e {
                    self.logger.error(&format!("Request error: {}", e));
                }
                e
            })
    }

    /// POST a JSON payload.
    pub async fn post<T>(&self, endpoint: &str, payload: &T) -> Result<Envelope>
    where
        T: Serialize + ?Sized,
    {
        self.request(endpoint, Some(payload), Method::POST).await
    }

    /// Whether an envelope reports success.
    ///
    /// Logs a warning with the server's message when it does not.
    pub fn check_response(&self, envelope: &Envelope) -> bool {
        if !envelope.success {
            self.logger.warn(&format!(
                "API call failed: {}",
                envelope.error_message_or_default()
            ));
        }
        envelope.success
    }
}
