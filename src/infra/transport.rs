//! Usage: REST transport for settings resources (`GET`/`PUT /settings/{key}`) + error mapping.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::schema::SettingsPayload;
use crate::error::{FieldViolation, SyncError};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport-level failure, before it is attributed to a load or a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request completed but the server answered with a non-success
    /// status. Field-level detail is kept when the body carried it.
    Status {
        status: u16,
        message: String,
        violations: Vec<FieldViolation>,
    },
    /// The request failed to complete (DNS, connect, timeout, bad body).
    Network(String),
}

impl TransportError {
    pub(crate) fn into_fetch(self, key: &str) -> SyncError {
        let message = match self {
            Self::Status {
                status, message, ..
            } => format!("HTTP {status}: {message}"),
            Self::Network(message) => message,
        };
        SyncError::Fetch {
            key: key.to_string(),
            message,
        }
    }

    pub(crate) fn into_submit(self, key: &str) -> SyncError {
        match self {
            Self::Status {
                status: 409,
                message,
                ..
            } => SyncError::Conflict {
                key: key.to_string(),
                message,
            },
            Self::Status {
                status,
                message,
                violations,
            } if (400..500).contains(&status) => SyncError::ServerValidation {
                key: key.to_string(),
                message,
                violations,
            },
            Self::Status {
                status, message, ..
            } => SyncError::Network {
                key: key.to_string(),
                message: format!("HTTP {status}: {message}"),
            },
            Self::Network(message) => SyncError::Network {
                key: key.to_string(),
                message,
            },
        }
    }
}

/// Seam between the engine and the wire. The HTTP implementation is the real
/// one; tests drive the engine through an in-memory implementation.
#[async_trait]
pub trait SettingsTransport: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<SettingsPayload, TransportError>;

    async fn mutate(
        &self,
        key: &str,
        payload: &SettingsPayload,
    ) -> Result<SettingsPayload, TransportError>;
}

/// Error body shape for non-2xx responses. Servers that only send a plain
/// `{"message"}` (or nothing parseable at all) degrade to a single top-level
/// message.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldViolation>,
}

/// reqwest-backed transport against the console REST API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, String> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err("base_url is required".to_string());
        }
        let mut base_url = reqwest::Url::parse(base_url)
            .map_err(|e| format!("invalid base_url={base_url}: {e}"))?;
        // Url::join drops the last path segment unless the base ends with `/`.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, key: &str) -> Result<reqwest::Url, TransportError> {
        self.base_url
            .join(&format!("settings/{key}"))
            .map_err(|e| TransportError::Network(format!("invalid settings url for `{key}`: {e}")))
    }

    async fn read_payload(response: reqwest::Response) -> Result<SettingsPayload, TransportError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<SettingsPayload>()
                .await
                .map_err(|e| TransportError::Network(format!("invalid response body: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
        let (message, violations) = match parsed {
            Some(err) => (
                err.message.unwrap_or_else(|| status.to_string()),
                err.errors,
            ),
            None if !body.trim().is_empty() => (body.trim().to_string(), Vec::new()),
            None => (status.to_string(), Vec::new()),
        };

        Err(TransportError::Status {
            status: status.as_u16(),
            message,
            violations,
        })
    }
}

#[async_trait]
impl SettingsTransport for HttpTransport {
    async fn fetch(&self, key: &str) -> Result<SettingsPayload, TransportError> {
        let url = self.endpoint(key)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::read_payload(response).await
    }

    async fn mutate(
        &self,
        key: &str,
        payload: &SettingsPayload,
    ) -> Result<SettingsPayload, TransportError> {
        let url = self.endpoint(key)?;
        let response = self
            .client
            .put(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::read_payload(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldValue;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, put};
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}/")
    }

    fn connection_payload() -> SettingsPayload {
        let mut payload = SettingsPayload::new();
        payload.insert("max_connections".to_string(), FieldValue::Int(100));
        payload.insert("enable_pooling".to_string(), FieldValue::Bool(true));
        payload
    }

    #[tokio::test]
    async fn fetch_returns_payload_on_200() {
        let app = Router::new().route(
            "/settings/:key",
            get(|Path(key): Path<String>| async move {
                assert_eq!(key, "connection");
                Json(connection_payload())
            }),
        );
        let base = serve(app).await;

        let transport = HttpTransport::new(&base).expect("transport");
        let payload = transport.fetch("connection").await.expect("fetch");
        assert_eq!(payload, connection_payload());
    }

    #[tokio::test]
    async fn fetch_maps_error_body_message() {
        let app = Router::new().route(
            "/settings/:key",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({"message": "no such bucket"})),
                )
            }),
        );
        let base = serve(app).await;

        let transport = HttpTransport::new(&base).expect("transport");
        let err = transport.fetch("nope").await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 404,
                message: "no such bucket".to_string(),
                violations: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn mutate_round_trips_normalized_payload() {
        let app = Router::new().route(
            "/settings/:key",
            put(|Json(mut body): Json<SettingsPayload>| async move {
                // Server-side normalization: clamp to 90.
                body.insert("max_connections".to_string(), FieldValue::Int(90));
                Json(body)
            }),
        );
        let base = serve(app).await;

        let transport = HttpTransport::new(&base).expect("transport");
        let mut sent = connection_payload();
        sent.insert("max_connections".to_string(), FieldValue::Int(91));
        let persisted = transport.mutate("connection", &sent).await.expect("mutate");
        assert_eq!(
            persisted.get("max_connections"),
            Some(&FieldValue::Int(90))
        );
    }

    #[tokio::test]
    async fn mutate_surfaces_field_level_errors() {
        let app = Router::new().route(
            "/settings/:key",
            put(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({
                        "message": "validation failed",
                        "errors": [
                            {"field": "max_connections", "message": "exceeds plan limit"}
                        ]
                    })),
                )
            }),
        );
        let base = serve(app).await;

        let transport = HttpTransport::new(&base).expect("transport");
        let err = transport
            .mutate("connection", &connection_payload())
            .await
            .unwrap_err();
        let TransportError::Status {
            status,
            message,
            violations,
        } = err
        else {
            panic!("expected status error, got {err:?}");
        };
        assert_eq!(status, 422);
        assert_eq!(message, "validation failed");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "max_connections");
        assert_eq!(violations[0].message, "exceeds plan limit");
    }

    #[tokio::test]
    async fn mutate_degrades_unparseable_error_body_to_message() {
        let app = Router::new().route(
            "/settings/:key",
            put(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded").into_response() }),
        );
        let base = serve(app).await;

        let transport = HttpTransport::new(&base).expect("transport");
        let err = transport
            .mutate("connection", &connection_payload())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 502,
                message: "upstream exploded".to_string(),
                violations: Vec::new(),
            }
        );
    }

    #[test]
    fn submit_mapping_distinguishes_conflict_validation_and_network() {
        let conflict = TransportError::Status {
            status: 409,
            message: "newer revision exists".to_string(),
            violations: Vec::new(),
        }
        .into_submit("security");
        assert!(matches!(conflict, SyncError::Conflict { .. }));

        let validation = TransportError::Status {
            status: 422,
            message: "validation failed".to_string(),
            violations: vec![FieldViolation::new("api_key_rotation_days", "too low")],
        }
        .into_submit("security");
        assert_eq!(validation.violations().len(), 1);
        assert!(matches!(validation, SyncError::ServerValidation { .. }));

        let infra = TransportError::Status {
            status: 503,
            message: "maintenance".to_string(),
            violations: Vec::new(),
        }
        .into_submit("security");
        assert!(matches!(infra, SyncError::Network { .. }));

        let network = TransportError::Network("connection refused".to_string()).into_submit("security");
        assert!(matches!(network, SyncError::Network { .. }));
    }

    #[test]
    fn new_rejects_empty_or_invalid_base_url() {
        assert!(HttpTransport::new("").is_err());
        assert!(HttpTransport::new("not a url").is_err());
    }
}
