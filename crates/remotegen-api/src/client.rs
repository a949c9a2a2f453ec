// Hand-crafted async HTTP client for the device configuration service.
//
// Base path: /api/v1/
// Auth: optional `Authorization: Bearer <token>` header

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    DeviceConfigResponse, DeviceGroupsResponse, DeviceSummaryResponse, HealthResponse,
};

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the configuration service.
///
/// Every endpoint is a plain JSON GET; the service owns device
/// configurations and their group metadata, this client only reads them.
pub struct ConfigServiceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ConfigServiceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, optional bearer token, and transport config.
    pub fn new(
        base_url: &str,
        token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::Tls(format!("invalid token header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = transport.build_client(headers)?;
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments under `/api/v1/`, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    // ── HTTP ─────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp, segments).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        segments: &[&str],
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            return serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            });
        }

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(Error::Unauthorized)
            }
            reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound {
                resource: segments.join("/"),
            }),
            _ => {
                let raw = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&raw)
                    .ok()
                    .and_then(|e| e.detail.or(e.message))
                    .unwrap_or_else(|| {
                        if raw.is_empty() {
                            status.to_string()
                        } else {
                            raw
                        }
                    });
                Err(Error::Service {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /api/v1/health`
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        self.get(&["health"]).await
    }

    /// `GET /api/v1/devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceSummaryResponse>, Error> {
        self.get(&["devices"]).await
    }

    /// `GET /api/v1/devices/{id}/config`
    pub async fn get_device_config(&self, device_id: &str) -> Result<DeviceConfigResponse, Error> {
        self.get(&["devices", device_id, "config"]).await
    }

    /// `GET /api/v1/devices/{id}/groups`
    pub async fn get_device_groups(&self, device_id: &str) -> Result<DeviceGroupsResponse, Error> {
        self.get(&["devices", device_id, "groups"]).await
    }
}
