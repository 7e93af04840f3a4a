//! HTTP adapter for the playback bridge
//!
//! Talks to a bridge daemon that fronts the actual streaming service. The
//! bridge exposes one resource per capability under `/player`, takes the
//! target device in the request, and authenticates with a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use super::{PlaybackService, PlaybackStatus, ServiceError, ServiceResult};

const USER_AGENT: &str = concat!("tagbox/", env!("CARGO_PKG_VERSION"));

/// [`PlaybackService`] implementation over the bridge REST surface
pub struct HttpPlaybackService {
    http: reqwest::Client,
    base_url: String,
    device: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    device: &'a str,
    resume: bool,
}

#[derive(Serialize)]
struct PlayRequest<'a> {
    device: &'a str,
    context_uri: &'a str,
}

#[derive(Serialize)]
struct PauseRequest<'a> {
    device: &'a str,
}

#[derive(Serialize)]
struct VolumeRequest<'a> {
    device: &'a str,
    percent: u8,
}

impl HttpPlaybackService {
    /// Build a client for the bridge at `base_url`, driving `device`.
    ///
    /// `timeout` bounds every request end to end; the controller adds its
    /// own bound on top, so a hung bridge cannot stall the jukebox.
    pub fn new(
        base_url: &str,
        device: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            device: device.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        operation: &str,
    ) -> ServiceResult<reqwest::Response> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Network(format!("{operation} timed out"))
            } else {
                ServiceError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response),
            401 | 403 => Err(ServiceError::Auth(format!(
                "{operation} rejected with status {status}"
            ))),
            404 => Err(ServiceError::Device(self.device.clone())),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::Api(code, body))
            }
        }
    }
}

#[async_trait]
impl PlaybackService for HttpPlaybackService {
    async fn transfer_playback(&self, resume: bool) -> ServiceResult<()> {
        debug!(device = %self.device, resume, "transfer playback");
        let req = self
            .request(Method::PUT, "/player/transfer")
            .json(&TransferRequest {
                device: &self.device,
                resume,
            });
        self.send(req, "transfer_playback").await?;
        Ok(())
    }

    async fn start_playback(&self, context_uri: &str) -> ServiceResult<()> {
        debug!(device = %self.device, context_uri, "start playback");
        let req = self.request(Method::PUT, "/player/play").json(&PlayRequest {
            device: &self.device,
            context_uri,
        });
        self.send(req, "start_playback").await?;
        Ok(())
    }

    async fn pause_playback(&self) -> ServiceResult<()> {
        debug!(device = %self.device, "pause playback");
        let req = self
            .request(Method::PUT, "/player/pause")
            .json(&PauseRequest {
                device: &self.device,
            });
        self.send(req, "pause_playback").await?;
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> ServiceResult<()> {
        debug!(device = %self.device, percent, "set volume");
        let req = self
            .request(Method::PUT, "/player/volume")
            .json(&VolumeRequest {
                device: &self.device,
                percent,
            });
        self.send(req, "set_volume").await?;
        Ok(())
    }

    async fn current_playback(&self) -> ServiceResult<PlaybackStatus> {
        debug!(device = %self.device, "query playback status");
        let req = self
            .request(Method::GET, "/player/status")
            .query(&[("device", self.device.as_str())]);
        let response = self.send(req, "current_playback").await?;
        response
            .json::<PlaybackStatus>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}
