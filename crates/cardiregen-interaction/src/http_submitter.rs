//! HttpFrameSubmitter - multipart upload of one frame to the analysis service.
//!
//! Sends `POST {endpoint}/analyze` with the frame under the `file` field and
//! validates the JSON answer into a `PhaseResult`.

use std::time::Duration;

use async_trait::async_trait;
use cardiregen_core::error::{AnalysisError, Result};
use cardiregen_core::session::{FrameBlob, PhaseResult, analyze_url, normalize_endpoint};
use cardiregen_core::submitter::FrameSubmitter;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde_json::Value;

/// Multipart field the service reads the imaging volume from.
pub const FILE_FIELD: &str = "file";

/// Inference runs on a GPU behind a tunnel; a single frame can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const FRAME_MIME_TYPE: &str = "application/octet-stream";

/// `FrameSubmitter` backed by reqwest.
#[derive(Clone)]
pub struct HttpFrameSubmitter {
    client: Client,
    timeout: Duration,
}

impl HttpFrameSubmitter {
    /// Creates a submitter with a fresh client and the default timeout.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a preconfigured client (proxies, TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send_request(&self, url: Url, blob: &FrameBlob) -> Result<String> {
        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.name.clone())
            .mime_str(FRAME_MIME_TYPE)
            .map_err(|err| AnalysisError::validation(format!("Invalid frame part: {err}")))?;
        let form = Form::new().part(FILE_FIELD, part);

        tracing::debug!(%url, file = %blob.name, bytes = blob.len(), "Submitting frame");

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::debug!(status = status.as_u16(), body = %body_text, "Analysis service rejected frame");
            return Err(AnalysisError::http_status(
                status.as_u16(),
                format!("Analysis service returned {status}: {}", truncate(&body_text, 200)),
            ));
        }

        response.text().await.map_err(map_transport_error)
    }
}

impl Default for HttpFrameSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSubmitter for HttpFrameSubmitter {
    async fn submit(&self, blob: &FrameBlob, endpoint: &str) -> Result<PhaseResult> {
        if blob.is_empty() {
            return Err(AnalysisError::validation(format!(
                "Frame '{}' is empty",
                blob.name
            )));
        }
        let url = build_analyze_url(endpoint)?;

        let body = self.send_request(url, blob).await?;
        let value: Value = serde_json::from_str(&body)?;
        let result = parse_analysis_response(&value, &blob.name)?;

        tracing::debug!(
            file = %blob.name,
            volume_ml = result.volume_ml,
            has_mesh = result.mesh_payload.is_some(),
            "Frame analysed"
        );
        Ok(result)
    }
}

/// Builds `<endpoint>/analyze`, rejecting anything that is not an absolute
/// http(s) URL.
pub fn build_analyze_url(endpoint: &str) -> Result<Url> {
    if normalize_endpoint(endpoint).is_empty() {
        return Err(AnalysisError::validation("Endpoint URL is empty"));
    }

    let url = Url::parse(&analyze_url(endpoint))
        .map_err(|err| AnalysisError::validation(format!("Invalid endpoint URL '{endpoint}': {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AnalysisError::validation(format!(
            "Unsupported endpoint scheme '{other}' (expected http or https)"
        ))),
    }
}

/// Validates the service's JSON answer.
///
/// `lv_volume_ml` must be a JSON number. `rv_volume_ml` and `mesh_obj` are
/// optional; `null` counts as absent and an empty mesh string means no mesh.
pub fn parse_analysis_response(value: &Value, source_name: &str) -> Result<PhaseResult> {
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::response_shape("Response is not a JSON object"))?;

    let volume_ml = match object.get("lv_volume_ml") {
        None | Some(Value::Null) => {
            return Err(AnalysisError::response_shape("Response is missing lv_volume_ml"));
        }
        Some(field) => field.as_f64().ok_or_else(|| {
            AnalysisError::response_shape(format!("lv_volume_ml is not a number: {field}"))
        })?,
    };

    let rv_volume_ml = match object.get("rv_volume_ml") {
        None | Some(Value::Null) => None,
        Some(field) => Some(field.as_f64().ok_or_else(|| {
            AnalysisError::response_shape(format!("rv_volume_ml is not a number: {field}"))
        })?),
    };

    let mesh_payload = match object.get("mesh_obj") {
        None | Some(Value::Null) => None,
        Some(Value::String(mesh)) if mesh.trim().is_empty() => None,
        Some(Value::String(mesh)) => Some(mesh.clone()),
        Some(_) => {
            return Err(AnalysisError::response_shape("mesh_obj is not a string"));
        }
    };

    Ok(PhaseResult {
        volume_ml,
        rv_volume_ml,
        mesh_payload,
        source_name: source_name.to_string(),
    })
}

fn map_transport_error(err: reqwest::Error) -> AnalysisError {
    let message = if err.is_timeout() {
        format!("Request to analysis service timed out: {err}")
    } else if err.is_connect() {
        format!("Could not connect to analysis service: {err}")
    } else {
        format!("Analysis service request failed: {err}")
    };
    AnalysisError::Connectivity {
        message,
        status_code: err.status().map(|status| status.as_u16()),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
