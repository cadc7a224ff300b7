//! HTTP status check for image-generation jobs.
//!
//! `GET {base_url}/{status_path}/{job_id}` must answer with a JSON object
//! carrying a `status` field. The whole object is the job payload.

use super::{JobOperation, JobResponse};
use crate::config::ApiSettings;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Error {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Body(String),
}

/// Job status endpoint of the canvas API
pub struct HttpJobStatus {
    client: reqwest::Client,
    base_url: String,
    status_path: String,
}

impl HttpJobStatus {
    pub fn new(api: &ApiSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(api.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            status_path: api.job_status_path.trim_matches('/').to_string(),
        })
    }

    pub fn status_url(&self, job_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.status_path, job_id)
    }
}

#[async_trait]
impl JobOperation<str> for HttpJobStatus {
    type Output = Value;
    type Error = TransportError;

    async fn invoke(&self, job_id: &str) -> Result<JobResponse<Value>, TransportError> {
        let url = self.status_url(job_id);
        debug!(%url, "checking job status");

        let response = self.client.get(&url).send().await?;
        let code = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !code.is_success() {
            let detail = body
                .as_ref()
                .and_then(|b| b.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(text);
            return Err(TransportError::Http {
                status: code.as_u16(),
                detail,
            });
        }

        parse_status_body(body)
    }
}

fn parse_status_body(body: Option<Value>) -> Result<JobResponse<Value>, TransportError> {
    let body = body.ok_or_else(|| TransportError::Body("not JSON".to_string()))?;
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::Body("missing 'status' field".to_string()))?
        .to_string();
    Ok(JobResponse {
        status,
        payload: body,
    })
}
