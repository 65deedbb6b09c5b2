// HTTP client adapter
//
// JSON and multipart requests against the wizard backend. Every URL carries a
// monotonic cache-busting `v` parameter and, when configured, the `cid` connection id.
// No retries are performed; callers surface failures to the user.

use crate::models::files::{StagedFile, Upload};
use crate::utils::logging::redact_url;
use chrono::Utc;
use log::{debug, warn};
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned HTTP {status}")]
    Server { status: u16 },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ApiError::Server {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }

    fn file(name: impl Into<String>, file: StagedFile) -> Self {
        FormPart::File {
            name: name.into(),
            file_name: file.name,
            bytes: file.bytes,
        }
    }
}

/// Lay out a cluster submission: `file-<name>` and `mod-<name>` per site file, the two
/// keytab slots, then the JSON model under `data`.
pub fn multipart_parts(upload: Upload, data: Option<String>) -> Vec<FormPart> {
    let mut parts = Vec::new();
    for f in upload.files {
        let name = f.name.clone();
        let modified = f.last_modified;
        parts.push(FormPart::file(format!("file-{}", name), f));
        if let Some(ms) = modified {
            parts.push(FormPart::Text {
                name: format!("mod-{}", name),
                value: ms.to_string(),
            });
        }
    }
    if let Some(f) = upload.keytab_auth {
        parts.push(FormPart::file("keytabAuthFile", f));
    }
    if let Some(f) = upload.keytab_imp {
        parts.push(FormPart::file("keytabImpFile", f));
    }
    if let Some(json) = data {
        parts.push(FormPart::Text {
            name: "data".to_string(),
            value: json,
        });
    }
    parts
}

pub struct HttpClientAdapter {
    client: reqwest::Client,
    base_url: Url,
    connection_id: Option<String>,
    last_bust: AtomicU64,
}

impl HttpClientAdapter {
    pub fn new(
        base_url: &str,
        connection_id: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        // A trailing slash makes `join` append rather than replace the last segment.
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            connection_id: connection_id.filter(|c| !c.trim().is_empty()),
            last_bust: AtomicU64::new(0),
        })
    }

    /// Strictly increasing across calls, even within one millisecond.
    fn next_cache_bust(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut prev = self.last_bust.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_bust
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Resolve `path` against the base URL and append query, `v` and `cid`.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("v", &self.next_cache_bust().to_string());
            if let Some(cid) = &self.connection_id {
                pairs.append_pair("cid", cid);
            }
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        let request = self.client.get(url.clone());
        self.send("GET", &url, request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        let request = self.client.post(url.clone()).json(body);
        self.send("POST", &url, request).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        let request = self.client.put(url.clone()).json(body);
        self.send("PUT", &url, request).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        parts: Vec<FormPart>,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        let names: Vec<String> = parts.iter().map(|p| p.name().to_string()).collect();
        debug!(
            "[PHASE: http] [STEP: multipart] {} part(s): {}",
            names.len(),
            names.join(", ")
        );

        let mut form = multipart::Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    bytes,
                } => form.part(name, multipart::Part::bytes(bytes).file_name(file_name)),
            };
        }
        let request = self.client.post(url.clone()).multipart(form);
        self.send("POST", &url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let correlation_id = Uuid::new_v4().simple().to_string();
        let shown = redact_url(url.as_str());
        debug!(
            "[PHASE: http] [STEP: request] {} {} (correlation_id={})",
            method, shown, correlation_id
        );

        let resp = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(
                    "[PHASE: http] [STEP: request] {} {} failed: {} (correlation_id={})",
                    method, shown, e, correlation_id
                );
                ApiError::from(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(
                "[PHASE: http] [STEP: response] {} {} returned HTTP {} (correlation_id={})",
                method, shown, status, correlation_id
            );
            return Err(ApiError::Server {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        decode_body(&body).map_err(|e| {
            warn!(
                "[PHASE: http] [STEP: response] {} {} body did not decode: {} (correlation_id={})",
                method, shown, e, correlation_id
            );
            e
        })
    }
}

/// An empty body decodes like `null`, so `Option<T>` callers see `None`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}
