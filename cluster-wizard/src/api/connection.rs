// Connection profile endpoints (S3, catalog)

use super::client::{ApiError, HttpClientAdapter};
use crate::models::connection::ConnectionDetails;
use crate::utils::logging::mask_sensitive;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

#[async_trait]
pub trait ConnectionApi: Send + Sync {
    /// True when the server could reach the store with these details.
    async fn test_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError>;

    async fn get_connection(&self, name: &str) -> Result<Option<ConnectionDetails>, ApiError>;

    async fn exists(&self, name: &str) -> Result<bool, ApiError>;

    async fn save_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError>;
}

pub struct HttpConnectionApi {
    http: Arc<HttpClientAdapter>,
}

impl HttpConnectionApi {
    pub fn new(http: Arc<HttpClientAdapter>) -> Self {
        Self { http }
    }
}

fn describe(details: &ConnectionDetails) -> String {
    match details {
        ConnectionDetails::S3(d) if !d.access_key.is_empty() => {
            format!("s3 '{}' (access key {})", d.name, mask_sensitive(&d.access_key))
        }
        ConnectionDetails::S3(d) => format!("s3 '{}'", d.name),
        ConnectionDetails::Catalog(d) => format!("catalog '{}'", d.name),
    }
}

#[async_trait]
impl ConnectionApi for HttpConnectionApi {
    async fn test_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError> {
        info!(
            "[PHASE: connection] [STEP: test] Testing {}",
            describe(details)
        );
        let ok: Option<bool> = self.http.post("test", details).await?;
        Ok(ok.unwrap_or(false))
    }

    async fn get_connection(&self, name: &str) -> Result<Option<ConnectionDetails>, ApiError> {
        self.http.get("connection", &[("name", name)]).await
    }

    async fn exists(&self, name: &str) -> Result<bool, ApiError> {
        let found: Option<bool> = self.http.get("connectionExists", &[("name", name)]).await?;
        Ok(found.unwrap_or(false))
    }

    async fn save_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError> {
        info!(
            "[PHASE: connection] [STEP: save] Saving {}",
            describe(details)
        );
        let ok: Option<bool> = self.http.put("connection", details).await?;
        Ok(ok.unwrap_or(false))
    }
}
