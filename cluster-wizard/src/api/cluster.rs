// Named cluster endpoints
//
// `ClusterApi` is the seam the wizard talks through. `HttpClusterApi` is the production
// implementation; tests substitute stubs.

use super::client::{multipart_parts, ApiError, FormPart, HttpClientAdapter};
use crate::models::cluster::{
    InstallDriverResponse, NamedCluster, SaveClusterResponse, SecureResponse, ShimIdentifier,
};
use crate::models::context::FlowType;
use crate::models::files::{StagedFile, Upload};
use crate::models::test_results::TestCategory;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn help(&self) -> Result<(), ApiError>;

    async fn shim_identifiers(&self) -> Result<Vec<ShimIdentifier>, ApiError>;

    /// Whether the server wants the security step shown.
    async fn secure_enabled(&self) -> Result<bool, ApiError>;

    /// `None` when the server has no record of that name.
    async fn get_named_cluster(&self, name: &str) -> Result<Option<NamedCluster>, ApiError>;

    /// Create, edit, duplicate or import. Returns the saved name, empty on failure.
    async fn save_named_cluster(
        &self,
        flow_type: FlowType,
        cluster: &NamedCluster,
        upload: Upload,
    ) -> Result<String, ApiError>;

    async fn run_tests(&self, name: &str) -> Result<Vec<TestCategory>, ApiError>;

    async fn install_driver(&self, driver: StagedFile) -> Result<bool, ApiError>;
}

pub fn save_endpoint(flow_type: FlowType) -> &'static str {
    match flow_type {
        FlowType::New => "createNamedCluster",
        FlowType::Edit => "editNamedCluster",
        FlowType::Duplicate => "duplicateNamedCluster",
        FlowType::Import => "importNamedCluster",
    }
}

pub struct HttpClusterApi {
    http: Arc<HttpClientAdapter>,
}

impl HttpClusterApi {
    pub fn new(http: Arc<HttpClientAdapter>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn help(&self) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.http.get("help", &[]).await?;
        Ok(())
    }

    async fn shim_identifiers(&self) -> Result<Vec<ShimIdentifier>, ApiError> {
        let shims: Option<Vec<ShimIdentifier>> = self.http.get("getShimIdentifiers", &[]).await?;
        Ok(shims.unwrap_or_default())
    }

    async fn secure_enabled(&self) -> Result<bool, ApiError> {
        let resp: Option<SecureResponse> = self.http.get("getSecure", &[]).await?;
        Ok(resp.map(|r| r.is_enabled()).unwrap_or(false))
    }

    async fn get_named_cluster(&self, name: &str) -> Result<Option<NamedCluster>, ApiError> {
        self.http
            .get("getNamedCluster", &[("namedCluster", name)])
            .await
    }

    async fn save_named_cluster(
        &self,
        flow_type: FlowType,
        cluster: &NamedCluster,
        upload: Upload,
    ) -> Result<String, ApiError> {
        let data = serde_json::to_string(cluster).map_err(|e| ApiError::Decode(e.to_string()))?;
        let parts = multipart_parts(upload, Some(data));
        info!(
            "[PHASE: cluster] [STEP: save] {} '{}' with {} part(s)",
            save_endpoint(flow_type),
            cluster.name,
            parts.len()
        );
        let resp: Option<SaveClusterResponse> = self
            .http
            .post_multipart(save_endpoint(flow_type), parts)
            .await?;
        Ok(resp.map(|r| r.named_cluster).unwrap_or_default())
    }

    async fn run_tests(&self, name: &str) -> Result<Vec<TestCategory>, ApiError> {
        let cats: Option<Vec<TestCategory>> = self
            .http
            .get("runTests", &[("namedCluster", name)])
            .await?;
        Ok(cats.unwrap_or_default())
    }

    async fn install_driver(&self, driver: StagedFile) -> Result<bool, ApiError> {
        let part = FormPart::File {
            name: driver.name.clone(),
            file_name: driver.name,
            bytes: driver.bytes,
        };
        let resp: Option<InstallDriverResponse> =
            self.http.post_multipart("installDriver", vec![part]).await?;
        Ok(resp.map(|r| r.installed).unwrap_or(false))
    }
}
