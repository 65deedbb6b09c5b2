pub mod client;
pub mod cluster;
pub mod connection;

use crate::config::WizardSettings;
use client::{ApiError, HttpClientAdapter};
use cluster::{ClusterApi, HttpClusterApi};
use connection::{ConnectionApi, HttpConnectionApi};
use std::sync::Arc;

/// The two backend services a wizard run talks to.
#[derive(Clone)]
pub struct Backend {
    pub cluster: Arc<dyn ClusterApi>,
    pub connection: Arc<dyn ConnectionApi>,
}

impl Backend {
    pub fn new(cluster: Arc<dyn ClusterApi>, connection: Arc<dyn ConnectionApi>) -> Self {
        Self {
            cluster,
            connection,
        }
    }

    pub fn http(settings: &WizardSettings) -> Result<Self, ApiError> {
        let cid = settings.http.connection_id.clone();
        let timeout = settings.http.timeout();
        let cluster_http = HttpClientAdapter::new(
            &settings.server.endpoint(&settings.server.cluster_path),
            cid.clone(),
            timeout,
        )?;
        let connection_http = HttpClientAdapter::new(
            &settings.server.endpoint(&settings.server.connection_path),
            cid,
            timeout,
        )?;
        Ok(Self::new(
            Arc::new(HttpClusterApi::new(Arc::new(cluster_http))),
            Arc::new(HttpConnectionApi::new(Arc::new(connection_http))),
        ))
    }
}
