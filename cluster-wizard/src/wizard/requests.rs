// Backend requests issued by wizard steps
//
// A step builds a `Request` with everything it needs already owned (the model, drained
// files), so execution never touches the wizard context. Each request runs under the
// cancellation token of the step that issued it and comes back tagged with that step's
// generation; the navigator drops replies from superseded steps.

use crate::api::client::ApiError;
use crate::api::Backend;
use crate::models::cluster::{NamedCluster, ShimIdentifier};
use crate::models::connection::ConnectionDetails;
use crate::models::context::FlowType;
use crate::models::files::{StagedFile, Upload};
use crate::models::test_results::TestCategory;
use log::debug;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Help,
    ShimIdentifiers,
    LoadCluster {
        name: String,
    },
    /// Look the name up to detect an overwrite. `exact` compares names (import);
    /// otherwise any returned record counts.
    CheckClusterName {
        name: String,
        exact: bool,
    },
    SecureEnabled,
    SaveCluster {
        flow_type: FlowType,
        cluster: NamedCluster,
        upload: Upload,
    },
    RunTests {
        name: String,
    },
    InstallDriver {
        driver: StagedFile,
    },
    LoadConnection {
        name: String,
    },
    TestConnection {
        details: ConnectionDetails,
    },
    ConnectionExists {
        name: String,
    },
    SaveConnection {
        details: ConnectionDetails,
    },
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::Help => "help",
            Request::ShimIdentifiers => "shim_identifiers",
            Request::LoadCluster { .. } => "load_cluster",
            Request::CheckClusterName { .. } => "check_cluster_name",
            Request::SecureEnabled => "secure_enabled",
            Request::SaveCluster { .. } => "save_cluster",
            Request::RunTests { .. } => "run_tests",
            Request::InstallDriver { .. } => "install_driver",
            Request::LoadConnection { .. } => "load_connection",
            Request::TestConnection { .. } => "test_connection",
            Request::ConnectionExists { .. } => "connection_exists",
            Request::SaveConnection { .. } => "save_connection",
        }
    }
}

#[derive(Debug)]
pub enum Response {
    Help(Result<(), ApiError>),
    Shims(Result<Vec<ShimIdentifier>, ApiError>),
    Cluster(Result<Option<NamedCluster>, ApiError>),
    /// `Ok(true)` when the name is already taken.
    NameTaken(Result<bool, ApiError>),
    Secure(Result<bool, ApiError>),
    ClusterSaved(Result<String, ApiError>),
    Tests(Result<Vec<TestCategory>, ApiError>),
    DriverInstalled(Result<bool, ApiError>),
    Connection(Result<Option<ConnectionDetails>, ApiError>),
    Tested(Result<bool, ApiError>),
    ConnectionExists(Result<bool, ApiError>),
    ConnectionSaved(Result<bool, ApiError>),
    Cancelled,
}

/// A request bound to the step that issued it.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub generation: u64,
    pub token: CancellationToken,
    pub request: Request,
}

#[derive(Debug)]
pub struct Reply {
    pub generation: u64,
    pub response: Response,
}

/// Run a pending request against the backend, racing the step's cancellation token.
pub async fn execute(pending: PendingRequest, backend: &Backend) -> Reply {
    let PendingRequest {
        generation,
        token,
        request,
    } = pending;
    let label = request.label();

    let response = tokio::select! {
        _ = token.cancelled() => Response::Cancelled,
        r = dispatch(request, backend) => r,
    };
    if matches!(response, Response::Cancelled) {
        debug!(
            "[PHASE: wizard] [STEP: request] {} cancelled (generation={})",
            label, generation
        );
    }
    Reply {
        generation,
        response,
    }
}

async fn dispatch(request: Request, backend: &Backend) -> Response {
    let cluster = &backend.cluster;
    let connection = &backend.connection;
    match request {
        Request::Help => Response::Help(cluster.help().await),
        Request::ShimIdentifiers => Response::Shims(cluster.shim_identifiers().await),
        Request::LoadCluster { name } => Response::Cluster(cluster.get_named_cluster(&name).await),
        Request::CheckClusterName { name, exact } => {
            let taken = cluster.get_named_cluster(&name).await.map(|found| match found {
                Some(c) if exact => c.name == name,
                Some(c) => !c.name.is_empty(),
                None => false,
            });
            Response::NameTaken(taken)
        }
        Request::SecureEnabled => Response::Secure(cluster.secure_enabled().await),
        Request::SaveCluster {
            flow_type,
            cluster: model,
            upload,
        } => Response::ClusterSaved(cluster.save_named_cluster(flow_type, &model, upload).await),
        Request::RunTests { name } => Response::Tests(cluster.run_tests(&name).await),
        Request::InstallDriver { driver } => {
            Response::DriverInstalled(cluster.install_driver(driver).await)
        }
        Request::LoadConnection { name } => {
            Response::Connection(connection.get_connection(&name).await)
        }
        Request::TestConnection { details } => {
            Response::Tested(connection.test_connection(&details).await)
        }
        Request::ConnectionExists { name } => {
            Response::ConnectionExists(connection.exists(&name).await)
        }
        Request::SaveConnection { details } => {
            Response::ConnectionSaved(connection.save_connection(&details).await)
        }
    }
}
