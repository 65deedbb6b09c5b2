// Step navigation
//
// The navigator owns the wizard context and the current step's view. Every user action
// returns at most one `PendingRequest`; the front end executes it and hands the `Reply`
// back to `finish`, which may yield a follow-up request. Leaving a step cancels its token
// and bumps the generation, so late replies from the old step are dropped.

use super::browse::falls_back_to_root;
use super::form::FieldId;
use super::requests::{execute, PendingRequest, Reply, Request, Response};
use super::schema::{self, Button, ButtonAction, StepId};
use super::steps::{Message, StepView, WizardError};
use crate::api::client::ApiError;
use crate::api::Backend;
use crate::i18n::Messages;
use crate::models::cluster::NamedCluster;
use crate::models::connection::ConnectionDetails;
use crate::models::context::{EditState, FlowType, Mode, SaveOutcome, WizardContext};
use crate::models::files::StagedFile;
use crate::wizard::browse::site_files_in;
use crate::wizard::form::Form;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    SlideLeft,
    SlideRight,
}

/// A confirmation the user must answer before the flow continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Saving would replace an existing record; `then` runs on confirmation.
    Overwrite { name: String, then: Request },
}

pub struct Navigator {
    ctx: WizardContext,
    view: StepView,
    messages: Arc<Messages>,
    transition: Transition,
    generation: u64,
    token: CancellationToken,
    prompt: Option<Prompt>,
    closed: bool,
}

impl Navigator {
    /// Positions the wizard on `entry`, or on the flow's first step.
    pub fn new(ctx: WizardContext, entry: Option<StepId>, messages: Arc<Messages>) -> Self {
        let step = entry.unwrap_or_else(|| schema::entry_step(ctx.flow, ctx.flow_type));
        let view = StepView::on_init(step, &ctx, &messages);
        info!(
            "[PHASE: wizard] [STEP: start] flow={:?} type={} entry={}",
            ctx.flow,
            ctx.flow_type.as_str(),
            step.as_str()
        );
        Self {
            ctx,
            view,
            messages,
            transition: Transition::None,
            generation: 0,
            token: CancellationToken::new(),
            prompt: None,
            closed: false,
        }
    }

    /// Run the entry step's on-enter work.
    pub fn start(&mut self) -> Option<PendingRequest> {
        self.on_enter()
    }

    pub fn context(&self) -> &WizardContext {
        &self.ctx
    }

    pub fn view(&self) -> &StepView {
        &self.view
    }

    pub fn step(&self) -> StepId {
        self.view.step
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn is_waiting(&self) -> bool {
        self.view.waiting
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn buttons(&self) -> Vec<Button> {
        schema::buttons(&self.ctx, self.view.step)
    }

    pub fn can_advance(&self) -> bool {
        !self.view.waiting && self.prompt.is_none() && self.view.can_advance(&self.ctx.files)
    }

    /// Next and Test wait for the in-flight request; Back and Cancel never do.
    pub fn is_enabled(&self, action: ButtonAction) -> bool {
        match action {
            ButtonAction::Next => self.can_advance(),
            ButtonAction::Test | ButtonAction::EditCluster | ButtonAction::TestCluster => {
                !self.view.waiting && self.prompt.is_none()
            }
            ButtonAction::Back => schema::prev_step(&self.ctx, self.view.step).is_some(),
            ButtonAction::Cancel | ButtonAction::Close => true,
        }
    }

    pub fn press(&mut self, action: ButtonAction) -> Option<PendingRequest> {
        if !self.is_enabled(action) {
            debug!(
                "[PHASE: wizard] [STEP: press] {:?} disabled on {}",
                action,
                self.view.step.as_str()
            );
            return None;
        }
        match action {
            ButtonAction::Next => self.advance(),
            ButtonAction::Back => self.back(),
            ButtonAction::Test => self.test_connection(),
            ButtonAction::EditCluster => self.edit_cluster(),
            ButtonAction::TestCluster => self.test_cluster(),
            ButtonAction::Cancel | ButtonAction::Close => {
                self.cancel();
                None
            }
        }
    }

    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) {
        self.view.set_field(field, value);
    }

    pub fn select_mode(&mut self, mode: Mode) {
        for slot in self.view.select_mode(mode) {
            self.ctx.files.clear(slot);
        }
    }

    pub fn select_shim_vendor(&mut self, vendor: &str) {
        self.view.select_shim_vendor(vendor);
    }

    pub fn select_shim_version(&mut self, version: &str) {
        self.view.select_shim_version(version);
    }

    pub fn advance(&mut self) -> Option<PendingRequest> {
        if self.view.waiting || self.prompt.is_some() {
            return None;
        }
        if !self.view.can_advance(&self.ctx.files) {
            let missing = self.view.missing_fields();
            self.view
                .fail(&WizardError::ValidationFailed(missing), &self.messages);
            return None;
        }
        let step = self.view.step;
        match step {
            StepId::NewEdit | StepId::Import => {
                self.view.commit(&mut self.ctx);
                let name = self.ctx.model.value(FieldId::Name).trim().to_string();
                let request = if self.ctx.old_name.as_deref() == Some(name.as_str()) {
                    Request::SecureEnabled
                } else {
                    Request::CheckClusterName {
                        name,
                        exact: step == StepId::Import,
                    }
                };
                self.submit(request)
            }
            StepId::Summary => {
                self.view.commit(&mut self.ctx);
                let details =
                    ConnectionDetails::from_form(self.ctx.flow, &self.ctx.model, &self.ctx.modes)?;
                let request = if self.ctx.old_name.as_deref() == Some(details.name()) {
                    Request::SaveConnection { details }
                } else {
                    Request::ConnectionExists {
                        name: details.name().to_string(),
                    }
                };
                self.submit(request)
            }
            _ => {
                self.view.commit(&mut self.ctx);
                let next = schema::next_step(&self.ctx, step)?;
                self.forward(next, Transition::SlideLeft)
            }
        }
    }

    pub fn back(&mut self) -> Option<PendingRequest> {
        let prev = schema::prev_step(&self.ctx, self.view.step)?;
        self.forward(prev, Transition::SlideRight)
    }

    /// Revisit an earlier step from the summary; it returns straight to the summary.
    pub fn jump(&mut self, step: StepId) -> Option<PendingRequest> {
        if self.view.step != StepId::Summary || !matches!(step, StepId::Intro | StepId::Details) {
            return None;
        }
        self.ctx.state = EditState::Modify;
        self.forward(step, Transition::SlideRight)
    }

    pub fn test_connection(&mut self) -> Option<PendingRequest> {
        if self.prompt.is_some() {
            return None;
        }
        let request = self
            .view
            .begin_test_connection(&self.ctx.files, &self.messages)?;
        Some(self.issue(request))
    }

    pub fn test_cluster(&mut self) -> Option<PendingRequest> {
        if self.view.step != StepId::Status {
            return None;
        }
        self.forward(StepId::Testing, Transition::SlideLeft)
    }

    pub fn edit_cluster(&mut self) -> Option<PendingRequest> {
        if !matches!(self.view.step, StepId::Status | StepId::Results) {
            return None;
        }
        self.forward(StepId::NewEdit, Transition::SlideRight)
    }

    /// Fire-and-forget; does not block the step.
    pub fn help(&mut self) -> PendingRequest {
        self.issue(Request::Help)
    }

    pub fn confirm_overwrite(&mut self) -> Option<PendingRequest> {
        let Prompt::Overwrite { name, then } = self.prompt.take()?;
        info!(
            "[PHASE: wizard] [STEP: overwrite] User confirmed overwrite of '{}'",
            name
        );
        self.submit(then)
    }

    pub fn dismiss_prompt(&mut self) {
        if self.prompt.take().is_some() {
            debug!("[PHASE: wizard] [STEP: overwrite] Overwrite declined");
        }
    }

    /// Apply the outcome of a path browse to `field`.
    pub fn apply_browse(&mut self, field: FieldId, result: Result<PathBuf, WizardError>) {
        let path = match result {
            Ok(p) => p,
            Err(e) => {
                warn!("[PHASE: wizard] [STEP: browse] {:?}: {}", field, e);
                if falls_back_to_root(field) {
                    self.view.set_field(field, "/");
                } else {
                    self.view.message = Some(Message::error(e.user_message(&self.messages)));
                }
                return;
            }
        };
        let shown = path.to_string_lossy().to_string();
        let staged = match field {
            FieldId::KeytabAuthFile | FieldId::KeytabImpFile | FieldId::DriverPath => {
                StagedFile::read(&path).map(|f| vec![f])
            }
            FieldId::ImportPath => site_files_in(&path),
            _ => {
                self.view.set_field(field, shown);
                return;
            }
        };
        let mut files = match staged {
            Ok(files) => files,
            Err(e) => {
                warn!(
                    "[PHASE: wizard] [STEP: browse] Failed to read {:?}: {}",
                    path, e
                );
                self.view.message =
                    Some(Message::error(self.messages.format("error.file.read", &[shown.as_str()])));
                return;
            }
        };
        match field {
            FieldId::ImportPath => {
                debug!(
                    "[PHASE: wizard] [STEP: browse] Staged {} site file(s) from {:?}",
                    files.len(),
                    path
                );
                self.ctx.files.set_files(files);
                self.view.set_field(field, shown);
            }
            FieldId::KeytabAuthFile | FieldId::KeytabImpFile => {
                let file = files.pop();
                let name = file.as_ref().map(|f| f.name.clone()).unwrap_or_default();
                if field == FieldId::KeytabAuthFile {
                    self.ctx.files.set_keytab_auth(file);
                } else {
                    self.ctx.files.set_keytab_imp(file);
                }
                self.view.set_field(field, name);
            }
            _ => {
                self.ctx.files.set_driver(files.pop());
                self.view.set_field(field, shown);
            }
        }
    }

    /// Close the wizard, abandoning any in-flight request.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.prompt = None;
        self.view.finish();
        self.closed = true;
        info!(
            "[PHASE: wizard] [STEP: close] Closed on {}",
            self.view.step.as_str()
        );
    }

    /// Apply a reply. Replies from a step that is no longer current are dropped.
    pub fn finish(&mut self, reply: Reply) -> Option<PendingRequest> {
        if reply.generation != self.generation {
            debug!(
                "[PHASE: wizard] [STEP: reply] Dropped stale reply (generation {} != {})",
                reply.generation, self.generation
            );
            return None;
        }
        match reply.response {
            Response::Cancelled => {
                self.view.finish();
                None
            }
            Response::Help(result) => {
                if let Err(e) = result {
                    warn!("[PHASE: wizard] [STEP: help] {}", e);
                }
                None
            }
            Response::Shims(result) => {
                match result {
                    Ok(shims) => {
                        self.ctx.shims = shims;
                        self.view.set_shims(self.ctx.shims.clone());
                    }
                    Err(e) => self.view.fail(&WizardError::Api(e), &self.messages),
                }
                self.after_shims()
            }
            Response::Cluster(result) => {
                match result {
                    Ok(Some(cluster)) => self.load_cluster(cluster),
                    Ok(None) => {
                        let name = self.ctx.launch.name.clone().unwrap_or_default();
                        self.view.finish();
                        self.view.message = Some(Message::error(
                            self.messages.format("cluster.not.found", &[name.as_str()]),
                        ));
                    }
                    Err(e) => self.view.fail(&WizardError::Api(e), &self.messages),
                }
                None
            }
            Response::NameTaken(result) => match result {
                Ok(true) => {
                    let name = self.ctx.model.value(FieldId::Name).trim().to_string();
                    self.view.finish();
                    self.prompt = Some(Prompt::Overwrite {
                        name,
                        then: Request::SecureEnabled,
                    });
                    None
                }
                Ok(false) => Some(self.issue(Request::SecureEnabled)),
                Err(e) => self.fail(e),
            },
            Response::Secure(result) => match result {
                Ok(enabled) => {
                    self.ctx.secure_enabled = enabled;
                    self.view.finish();
                    let next = schema::next_step(&self.ctx, self.view.step)?;
                    self.forward(next, Transition::SlideLeft)
                }
                Err(e) => self.fail(e),
            },
            Response::ClusterSaved(result) => {
                let requested = self.ctx.model.value(FieldId::Name).trim().to_string();
                let outcome = match result {
                    Ok(saved) if !saved.is_empty() => SaveOutcome {
                        name: saved,
                        success: true,
                    },
                    Ok(_) => SaveOutcome {
                        name: requested,
                        success: false,
                    },
                    Err(e) => {
                        warn!("[PHASE: wizard] [STEP: save_cluster] {}", e);
                        SaveOutcome {
                            name: requested,
                            success: false,
                        }
                    }
                };
                if outcome.success {
                    self.ctx.created = true;
                    self.ctx.old_name = Some(outcome.name.clone());
                }
                info!(
                    "[PHASE: wizard] [STEP: save_cluster] '{}' success={}",
                    outcome.name, outcome.success
                );
                self.ctx.save_outcome = Some(outcome);
                self.forward(StepId::Status, Transition::SlideLeft)
            }
            Response::Tests(result) => {
                let failed = match result {
                    Ok(categories) => {
                        self.ctx.test_results = categories;
                        None
                    }
                    Err(e) => {
                        self.ctx.test_results = Vec::new();
                        Some(WizardError::Api(e))
                    }
                };
                let next = self.forward(StepId::Results, Transition::SlideLeft);
                if let Some(e) = failed {
                    self.view.fail(&e, &self.messages);
                }
                next
            }
            Response::DriverInstalled(result) => {
                let installed = match result {
                    Ok(b) => b,
                    Err(e) => {
                        warn!("[PHASE: wizard] [STEP: install_driver] {}", e);
                        false
                    }
                };
                self.ctx.driver_installed = Some(installed);
                self.forward(StepId::DriverResult, Transition::SlideLeft)
            }
            Response::Connection(result) => {
                match result {
                    Ok(Some(details)) => {
                        let mut form = Form::default();
                        details.apply_to(&mut form, &mut self.ctx.modes);
                        self.ctx.model = form;
                        self.ctx.old_name = Some(details.name().to_string());
                        self.reload_view();
                    }
                    Ok(None) => {
                        let name = self.ctx.launch.name.clone().unwrap_or_default();
                        self.view.finish();
                        self.view.message = Some(Message::error(
                            self.messages.format("connection.not.found", &[name.as_str()]),
                        ));
                    }
                    Err(e) => self.view.fail(&WizardError::Api(e), &self.messages),
                }
                None
            }
            Response::Tested(result) => {
                self.view
                    .finish_test_connection(result, &self.ctx, &self.messages);
                None
            }
            Response::ConnectionExists(result) => match result {
                Ok(exists) => {
                    let details = ConnectionDetails::from_form(
                        self.ctx.flow,
                        &self.ctx.model,
                        &self.ctx.modes,
                    )?;
                    let then = Request::SaveConnection { details };
                    if exists {
                        self.view.finish();
                        self.prompt = Some(Prompt::Overwrite {
                            name: self.ctx.model.value(FieldId::Name).trim().to_string(),
                            then,
                        });
                        None
                    } else {
                        Some(self.issue(then))
                    }
                }
                Err(e) => self.fail(e),
            },
            Response::ConnectionSaved(result) => match result {
                Ok(true) => {
                    self.view.finish();
                    self.forward(StepId::Saved, Transition::SlideLeft)
                }
                Ok(false) => {
                    self.view.finish();
                    self.view.message =
                        Some(Message::error(self.messages.get("connection.save.failure")));
                    None
                }
                Err(e) => self.fail(e),
            },
        }
    }

    fn fail(&mut self, error: ApiError) -> Option<PendingRequest> {
        self.view.fail(&WizardError::Api(error), &self.messages);
        None
    }

    fn issue(&self, request: Request) -> PendingRequest {
        debug!(
            "[PHASE: wizard] [STEP: request] {} on {} (generation={})",
            request.label(),
            self.view.step.as_str(),
            self.generation
        );
        PendingRequest {
            generation: self.generation,
            token: self.token.clone(),
            request,
        }
    }

    /// Enter the waiting state and issue; no-op when already waiting.
    fn submit(&mut self, request: Request) -> Option<PendingRequest> {
        if !self.view.begin() {
            return None;
        }
        Some(self.issue(request))
    }

    fn forward(&mut self, step: StepId, transition: Transition) -> Option<PendingRequest> {
        self.view.commit(&mut self.ctx);
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation += 1;
        self.prompt = None;
        info!(
            "[PHASE: wizard] [STEP: navigate] {} -> {}",
            self.view.step.as_str(),
            step.as_str()
        );
        self.view = StepView::on_init(step, &self.ctx, &self.messages);
        self.transition = transition;
        self.on_enter()
    }

    fn reload_view(&mut self) {
        self.view = StepView::on_init(self.view.step, &self.ctx, &self.messages);
    }

    fn on_enter(&mut self) -> Option<PendingRequest> {
        match self.view.step {
            StepId::NewEdit | StepId::Import => {
                if self.ctx.shims.is_empty() {
                    return self.submit(Request::ShimIdentifiers);
                }
                self.view.set_shims(self.ctx.shims.clone());
                self.after_shims()
            }
            StepId::Intro => {
                let name = self.ctx.launch.name.clone()?;
                if !self.ctx.model.is_empty() || self.ctx.old_name.is_some() {
                    return None;
                }
                self.submit(Request::LoadConnection { name })
            }
            StepId::Creating => {
                let cluster = NamedCluster::from_form(
                    &self.ctx.model,
                    &self.ctx.modes,
                    self.ctx.old_name.as_deref(),
                    &self.ctx.shims,
                );
                let upload = self.ctx.files.take_upload();
                self.submit(Request::SaveCluster {
                    flow_type: self.ctx.flow_type,
                    cluster,
                    upload,
                })
            }
            StepId::Testing => {
                let name = self
                    .ctx
                    .save_outcome
                    .as_ref()
                    .filter(|o| o.success)
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| self.ctx.model.value(FieldId::Name).trim().to_string());
                self.submit(Request::RunTests { name })
            }
            StepId::Installing => match self.ctx.files.take_driver() {
                Some(driver) => self.submit(Request::InstallDriver { driver }),
                None => {
                    warn!("[PHASE: wizard] [STEP: install_driver] No driver staged");
                    self.ctx.driver_installed = Some(false);
                    self.forward(StepId::DriverResult, Transition::SlideLeft)
                }
            },
            _ => None,
        }
    }

    /// Continue a cluster step once shim identifiers are known.
    fn after_shims(&mut self) -> Option<PendingRequest> {
        self.view.finish();
        if self.ctx.created {
            if let Some(name) = self.ctx.old_name.clone() {
                // A saved cluster is edited from its server copy from here on.
                self.ctx.flow_type = FlowType::Edit;
                self.ctx.state = EditState::Edit;
                self.ctx.created = false;
                return self.submit(Request::LoadCluster { name });
            }
        }
        let name = self.ctx.launch.name.clone()?;
        if self.view.step != StepId::NewEdit
            || !self.ctx.model.is_empty()
            || self.ctx.old_name.is_some()
        {
            return None;
        }
        self.submit(Request::LoadCluster { name })
    }

    fn load_cluster(&mut self, cluster: NamedCluster) {
        let mut form = Form::default();
        cluster.apply_to(&mut form, &mut self.ctx.modes);
        self.ctx.old_name = Some(cluster.name.clone());
        if self.ctx.flow_type == FlowType::Duplicate {
            if let Some(dup) = self.ctx.launch.duplicate_name.clone() {
                form.set(FieldId::Name, dup);
            }
        }
        self.ctx.model = form;
        info!(
            "[PHASE: wizard] [STEP: load_cluster] Loaded '{}' as {}",
            cluster.name,
            self.ctx.flow_type.as_str()
        );
        self.reload_view();
    }
}

/// Execute `pending` and every follow-up request until the navigator is idle.
pub async fn settle(nav: &mut Navigator, backend: &Backend, mut pending: Option<PendingRequest>) {
    while let Some(p) = pending {
        let reply = execute(p, backend).await;
        pending = nav.finish(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cluster::ClusterApi;
    use crate::api::connection::ConnectionApi;
    use crate::models::cluster::ShimIdentifier;
    use crate::models::context::{
        FlowKind, KerberosSubType, LaunchParams, S3AuthType, SecurityType,
    };
    use crate::models::files::{FileSlot, Upload};
    use crate::models::test_results::{TestCategory, TestOutcome, TestStatus};
    use crate::wizard::steps::MessageKind;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubCluster {
        secure: bool,
        clusters: Mutex<HashMap<String, NamedCluster>>,
        saves: Mutex<Vec<(FlowType, NamedCluster, Upload)>>,
        shim_calls: AtomicU32,
        lookup_calls: AtomicU32,
        tests_fail: bool,
    }

    impl StubCluster {
        fn with_cluster(self, cluster: NamedCluster) -> Self {
            self.clusters
                .lock()
                .expect("lock")
                .insert(cluster.name.clone(), cluster);
            self
        }
    }

    #[async_trait]
    impl ClusterApi for StubCluster {
        async fn help(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn shim_identifiers(&self) -> Result<Vec<ShimIdentifier>, ApiError> {
            self.shim_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ShimIdentifier {
                id: "cdh61".into(),
                vendor: "Cloudera".into(),
                version: "6.1".into(),
            }])
        }

        async fn secure_enabled(&self) -> Result<bool, ApiError> {
            Ok(self.secure)
        }

        async fn get_named_cluster(&self, name: &str) -> Result<Option<NamedCluster>, ApiError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.clusters.lock().expect("lock").get(name).cloned())
        }

        async fn save_named_cluster(
            &self,
            flow_type: FlowType,
            cluster: &NamedCluster,
            upload: Upload,
        ) -> Result<String, ApiError> {
            self.saves
                .lock()
                .expect("lock")
                .push((flow_type, cluster.clone(), upload));
            self.clusters
                .lock()
                .expect("lock")
                .insert(cluster.name.clone(), cluster.clone());
            Ok(cluster.name.clone())
        }

        async fn run_tests(&self, _name: &str) -> Result<Vec<TestCategory>, ApiError> {
            if self.tests_fail {
                return Err(ApiError::Server { status: 500 });
            }
            Ok(vec![TestCategory {
                category_name: "Hadoop File System".into(),
                category_status: Some(TestStatus::Pass),
                category_active: true,
                tests: vec![TestOutcome {
                    test_name: "Ping".into(),
                    test_status: Some(TestStatus::Pass),
                    test_active: true,
                }],
            }])
        }

        async fn install_driver(&self, driver: StagedFile) -> Result<bool, ApiError> {
            Ok(driver.name.ends_with(".kar"))
        }
    }

    #[derive(Default)]
    struct StubConnection {
        tested: Mutex<Vec<ConnectionDetails>>,
        saved: Mutex<Vec<ConnectionDetails>>,
        existing: Mutex<HashMap<String, ConnectionDetails>>,
        test_passes: bool,
    }

    #[async_trait]
    impl ConnectionApi for StubConnection {
        async fn test_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError> {
            self.tested.lock().expect("lock").push(details.clone());
            Ok(self.test_passes)
        }

        async fn get_connection(&self, name: &str) -> Result<Option<ConnectionDetails>, ApiError> {
            Ok(self.existing.lock().expect("lock").get(name).cloned())
        }

        async fn exists(&self, name: &str) -> Result<bool, ApiError> {
            Ok(self.existing.lock().expect("lock").contains_key(name))
        }

        async fn save_connection(&self, details: &ConnectionDetails) -> Result<bool, ApiError> {
            self.saved.lock().expect("lock").push(details.clone());
            Ok(true)
        }
    }

    fn backend(cluster: StubCluster, connection: StubConnection) -> (Backend, Arc<StubCluster>, Arc<StubConnection>) {
        let cluster = Arc::new(cluster);
        let connection = Arc::new(connection);
        (
            Backend::new(cluster.clone(), connection.clone()),
            cluster,
            connection,
        )
    }

    fn navigator(ctx: WizardContext) -> Navigator {
        Navigator::new(ctx, None, Arc::new(Messages::builtin()))
    }

    async fn started(ctx: WizardContext, backend: &Backend) -> Navigator {
        let mut nav = navigator(ctx);
        let pending = nav.start();
        settle(&mut nav, backend, pending).await;
        nav
    }

    fn existing_cluster(name: &str) -> NamedCluster {
        NamedCluster {
            name: name.into(),
            shim_vendor: "Cloudera".into(),
            shim_version: "6.1".into(),
            hdfs_host: "nn.example".into(),
            hdfs_port: "8020".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn s3_key_auth_test_then_save() {
        let (backend, _, connection) = backend(
            StubCluster::default(),
            StubConnection {
                test_passes: true,
                ..Default::default()
            },
        );
        let mut nav = started(WizardContext::new(FlowKind::S3, FlowType::New), &backend).await;

        nav.set_field(FieldId::Name, "lake");
        assert!(nav.advance().is_none(), "Intro advances locally");
        assert_eq!(nav.step(), StepId::Details);
        assert!(!nav.can_advance());

        nav.set_field(FieldId::AccessKey, "AKIAEXAMPLE");
        nav.set_field(FieldId::SecretKey, "s3cr3t");
        let pending = nav.test_connection();
        assert!(nav.is_waiting());
        assert!(nav.test_connection().is_none(), "Test is ignored while waiting");
        settle(&mut nav, &backend, pending).await;

        {
            let tested = connection.tested.lock().expect("lock");
            assert_eq!(tested.len(), 1);
            match &tested[0] {
                ConnectionDetails::S3(d) => {
                    assert_eq!(d.auth_type, 0);
                    assert_eq!(d.access_key, "AKIAEXAMPLE");
                    assert!(d.profile_name.is_empty());
                }
                other => panic!("Expected S3 details, got {:?}", other),
            }
        }
        let msg = nav.view().message.clone().expect("message");
        assert_eq!(msg.kind, MessageKind::Success);
        assert!(msg.text.contains("Next"), "Got {}", msg.text);

        assert!(nav.advance().is_none());
        assert_eq!(nav.step(), StepId::Summary);
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        assert_eq!(nav.step(), StepId::Saved);
        assert_eq!(connection.saved.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn existing_connection_name_prompts_before_overwrite() {
        let existing = ConnectionDetails::from_form(
            FlowKind::Catalog,
            &{
                let mut f = Form::default();
                f.set(FieldId::Name, "cat");
                f
            },
            &Default::default(),
        )
        .expect("details");
        let stub = StubConnection::default();
        stub.existing
            .lock()
            .expect("lock")
            .insert("cat".into(), existing);
        let (backend, _, connection) = backend(StubCluster::default(), stub);
        let mut nav = started(WizardContext::new(FlowKind::Catalog, FlowType::New), &backend).await;

        nav.set_field(FieldId::Name, "cat");
        nav.advance();
        nav.set_field(FieldId::Url, "http://catalog");
        nav.set_field(FieldId::Username, "u");
        nav.set_field(FieldId::Password, "p");
        nav.advance();
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        assert!(
            matches!(nav.prompt(), Some(Prompt::Overwrite { name, .. }) if name == "cat"),
            "Expected an overwrite prompt"
        );
        assert!(connection.saved.lock().expect("lock").is_empty());
        assert!(nav.advance().is_none(), "Next is blocked while prompting");

        let pending = nav.confirm_overwrite();
        settle(&mut nav, &backend, pending).await;
        assert_eq!(nav.step(), StepId::Saved);
        assert_eq!(connection.saved.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn editing_a_connection_loads_it_and_saves_without_prompt() {
        let mut form = Form::default();
        form.set(FieldId::Name, "lake");
        form.set(FieldId::AccessKey, "AKIA");
        form.set(FieldId::SecretKey, "secret");
        let details =
            ConnectionDetails::from_form(FlowKind::S3, &form, &Default::default()).expect("details");
        let stub = StubConnection::default();
        stub.existing.lock().expect("lock").insert("lake".into(), details);
        let (backend, _, connection) = backend(StubCluster::default(), stub);

        let ctx = WizardContext::launched(
            FlowKind::S3,
            false,
            LaunchParams {
                name: Some("lake".into()),
                ..Default::default()
            },
        );
        let mut nav = started(ctx, &backend).await;

        assert_eq!(nav.view().value(FieldId::Name), "lake");
        assert_eq!(nav.context().old_name.as_deref(), Some("lake"));
        nav.advance();
        assert_eq!(nav.view().value(FieldId::AccessKey), "AKIA");
        nav.advance();
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        assert!(nav.prompt().is_none());
        assert_eq!(nav.step(), StepId::Saved);
        assert_eq!(connection.saved.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn back_then_next_preserves_entered_values() {
        let (backend, _, _) = backend(StubCluster::default(), StubConnection::default());
        let mut nav = started(WizardContext::new(FlowKind::S3, FlowType::New), &backend).await;

        nav.set_field(FieldId::Name, "lake");
        nav.advance();
        nav.set_field(FieldId::AccessKey, "AKIA");
        nav.set_field(FieldId::Region, "eu-west-1");
        nav.back();
        assert_eq!(nav.step(), StepId::Intro);
        assert_eq!(nav.transition(), Transition::SlideRight);
        assert_eq!(nav.view().value(FieldId::Name), "lake");
        nav.advance();

        assert_eq!(nav.step(), StepId::Details);
        assert_eq!(nav.transition(), Transition::SlideLeft);
        assert_eq!(nav.view().value(FieldId::AccessKey), "AKIA");
        assert_eq!(nav.view().value(FieldId::Region), "eu-west-1");
    }

    #[tokio::test]
    async fn summary_jump_returns_to_summary_with_apply() {
        let (backend, _, _) = backend(StubCluster::default(), StubConnection::default());
        let mut nav = started(WizardContext::new(FlowKind::Catalog, FlowType::New), &backend).await;
        nav.set_field(FieldId::Name, "cat");
        nav.advance();
        nav.set_field(FieldId::Url, "http://c");
        nav.set_field(FieldId::Username, "u");
        nav.set_field(FieldId::Password, "p");
        nav.advance();
        assert_eq!(nav.step(), StepId::Summary);

        nav.jump(StepId::Intro);

        assert_eq!(nav.step(), StepId::Intro);
        assert_eq!(nav.context().state, EditState::Modify);
        let next = nav
            .buttons()
            .into_iter()
            .find(|b| b.action == ButtonAction::Next)
            .expect("next button");
        assert_eq!(next.label_key, "controls.apply.label");
        nav.advance();
        assert_eq!(nav.step(), StepId::Summary);
    }

    #[tokio::test]
    async fn stale_replies_are_dropped_after_leaving_a_step() {
        let (backend, _, connection) = backend(StubCluster::default(), StubConnection::default());
        let mut nav = started(WizardContext::new(FlowKind::Catalog, FlowType::New), &backend).await;
        nav.set_field(FieldId::Name, "cat");
        nav.advance();
        nav.set_field(FieldId::Url, "http://c");
        nav.set_field(FieldId::Username, "u");
        nav.set_field(FieldId::Password, "p");
        nav.advance();

        let pending = nav.advance().expect("exists check");
        assert!(nav.is_waiting());
        nav.back();
        assert_eq!(nav.step(), StepId::Details);
        assert!(pending.token.is_cancelled(), "Leaving a step cancels its request");

        let late = Reply {
            generation: pending.generation,
            response: Response::ConnectionExists(Ok(false)),
        };
        assert!(nav.finish(late).is_none());
        assert_eq!(nav.step(), StepId::Details);
        assert!(connection.saved.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn new_cluster_saves_and_second_save_sends_no_files() {
        let (backend, cluster, _) = backend(StubCluster::default(), StubConnection::default());
        let mut nav = started(
            WizardContext::new(FlowKind::HadoopCluster, FlowType::Import),
            &backend,
        )
        .await;
        assert_eq!(nav.step(), StepId::Import);
        assert_eq!(nav.view().value(FieldId::ShimVendor), "Cloudera");

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("core-site.xml"), b"<c/>").expect("write");
        nav.set_field(FieldId::Name, "imported");
        nav.apply_browse(FieldId::ImportPath, Ok(dir.path().to_path_buf()));
        assert!(nav.context().files.is_staged(FileSlot::SiteFiles));

        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        assert_eq!(nav.step(), StepId::Status);
        let outcome = nav.context().save_outcome.clone().expect("outcome");
        assert!(outcome.success);
        assert!(nav.context().files.is_empty(), "Upload drains staged files");
        assert!(nav
            .buttons()
            .iter()
            .any(|b| b.action == ButtonAction::TestCluster));

        let pending = nav.press(ButtonAction::EditCluster);
        settle(&mut nav, &backend, pending).await;
        assert_eq!(nav.step(), StepId::NewEdit);
        assert_eq!(nav.context().flow_type, FlowType::Edit);
        assert_eq!(nav.view().value(FieldId::Name), "imported");

        nav.set_field(FieldId::HdfsHost, "nn.example");
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        let saves = cluster.saves.lock().expect("lock");
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].0, FlowType::Import);
        assert_eq!(saves[0].2.files.len(), 1);
        assert_eq!(saves[1].0, FlowType::Edit);
        assert!(saves[1].2.is_empty(), "Second save must carry no files");
        assert_eq!(saves[1].1.old_name.as_deref(), Some("imported"));
        assert_eq!(cluster.shim_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn taken_cluster_name_needs_confirmation() {
        let (backend, cluster, _) = backend(
            StubCluster::default().with_cluster(existing_cluster("prod")),
            StubConnection::default(),
        );
        let mut nav = started(
            WizardContext::new(FlowKind::HadoopCluster, FlowType::New),
            &backend,
        )
        .await;
        nav.set_field(FieldId::Name, "prod");
        nav.set_field(FieldId::OozieUrl, "http://oozie");

        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;
        assert_eq!(nav.step(), StepId::NewEdit);
        assert!(nav.prompt().is_some());

        nav.dismiss_prompt();
        assert!(nav.prompt().is_none());
        assert!(cluster.saves.lock().expect("lock").is_empty());

        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;
        let pending = nav.confirm_overwrite();
        settle(&mut nav, &backend, pending).await;
        assert_eq!(nav.step(), StepId::Status);
        assert_eq!(cluster.saves.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn secure_server_routes_through_kerberos_and_sends_keytabs() {
        let (backend, cluster, _) = backend(
            StubCluster {
                secure: true,
                ..Default::default()
            },
            StubConnection::default(),
        );
        let mut nav = started(
            WizardContext::new(FlowKind::HadoopCluster, FlowType::New),
            &backend,
        )
        .await;
        nav.set_field(FieldId::Name, "secure");
        nav.set_field(FieldId::ZooKeeperHost, "zk");
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;
        assert_eq!(nav.step(), StepId::Security);

        nav.select_mode(Mode::Security(SecurityType::Kerberos));
        nav.advance();
        assert_eq!(nav.step(), StepId::Kerberos);
        nav.select_mode(Mode::Kerberos(KerberosSubType::Keytab));
        assert!(!nav.can_advance());

        let dir = tempfile::tempdir().expect("tempdir");
        let keytab = dir.path().join("svc.keytab");
        std::fs::write(&keytab, b"kt").expect("write");
        nav.apply_browse(FieldId::KeytabAuthFile, Ok(keytab));
        assert_eq!(nav.view().value(FieldId::KeytabAuthFile), "svc.keytab");
        assert!(nav.can_advance());

        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        let saves = cluster.saves.lock().expect("lock");
        let (_, sent, upload) = &saves[0];
        assert_eq!(sent.security_type, SecurityType::Kerberos);
        assert_eq!(sent.keytab_auth_file, "svc.keytab");
        assert!(sent.kerberos_authentication_username.is_empty());
        assert_eq!(upload.keytab_auth.as_ref().map(|f| f.name.as_str()), Some("svc.keytab"));
    }

    #[tokio::test]
    async fn leaving_kerberos_drops_staged_keytabs() {
        let (backend, _, _) = backend(
            StubCluster {
                secure: true,
                ..Default::default()
            },
            StubConnection::default(),
        );
        let mut ctx = WizardContext::new(FlowKind::HadoopCluster, FlowType::New);
        ctx.secure_enabled = true;
        ctx.modes.security = SecurityType::Kerberos;
        ctx.files
            .set_keytab_auth(Some(StagedFile::new("a.keytab", vec![1], None)));
        let mut nav = Navigator::new(ctx, Some(StepId::Security), Arc::new(Messages::builtin()));
        let pending = nav.start();
        settle(&mut nav, &backend, pending).await;

        nav.select_mode(Mode::Security(SecurityType::None));

        assert!(!nav.context().files.is_staged(FileSlot::KeytabAuth));
    }

    #[tokio::test]
    async fn duplicate_launch_loads_source_under_the_new_name() {
        let (backend, cluster, _) = backend(
            StubCluster::default().with_cluster(existing_cluster("prod")),
            StubConnection::default(),
        );
        let ctx = WizardContext::launched(
            FlowKind::HadoopCluster,
            false,
            LaunchParams {
                name: Some("prod".into()),
                duplicate_name: Some("prod-copy".into()),
                connected_to_repo: false,
            },
        );
        let mut nav = started(ctx, &backend).await;

        assert_eq!(nav.view().value(FieldId::Name), "prod-copy");
        assert_eq!(nav.view().value(FieldId::HdfsHost), "nn.example");

        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;
        let saves = cluster.saves.lock().expect("lock");
        assert_eq!(saves[0].0, FlowType::Duplicate);
        assert_eq!(saves[0].1.name, "prod-copy");
        assert_eq!(saves[0].1.old_name.as_deref(), Some("prod"));
    }

    #[tokio::test]
    async fn failed_cluster_tests_still_show_results() {
        let (backend, _, _) = backend(
            StubCluster {
                tests_fail: true,
                ..Default::default()
            },
            StubConnection::default(),
        );
        let mut nav = started(
            WizardContext::new(FlowKind::HadoopCluster, FlowType::New),
            &backend,
        )
        .await;
        nav.set_field(FieldId::Name, "c1");
        nav.set_field(FieldId::KafkaBootstrapServers, "k:9092");
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        let pending = nav.press(ButtonAction::TestCluster);
        settle(&mut nav, &backend, pending).await;

        assert_eq!(nav.step(), StepId::Results);
        assert!(nav.context().test_results.is_empty());
        assert_eq!(
            nav.view().message.as_ref().map(|m| m.kind),
            Some(MessageKind::Error)
        );
    }

    #[tokio::test]
    async fn driver_flow_installs_the_staged_file() {
        let (backend, _, _) = backend(StubCluster::default(), StubConnection::default());
        let mut nav = started(WizardContext::new(FlowKind::Driver, FlowType::New), &backend).await;
        assert_eq!(nav.step(), StepId::AddDriver);
        assert!(!nav.can_advance());

        let dir = tempfile::tempdir().expect("tempdir");
        let kar = dir.path().join("hdp.kar");
        std::fs::write(&kar, b"kar").expect("write");
        nav.apply_browse(FieldId::DriverPath, Ok(kar));
        let pending = nav.advance();
        settle(&mut nav, &backend, pending).await;

        assert_eq!(nav.step(), StepId::DriverResult);
        assert_eq!(nav.context().driver_installed, Some(true));
        assert!(nav.context().files.driver().is_none());
    }

    #[test]
    fn unavailable_picker_falls_back_to_root() {
        let mut nav = navigator(WizardContext::new(FlowKind::S3, FlowType::New));
        nav.jump_for_test(StepId::Details);
        nav.select_mode(Mode::S3Auth(S3AuthType::CredentialsFile));

        nav.apply_browse(
            FieldId::CredentialsFilePath,
            Err(WizardError::PickerUnavailable("no display".into())),
        );

        assert_eq!(nav.view().value(FieldId::CredentialsFilePath), "/");
    }

    #[test]
    fn cancel_closes_and_cancels_in_flight_work() {
        let mut nav = navigator(WizardContext::new(FlowKind::HadoopCluster, FlowType::New));
        let pending = nav.start().expect("shim request");
        assert!(nav.advance().is_none(), "Next is ignored while loading");

        nav.press(ButtonAction::Cancel);

        assert!(nav.is_closed());
        assert!(pending.token.is_cancelled());
    }

    impl Navigator {
        fn jump_for_test(&mut self, step: StepId) {
            self.forward(step, Transition::None);
        }
    }
}
