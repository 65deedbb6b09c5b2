// Step view-model
//
// One parameterized view-model for every screen. The schema decides which fields,
// selectors and required rule apply; the view holds the editable copy of the model,
// the local message and the `waiting` flag of the one in-flight submission.

use super::form::{FieldId, Form, Rule};
use super::requests::Request;
use super::schema::{self, StepId};
use crate::api::client::ApiError;
use crate::i18n::Messages;
use crate::models::cluster::ShimIdentifier;
use crate::models::connection::ConnectionDetails;
use crate::models::context::{FlowKind, Mode, ModeKind, Modes, WizardContext};
use crate::models::files::{FileSlot, StagedFiles};
use crate::utils::validation::{cleanse_cluster_name, is_valid_port};
use log::{debug, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("path picker unavailable: {0}")]
    PickerUnavailable(String),
    #[error("required fields missing: {0:?}")]
    ValidationFailed(Vec<FieldId>),
    #[error("'{0}' already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("connection test failed")]
    TestConnectionFailed,
    #[error("cancelled")]
    Cancelled,
}

impl WizardError {
    /// Localized text for an inline step message.
    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            WizardError::PickerUnavailable(_) => messages.get("error.picker"),
            WizardError::ValidationFailed(_) => messages.get("error.validation"),
            WizardError::DuplicateName(name) => {
                messages.format("overwrite.message", &[name.as_str()])
            }
            WizardError::Api(_) => messages.get("error.generic"),
            WizardError::TestConnectionFailed => messages.get("connection.test.failure"),
            WizardError::Cancelled => messages.get("error.cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepView {
    pub step: StepId,
    flow: FlowKind,
    form: Form,
    modes: Modes,
    shims: Vec<ShimIdentifier>,
    pub message: Option<Message>,
    pub waiting: bool,
}

impl StepView {
    /// Populate from the context, falling back to schema defaults for blank fields.
    pub fn on_init(step: StepId, ctx: &WizardContext, messages: &Messages) -> Self {
        let mut view = Self {
            step,
            flow: ctx.flow,
            form: ctx.model.clone(),
            modes: ctx.modes,
            shims: ctx.shims.clone(),
            message: None,
            waiting: false,
        };
        view.apply_defaults();
        view.message = initial_message(step, ctx, messages);
        view
    }

    fn apply_defaults(&mut self) {
        for f in schema::visible_fields(self.flow, self.step, &self.modes) {
            if !self.form.is_filled(f) {
                if let Some(d) = schema::default_value(f) {
                    self.form.set(f, d);
                }
            }
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn value(&self, field: FieldId) -> &str {
        self.form.value(field)
    }

    pub fn visible_fields(&self) -> Vec<FieldId> {
        schema::visible_fields(self.flow, self.step, &self.modes)
    }

    pub fn selectors(&self) -> &'static [ModeKind] {
        schema::selectors(self.flow, self.step)
    }

    pub fn rule(&self) -> Rule {
        schema::required(self.flow, self.step, &self.modes)
    }

    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) {
        let mut value = value.into();
        if field == FieldId::Name && self.flow == FlowKind::HadoopCluster {
            value = cleanse_cluster_name(&value);
        }
        self.form.set(field, value);
    }

    /// Pure predicate over the current values and staged files.
    pub fn can_advance(&self, files: &StagedFiles) -> bool {
        self.rule().eval(&self.form, files)
    }

    /// Required fields of the active mode that are still empty.
    pub fn missing_fields(&self) -> Vec<FieldId> {
        self.rule()
            .fields()
            .into_iter()
            .filter(|f| !self.form.is_filled(*f))
            .collect()
    }

    /// Visible port fields whose value is neither a port number nor a variable.
    pub fn invalid_ports(&self) -> Vec<FieldId> {
        self.visible_fields()
            .into_iter()
            .filter(|f| f.is_port() && self.form.is_filled(*f))
            .filter(|f| !is_valid_port(self.form.value(*f)))
            .collect()
    }

    /// Switch a selector. Fields owned only by the old option are cleared; fields shared
    /// with the new option survive. Returns the staged-file slots to drop.
    pub fn select_mode(&mut self, mode: Mode) -> Vec<FileSlot> {
        let previous = self.modes.set(mode);
        if previous == mode {
            return Vec::new();
        }
        let keep = schema::owned_fields(mode);
        for f in schema::owned_fields(previous) {
            if !keep.contains(f) {
                self.form.clear(*f);
            }
        }
        let keep_files = schema::owned_files(mode);
        let dropped: Vec<FileSlot> = schema::owned_files(previous)
            .iter()
            .copied()
            .filter(|s| !keep_files.contains(s))
            .collect();
        self.apply_defaults();
        debug!(
            "[PHASE: wizard] [STEP: select_mode] {:?} -> {:?} on {}",
            previous,
            mode,
            self.step.as_str()
        );
        dropped
    }

    pub fn shim_vendors(&self) -> Vec<String> {
        ShimIdentifier::vendors(&self.shims)
    }

    pub fn shim_versions(&self) -> Vec<String> {
        ShimIdentifier::versions_for(&self.shims, self.form.value(FieldId::ShimVendor))
    }

    pub fn set_shims(&mut self, shims: Vec<ShimIdentifier>) {
        self.shims = shims;
        if !self.form.is_filled(FieldId::ShimVendor) {
            if let Some(first) = self.shim_vendors().into_iter().next() {
                self.select_shim_vendor(&first);
            }
        }
    }

    /// Keep the selected version when the new vendor offers it, else take the first.
    pub fn select_shim_vendor(&mut self, vendor: &str) {
        self.form.set(FieldId::ShimVendor, vendor);
        let versions = self.shim_versions();
        let current = self.form.value(FieldId::ShimVersion).to_string();
        if current.is_empty() || !versions.contains(&current) {
            let first = versions.into_iter().next().unwrap_or_default();
            self.form.set(FieldId::ShimVersion, first);
        }
    }

    pub fn select_shim_version(&mut self, version: &str) {
        self.form.set(FieldId::ShimVersion, version);
    }

    /// Write fields and modes back into the context.
    pub fn commit(&self, ctx: &mut WizardContext) {
        ctx.model = self.form.clone();
        ctx.modes = self.modes;
    }

    /// Enter the waiting state. False when a submission is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.waiting {
            debug!(
                "[PHASE: wizard] [STEP: submit] Ignored while waiting on {}",
                self.step.as_str()
            );
            return false;
        }
        self.waiting = true;
        self.message = None;
        true
    }

    pub fn finish(&mut self) {
        self.waiting = false;
    }

    pub fn fail(&mut self, error: &WizardError, messages: &Messages) {
        warn!(
            "[PHASE: wizard] [STEP: {}] {}",
            self.step.as_str(),
            error
        );
        self.waiting = false;
        self.message = Some(Message::error(error.user_message(messages)));
    }

    pub fn begin_test_connection(
        &mut self,
        files: &StagedFiles,
        messages: &Messages,
    ) -> Option<Request> {
        if self.waiting {
            return None;
        }
        if !self.can_advance(files) {
            self.fail(&WizardError::ValidationFailed(self.missing_fields()), messages);
            return None;
        }
        let details = ConnectionDetails::from_form(self.flow, &self.form, &self.modes)?;
        if !self.begin() {
            return None;
        }
        Some(Request::TestConnection { details })
    }

    /// Success tells the user which button continues: "Next", or "Apply" when modifying.
    pub fn finish_test_connection(
        &mut self,
        result: Result<bool, ApiError>,
        ctx: &WizardContext,
        messages: &Messages,
    ) {
        self.finish();
        match result {
            Ok(true) => {
                let label = messages.get(schema::next_label_key(ctx, self.step));
                self.message = Some(Message::success(
                    messages.format("connection.test.success", &[label.as_str()]),
                ));
            }
            Ok(false) => self.fail(&WizardError::TestConnectionFailed, messages),
            Err(e) => self.fail(&WizardError::Api(e), messages),
        }
    }
}

fn initial_message(step: StepId, ctx: &WizardContext, messages: &Messages) -> Option<Message> {
    match step {
        StepId::Status => ctx.save_outcome.as_ref().map(|o| {
            if o.success {
                Message::success(messages.format("cluster.save.success", &[o.name.as_str()]))
            } else {
                Message::error(messages.format("cluster.save.failure", &[o.name.as_str()]))
            }
        }),
        StepId::DriverResult => Some(match ctx.driver_installed {
            Some(true) => Message::success(messages.get("driver.install.success")),
            _ => Message::error(messages.get("driver.install.failure")),
        }),
        StepId::Saved => Some(Message::success(
            messages.format("connection.saved", &[ctx.model.value(FieldId::Name)]),
        )),
        StepId::Creating => Some(Message::info(messages.get("cluster.creating"))),
        StepId::Testing => Some(Message::info(messages.get("cluster.testing"))),
        StepId::Installing => Some(Message::info(messages.get("driver.installing"))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::{
        EditState, FlowType, ImportSource, KerberosSubType, S3AuthType, S3ConnectionType,
        SecurityType,
    };
    use crate::models::files::StagedFile;

    fn view(flow: FlowKind, step: StepId) -> StepView {
        let ctx = WizardContext::new(flow, FlowType::New);
        StepView::on_init(step, &ctx, &Messages::builtin())
    }

    fn no_files() -> StagedFiles {
        StagedFiles::default()
    }

    /// Every field of `required` filled makes the step advanceable, and blanking any
    /// single one of them blocks it.
    fn assert_required_set(mut v: StepView, required: &[FieldId]) {
        for f in required {
            v.set_field(*f, "x");
        }
        assert!(
            v.can_advance(&no_files()),
            "{:?} should advance with {:?}",
            v.step,
            required
        );
        for f in required {
            let mut missing = v.clone();
            missing.set_field(*f, "");
            assert!(
                !missing.can_advance(&no_files()),
                "{:?} should block when {:?} is empty",
                v.step,
                f
            );
        }
    }

    #[test]
    fn s3_key_auth_requires_access_and_secret_key() {
        assert_required_set(
            view(FlowKind::S3, StepId::Details),
            &[FieldId::AccessKey, FieldId::SecretKey],
        );
    }

    #[test]
    fn s3_profile_auth_requires_profile_and_credentials_file() {
        let mut v = view(FlowKind::S3, StepId::Details);
        v.select_mode(Mode::S3Auth(S3AuthType::CredentialsFile));
        assert_required_set(v, &[FieldId::ProfileName, FieldId::CredentialsFilePath]);
    }

    #[test]
    fn s3_custom_endpoint_adds_endpoint_fields() {
        let mut v = view(FlowKind::S3, StepId::Details);
        v.select_mode(Mode::S3Connection(S3ConnectionType::Custom));
        assert_eq!(v.value(FieldId::PathStyleAccess), "true");
        assert_eq!(v.value(FieldId::SignatureVersion), "AWSS3V4SignerType");
        assert_required_set(
            v,
            &[
                FieldId::AccessKey,
                FieldId::SecretKey,
                FieldId::Endpoint,
                FieldId::PathStyleAccess,
                FieldId::SignatureVersion,
            ],
        );
    }

    #[test]
    fn catalog_details_require_url_and_credentials() {
        assert_required_set(
            view(FlowKind::Catalog, StepId::Details),
            &[FieldId::Url, FieldId::Username, FieldId::Password],
        );
    }

    #[test]
    fn intro_requires_a_name() {
        assert_required_set(view(FlowKind::Catalog, StepId::Intro), &[FieldId::Name]);
    }

    #[test]
    fn knox_requires_all_gateway_fields() {
        assert_required_set(
            view(FlowKind::HadoopCluster, StepId::Knox),
            &[
                FieldId::GatewayUrl,
                FieldId::GatewayUsername,
                FieldId::GatewayPassword,
            ],
        );
    }

    #[test]
    fn import_requires_name_and_the_selected_source_path() {
        assert_required_set(
            view(FlowKind::HadoopCluster, StepId::Import),
            &[FieldId::Name, FieldId::ImportPath],
        );
        let mut v = view(FlowKind::HadoopCluster, StepId::Import);
        v.select_mode(Mode::Import(ImportSource::ClusterConfig));
        assert_required_set(v, &[FieldId::Name, FieldId::CcfgFilePath]);
    }

    #[test]
    fn new_edit_needs_a_name_and_one_service() {
        let mut v = view(FlowKind::HadoopCluster, StepId::NewEdit);
        // Ports are defaulted, so a host alone completes a service.
        v.set_field(FieldId::Name, "prod");
        assert!(!v.can_advance(&no_files()));

        for host in [
            FieldId::HdfsHost,
            FieldId::JobTrackerHost,
            FieldId::ZooKeeperHost,
            FieldId::OozieUrl,
            FieldId::KafkaBootstrapServers,
        ] {
            let mut with = v.clone();
            with.set_field(host, "host-1");
            assert!(with.can_advance(&no_files()), "{:?} alone should suffice", host);
        }

        let mut no_port = v.clone();
        no_port.set_field(FieldId::HdfsHost, "nn");
        no_port.set_field(FieldId::HdfsPort, "");
        assert!(!no_port.can_advance(&no_files()), "Host without port is incomplete");

        let mut no_name = v.clone();
        no_name.set_field(FieldId::Name, "");
        no_name.set_field(FieldId::OozieUrl, "http://oozie");
        assert!(!no_name.can_advance(&no_files()));
    }

    #[test]
    fn kerberos_password_pairs_must_be_complete() {
        let v = view(FlowKind::HadoopCluster, StepId::Kerberos);
        assert!(!v.can_advance(&no_files()), "At least one username is required");

        let mut auth_only = v.clone();
        auth_only.set_field(FieldId::KerberosAuthUsername, "alice");
        assert!(!auth_only.can_advance(&no_files()));
        auth_only.set_field(FieldId::KerberosAuthPassword, "pw");
        assert!(auth_only.can_advance(&no_files()));

        let mut half_imp = auth_only.clone();
        half_imp.set_field(FieldId::KerberosImpPassword, "pw2");
        assert!(!half_imp.can_advance(&no_files()));
    }

    #[test]
    fn kerberos_keytab_requires_the_auth_keytab() {
        let mut v = view(FlowKind::HadoopCluster, StepId::Kerberos);
        v.select_mode(Mode::Kerberos(KerberosSubType::Keytab));
        let mut files = no_files();
        assert!(!v.can_advance(&files));
        files.set_keytab_imp(Some(StagedFile::new("imp.keytab", vec![1], None)));
        assert!(!v.can_advance(&files), "Impersonation keytab alone is not enough");
        files.set_keytab_auth(Some(StagedFile::new("auth.keytab", vec![1], None)));
        assert!(v.can_advance(&files));
    }

    #[test]
    fn switching_auth_type_clears_only_the_old_options_fields() {
        let mut v = view(FlowKind::S3, StepId::Details);
        v.set_field(FieldId::AccessKey, "AKIA");
        v.set_field(FieldId::SecretKey, "secret");
        v.set_field(FieldId::SessionToken, "tok");
        v.set_field(FieldId::Region, "eu-west-1");

        let dropped = v.select_mode(Mode::S3Auth(S3AuthType::CredentialsFile));

        assert!(dropped.is_empty());
        assert_eq!(v.value(FieldId::AccessKey), "");
        assert_eq!(v.value(FieldId::SecretKey), "");
        assert_eq!(v.value(FieldId::SessionToken), "");
        assert_eq!(v.value(FieldId::Region), "eu-west-1", "Shared field must survive");
    }

    #[test]
    fn switching_security_type_clears_abandoned_credentials_and_keytabs() {
        let mut v = view(FlowKind::HadoopCluster, StepId::Security);
        v.select_mode(Mode::Security(SecurityType::Kerberos));
        v.set_field(FieldId::KerberosAuthUsername, "alice");
        v.set_field(FieldId::KeytabAuthFile, "auth.keytab");
        v.set_field(FieldId::HdfsHost, "nn");

        let dropped = v.select_mode(Mode::Security(SecurityType::Knox));

        assert_eq!(v.value(FieldId::KerberosAuthUsername), "");
        assert_eq!(v.value(FieldId::KeytabAuthFile), "");
        assert_eq!(v.value(FieldId::HdfsHost), "nn");
        assert_eq!(dropped, vec![FileSlot::KeytabAuth, FileSlot::KeytabImp]);
    }

    #[test]
    fn reselecting_the_same_mode_is_a_no_op() {
        let mut v = view(FlowKind::S3, StepId::Details);
        v.set_field(FieldId::AccessKey, "AKIA");
        v.select_mode(Mode::S3Auth(S3AuthType::AccessKey));
        assert_eq!(v.value(FieldId::AccessKey), "AKIA");
    }

    #[test]
    fn cluster_names_never_contain_slashes() {
        let mut v = view(FlowKind::HadoopCluster, StepId::NewEdit);
        v.set_field(FieldId::Name, "a/b/c");
        assert_eq!(v.value(FieldId::Name), "abc");

        let mut s3 = view(FlowKind::S3, StepId::Intro);
        s3.set_field(FieldId::Name, "a/b");
        assert_eq!(s3.value(FieldId::Name), "a/b");
    }

    #[test]
    fn defaults_fill_only_blank_fields() {
        let mut ctx = WizardContext::new(FlowKind::HadoopCluster, FlowType::Edit);
        ctx.model.set(FieldId::HdfsPort, "9000");
        let v = StepView::on_init(StepId::NewEdit, &ctx, &Messages::builtin());

        assert_eq!(v.value(FieldId::HdfsPort), "9000");
        assert_eq!(v.value(FieldId::JobTrackerPort), "8032");
        assert_eq!(v.value(FieldId::ZooKeeperPort), "2181");
    }

    #[test]
    fn invalid_ports_are_reported() {
        let mut v = view(FlowKind::HadoopCluster, StepId::NewEdit);
        v.set_field(FieldId::HdfsPort, "80x");
        v.set_field(FieldId::ZooKeeperPort, "${ZK_PORT}");
        assert_eq!(v.invalid_ports(), vec![FieldId::HdfsPort]);
    }

    #[test]
    fn shim_vendor_change_keeps_a_compatible_version() {
        let shim = |id: &str, vendor: &str, version: &str| ShimIdentifier {
            id: id.into(),
            vendor: vendor.into(),
            version: version.into(),
        };
        let mut v = view(FlowKind::HadoopCluster, StepId::NewEdit);
        v.set_shims(vec![
            shim("a", "Cloudera", "6.1"),
            shim("b", "Hortonworks", "3.0"),
            shim("c", "Hortonworks", "6.1"),
        ]);
        assert_eq!(v.value(FieldId::ShimVendor), "Cloudera");
        assert_eq!(v.value(FieldId::ShimVersion), "6.1");

        v.select_shim_vendor("Hortonworks");
        assert_eq!(v.value(FieldId::ShimVersion), "6.1", "6.1 is offered by both");

        v.select_shim_version("3.0");
        v.select_shim_vendor("Cloudera");
        assert_eq!(v.value(FieldId::ShimVersion), "6.1");
    }

    #[test]
    fn begin_is_guarded_by_waiting() {
        let mut v = view(FlowKind::S3, StepId::Details);
        assert!(v.begin());
        assert!(!v.begin(), "Second submission while waiting must be ignored");
        v.finish();
        assert!(v.begin());
    }

    #[test]
    fn test_connection_validates_before_sending() {
        let messages = Messages::builtin();
        let mut v = view(FlowKind::S3, StepId::Details);

        assert!(v.begin_test_connection(&no_files(), &messages).is_none());
        assert_eq!(
            v.message.as_ref().map(|m| m.kind),
            Some(MessageKind::Error)
        );
        assert!(!v.waiting);
    }

    #[test]
    fn failed_test_sets_an_error_and_clears_waiting() {
        let messages = Messages::builtin();
        let ctx = WizardContext::new(FlowKind::S3, FlowType::New);
        let mut v = view(FlowKind::S3, StepId::Details);
        v.set_field(FieldId::AccessKey, "AKIA");
        v.set_field(FieldId::SecretKey, "s");
        assert!(v.begin_test_connection(&no_files(), &messages).is_some());
        assert!(v.waiting);

        v.finish_test_connection(Err(ApiError::Server { status: 500 }), &ctx, &messages);

        assert!(!v.waiting);
        let msg = v.message.expect("message");
        assert_eq!(msg.kind, MessageKind::Error);
        assert_eq!(msg.text, messages.get("error.generic"));
    }

    #[test]
    fn successful_test_names_the_apply_button_when_modifying() {
        let messages = Messages::builtin();
        let mut ctx = WizardContext::new(FlowKind::S3, FlowType::New);
        ctx.state = EditState::Modify;
        let mut v = StepView::on_init(StepId::Details, &ctx, &messages);
        v.waiting = true;

        v.finish_test_connection(Ok(true), &ctx, &messages);

        let msg = v.message.expect("message");
        assert_eq!(msg.kind, MessageKind::Success);
        assert_eq!(
            msg.text,
            messages.format(
                "connection.test.success",
                &[messages.get("controls.apply.label").as_str()]
            )
        );
    }
}
