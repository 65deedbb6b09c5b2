// Per-flow step schema
//
// Declares, for every (flow, step): the fields shown, the mode selectors, field defaults,
// the required-field rule for the active modes, the buttons, and the step graph.
// `StepView` and `Navigator` are generic; everything flow-specific lives here.

use super::form::{FieldId, Rule};
use crate::models::connection::DEFAULT_SIGNATURE_VERSION;
use crate::models::context::{
    EditState, FlowKind, FlowType, ImportSource, KerberosSubType, Mode, ModeKind, Modes,
    S3AuthType, S3ConnectionType, SecurityType, WizardContext,
};
use crate::models::files::FileSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    // Connection flows
    Intro,
    Details,
    Summary,
    Saved,
    // Named cluster flow
    NewEdit,
    Import,
    Security,
    Kerberos,
    Knox,
    Creating,
    Status,
    Testing,
    Results,
    // Driver flow
    AddDriver,
    Installing,
    DriverResult,
}

impl StepId {
    pub const ALL: [StepId; 16] = [
        StepId::Intro,
        StepId::Details,
        StepId::Summary,
        StepId::Saved,
        StepId::NewEdit,
        StepId::Import,
        StepId::Security,
        StepId::Kerberos,
        StepId::Knox,
        StepId::Creating,
        StepId::Status,
        StepId::Testing,
        StepId::Results,
        StepId::AddDriver,
        StepId::Installing,
        StepId::DriverResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Intro => "intro",
            StepId::Details => "details",
            StepId::Summary => "summary",
            StepId::Saved => "saved",
            StepId::NewEdit => "newedit",
            StepId::Import => "import",
            StepId::Security => "security",
            StepId::Kerberos => "kerberos",
            StepId::Knox => "knox",
            StepId::Creating => "creating",
            StepId::Status => "status",
            StepId::Testing => "testing",
            StepId::Results => "results",
            StepId::AddDriver => "adddriver",
            StepId::Installing => "installing",
            StepId::DriverResult => "driverresult",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == v)
    }

    pub fn title_key(self) -> &'static str {
        match self {
            StepId::Intro => "step.intro.title",
            StepId::Details => "step.details.title",
            StepId::Summary => "step.summary.title",
            StepId::Saved => "step.saved.title",
            StepId::NewEdit => "step.newedit.title",
            StepId::Import => "step.import.title",
            StepId::Security => "step.security.title",
            StepId::Kerberos => "step.kerberos.title",
            StepId::Knox => "step.knox.title",
            StepId::Creating => "step.creating.title",
            StepId::Status => "step.status.title",
            StepId::Testing => "step.testing.title",
            StepId::Results => "step.results.title",
            StepId::AddDriver => "step.adddriver.title",
            StepId::Installing => "step.installing.title",
            StepId::DriverResult => "step.driverresult.title",
        }
    }

    /// No forward transition leaves these steps.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepId::Saved | StepId::Status | StepId::Results | StepId::DriverResult
        )
    }

    /// Steps that submit a request as soon as they are entered.
    pub fn submits_on_entry(self) -> bool {
        matches!(
            self,
            StepId::Creating | StepId::Testing | StepId::Installing
        )
    }
}

pub fn entry_step(flow: FlowKind, flow_type: FlowType) -> StepId {
    match (flow, flow_type) {
        (FlowKind::S3 | FlowKind::Catalog, _) => StepId::Intro,
        (FlowKind::HadoopCluster, FlowType::Import) => StepId::Import,
        (FlowKind::HadoopCluster, _) => StepId::NewEdit,
        (FlowKind::Driver, _) => StepId::AddDriver,
    }
}

pub fn fields(flow: FlowKind, step: StepId) -> &'static [FieldId] {
    use FieldId::*;
    match (flow, step) {
        (FlowKind::S3 | FlowKind::Catalog, StepId::Intro) => &[Name, Description],
        (FlowKind::S3, StepId::Details) => &[
            AccessKey,
            SecretKey,
            SessionToken,
            ProfileName,
            CredentialsFilePath,
            Region,
            Endpoint,
            PathStyleAccess,
            SignatureVersion,
        ],
        (FlowKind::Catalog, StepId::Details) => &[Url, Username, Password],
        (_, StepId::NewEdit) => &[
            Name,
            ShimVendor,
            ShimVersion,
            ImportPath,
            HdfsHost,
            HdfsPort,
            HdfsUsername,
            HdfsPassword,
            JobTrackerHost,
            JobTrackerPort,
            ZooKeeperHost,
            ZooKeeperPort,
            OozieUrl,
            KafkaBootstrapServers,
        ],
        (_, StepId::Import) => &[
            Name,
            ShimVendor,
            ShimVersion,
            ImportPath,
            CcfgFilePath,
            HdfsUsername,
            HdfsPassword,
        ],
        (_, StepId::Kerberos) => &[
            KerberosAuthUsername,
            KerberosAuthPassword,
            KerberosImpUsername,
            KerberosImpPassword,
            KeytabAuthFile,
            KeytabImpFile,
        ],
        (_, StepId::Knox) => &[GatewayUrl, GatewayUsername, GatewayPassword],
        (_, StepId::AddDriver) => &[DriverPath],
        _ => &[],
    }
}

pub fn selectors(flow: FlowKind, step: StepId) -> &'static [ModeKind] {
    match (flow, step) {
        (FlowKind::S3, StepId::Details) => &[ModeKind::S3Auth, ModeKind::S3Connection],
        (_, StepId::Import) => &[ModeKind::ImportSource],
        (_, StepId::Security) => &[ModeKind::Security],
        (_, StepId::Kerberos) => &[ModeKind::KerberosSubType],
        _ => &[],
    }
}

pub fn default_value(field: FieldId) -> Option<&'static str> {
    match field {
        FieldId::HdfsPort => Some("8020"),
        FieldId::JobTrackerPort => Some("8032"),
        FieldId::ZooKeeperPort => Some("2181"),
        FieldId::PathStyleAccess => Some("true"),
        FieldId::SignatureVersion => Some(DEFAULT_SIGNATURE_VERSION),
        _ => None,
    }
}

/// Fields that belong to one option of a selector and must not outlive it.
pub fn owned_fields(mode: Mode) -> &'static [FieldId] {
    use FieldId::*;
    match mode {
        Mode::S3Auth(S3AuthType::AccessKey) => &[AccessKey, SecretKey, SessionToken],
        Mode::S3Auth(S3AuthType::CredentialsFile) => &[ProfileName, CredentialsFilePath],
        Mode::S3Connection(S3ConnectionType::Aws) => &[],
        Mode::S3Connection(S3ConnectionType::Custom) => {
            &[Endpoint, PathStyleAccess, SignatureVersion]
        }
        Mode::Security(SecurityType::None) => &[],
        Mode::Security(SecurityType::Kerberos) => &[
            KerberosAuthUsername,
            KerberosAuthPassword,
            KerberosImpUsername,
            KerberosImpPassword,
            KeytabAuthFile,
            KeytabImpFile,
        ],
        Mode::Security(SecurityType::Knox) => &[GatewayUrl, GatewayUsername, GatewayPassword],
        Mode::Kerberos(KerberosSubType::Password) => &[
            KerberosAuthUsername,
            KerberosAuthPassword,
            KerberosImpUsername,
            KerberosImpPassword,
        ],
        Mode::Kerberos(KerberosSubType::Keytab) => &[KeytabAuthFile, KeytabImpFile],
        Mode::Import(ImportSource::SiteXml) => &[ImportPath],
        Mode::Import(ImportSource::ClusterConfig) => &[CcfgFilePath],
    }
}

pub fn owned_files(mode: Mode) -> &'static [FileSlot] {
    match mode {
        Mode::Security(SecurityType::Kerberos) | Mode::Kerberos(KerberosSubType::Keytab) => {
            &[FileSlot::KeytabAuth, FileSlot::KeytabImp]
        }
        Mode::Import(ImportSource::SiteXml) => &[FileSlot::SiteFiles],
        _ => &[],
    }
}

/// Step fields minus those owned by an inactive option of one of the step's selectors.
pub fn visible_fields(flow: FlowKind, step: StepId, modes: &Modes) -> Vec<FieldId> {
    let sels = selectors(flow, step);
    fields(flow, step)
        .iter()
        .copied()
        .filter(|f| {
            sels.iter().all(|kind| {
                let active = modes.get(*kind);
                kind.options()
                    .iter()
                    .filter(|m| **m != active)
                    .all(|m| !owned_fields(*m).contains(f) || owned_fields(active).contains(f))
            })
        })
        .collect()
}

pub fn required(flow: FlowKind, step: StepId, modes: &Modes) -> Rule {
    use FieldId::*;
    match (flow, step) {
        (FlowKind::S3 | FlowKind::Catalog, StepId::Intro) => Rule::Filled(Name),
        (FlowKind::S3, StepId::Details) => {
            let auth = match modes.s3_auth {
                S3AuthType::AccessKey => Rule::all_filled(&[AccessKey, SecretKey]),
                S3AuthType::CredentialsFile => Rule::all_filled(&[ProfileName, CredentialsFilePath]),
            };
            let connection = match modes.s3_connection {
                S3ConnectionType::Aws => Rule::Always,
                S3ConnectionType::Custom => {
                    Rule::all_filled(&[Endpoint, PathStyleAccess, SignatureVersion])
                }
            };
            Rule::All(vec![auth, connection])
        }
        (FlowKind::Catalog, StepId::Details) => Rule::all_filled(&[Url, Username, Password]),
        (_, StepId::NewEdit) => Rule::All(vec![
            Rule::Filled(Name),
            Rule::Any(vec![
                Rule::all_filled(&[HdfsHost, HdfsPort]),
                Rule::all_filled(&[JobTrackerHost, JobTrackerPort]),
                Rule::all_filled(&[ZooKeeperHost, ZooKeeperPort]),
                Rule::Filled(OozieUrl),
                Rule::Filled(KafkaBootstrapServers),
            ]),
        ]),
        (_, StepId::Import) => {
            let path = match modes.import_source {
                ImportSource::SiteXml => ImportPath,
                ImportSource::ClusterConfig => CcfgFilePath,
            };
            Rule::all_filled(&[Name, path])
        }
        (_, StepId::Kerberos) => match modes.kerberos {
            KerberosSubType::Password => Rule::All(vec![
                Rule::Paired(KerberosAuthUsername, KerberosAuthPassword),
                Rule::Paired(KerberosImpUsername, KerberosImpPassword),
                Rule::Any(vec![
                    Rule::Filled(KerberosAuthUsername),
                    Rule::Filled(KerberosImpUsername),
                ]),
            ]),
            KerberosSubType::Keytab => Rule::Any(vec![
                Rule::Staged(FileSlot::KeytabAuth),
                Rule::Filled(KeytabAuthFile),
            ]),
        },
        (_, StepId::Knox) => Rule::all_filled(&[GatewayUrl, GatewayUsername, GatewayPassword]),
        (_, StepId::AddDriver) => Rule::Staged(FileSlot::Driver),
        _ => Rule::Always,
    }
}

pub fn next_step(ctx: &WizardContext, step: StepId) -> Option<StepId> {
    let next = match step {
        StepId::Intro if ctx.state == EditState::Modify => StepId::Summary,
        StepId::Intro => StepId::Details,
        StepId::Details => StepId::Summary,
        StepId::Summary => StepId::Saved,
        StepId::NewEdit | StepId::Import if ctx.secure_enabled => StepId::Security,
        StepId::NewEdit | StepId::Import => StepId::Creating,
        StepId::Security => match ctx.modes.security {
            SecurityType::None => StepId::Creating,
            SecurityType::Kerberos => StepId::Kerberos,
            SecurityType::Knox => StepId::Knox,
        },
        StepId::Kerberos | StepId::Knox => StepId::Creating,
        StepId::Creating => StepId::Status,
        StepId::Testing => StepId::Results,
        StepId::AddDriver => StepId::Installing,
        StepId::Installing => StepId::DriverResult,
        StepId::Status => StepId::Testing,
        StepId::Saved | StepId::Results | StepId::DriverResult => return None,
    };
    Some(next)
}

pub fn prev_step(ctx: &WizardContext, step: StepId) -> Option<StepId> {
    match step {
        StepId::Details => Some(StepId::Intro),
        StepId::Summary => Some(StepId::Details),
        StepId::Security if ctx.flow_type == FlowType::Import => Some(StepId::Import),
        StepId::Security => Some(StepId::NewEdit),
        StepId::Kerberos | StepId::Knox => Some(StepId::Security),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    Back,
    Next,
    Test,
    Cancel,
    Close,
    EditCluster,
    TestCluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub action: ButtonAction,
    pub label_key: &'static str,
}

const fn button(action: ButtonAction, label_key: &'static str) -> Button {
    Button { action, label_key }
}

/// Label of the forward button: "Apply" when editing from the summary.
pub fn next_label_key(ctx: &WizardContext, step: StepId) -> &'static str {
    match step {
        StepId::Summary => "controls.finish.label",
        StepId::AddDriver => "controls.install.label",
        _ if ctx.state == EditState::Modify => "controls.apply.label",
        _ => "controls.next.label",
    }
}

pub fn buttons(ctx: &WizardContext, step: StepId) -> Vec<Button> {
    let back = button(ButtonAction::Back, "controls.back.label");
    let next = button(ButtonAction::Next, next_label_key(ctx, step));
    let cancel = button(ButtonAction::Cancel, "controls.cancel.label");
    let close = button(ButtonAction::Close, "controls.close.label");
    let edit = button(ButtonAction::EditCluster, "controls.edit.cluster.label");

    match step {
        StepId::Intro | StepId::NewEdit | StepId::Import | StepId::AddDriver => vec![next, cancel],
        StepId::Details => vec![
            button(ButtonAction::Test, "controls.test.label"),
            back,
            next,
            cancel,
        ],
        StepId::Summary | StepId::Security | StepId::Kerberos | StepId::Knox => {
            vec![back, next, cancel]
        }
        StepId::Creating | StepId::Testing | StepId::Installing => vec![cancel],
        StepId::Status => {
            let saved = ctx.save_outcome.as_ref().map(|o| o.success).unwrap_or(false);
            if saved {
                vec![
                    edit,
                    button(ButtonAction::TestCluster, "controls.test.cluster.label"),
                    close,
                ]
            } else {
                vec![edit, close]
            }
        }
        StepId::Results => vec![edit, close],
        StepId::Saved | StepId::DriverResult => vec![close],
    }
}
