// Wizard context
//
// The single payload threaded through every step of one wizard run. The navigator
// owns it; steps read from it on entry and write back into it on every transition.

use super::cluster::ShimIdentifier;
use super::files::StagedFiles;
use super::test_results::TestCategory;
use crate::wizard::form::Form;
use serde::{Deserialize, Serialize};

/// Which wizard is running. Selects the step schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    S3,
    Catalog,
    HadoopCluster,
    Driver,
}

impl FlowKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(FlowKind::S3),
            "catalog" => Some(FlowKind::Catalog),
            "cluster" | "hadoop" | "hadoop-cluster" => Some(FlowKind::HadoopCluster),
            "driver" => Some(FlowKind::Driver),
            _ => None,
        }
    }

    pub fn is_connection(self) -> bool {
        matches!(self, FlowKind::S3 | FlowKind::Catalog)
    }

    pub fn title_key(self) -> &'static str {
        match self {
            FlowKind::S3 => "s3.title",
            FlowKind::Catalog => "catalog.title",
            FlowKind::HadoopCluster => "hadoop.cluster.title",
            FlowKind::Driver => "driver.title",
        }
    }
}

/// Which backend operation the run ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    New,
    Edit,
    Duplicate,
    Import,
}

impl FlowType {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowType::New => "new",
            FlowType::Edit => "edit",
            FlowType::Duplicate => "duplicate",
            FlowType::Import => "import",
        }
    }
}

/// Selects button labels and where "next" goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditState {
    New,
    Edit,
    /// Editing from the summary; "next" returns to it.
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum S3AuthType {
    #[default]
    AccessKey,
    CredentialsFile,
}

impl S3AuthType {
    pub fn wire_value(self) -> u8 {
        match self {
            S3AuthType::AccessKey => 0,
            S3AuthType::CredentialsFile => 1,
        }
    }

    pub fn from_wire(value: u8) -> Self {
        if value == 1 {
            S3AuthType::CredentialsFile
        } else {
            S3AuthType::AccessKey
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum S3ConnectionType {
    #[default]
    Aws,
    Custom,
}

impl S3ConnectionType {
    pub fn wire_value(self) -> u8 {
        match self {
            S3ConnectionType::Aws => 0,
            S3ConnectionType::Custom => 1,
        }
    }

    pub fn from_wire(value: u8) -> Self {
        if value == 1 {
            S3ConnectionType::Custom
        } else {
            S3ConnectionType::Aws
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    None,
    Kerberos,
    Knox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KerberosSubType {
    #[default]
    Password,
    Keytab,
}

/// Where an imported cluster's configuration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImportSource {
    #[default]
    SiteXml,
    ClusterConfig,
}

/// A mode selector shown on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    S3Auth,
    S3Connection,
    Security,
    KerberosSubType,
    ImportSource,
}

impl ModeKind {
    pub fn label_key(self) -> &'static str {
        match self {
            ModeKind::S3Auth => "mode.s3.auth",
            ModeKind::S3Connection => "mode.s3.connection",
            ModeKind::Security => "mode.security",
            ModeKind::KerberosSubType => "mode.kerberos.subtype",
            ModeKind::ImportSource => "mode.import.source",
        }
    }

    pub fn options(self) -> &'static [Mode] {
        match self {
            ModeKind::S3Auth => &[
                Mode::S3Auth(S3AuthType::AccessKey),
                Mode::S3Auth(S3AuthType::CredentialsFile),
            ],
            ModeKind::S3Connection => &[
                Mode::S3Connection(S3ConnectionType::Aws),
                Mode::S3Connection(S3ConnectionType::Custom),
            ],
            ModeKind::Security => &[
                Mode::Security(SecurityType::None),
                Mode::Security(SecurityType::Kerberos),
                Mode::Security(SecurityType::Knox),
            ],
            ModeKind::KerberosSubType => &[
                Mode::Kerberos(KerberosSubType::Password),
                Mode::Kerberos(KerberosSubType::Keytab),
            ],
            ModeKind::ImportSource => &[
                Mode::Import(ImportSource::SiteXml),
                Mode::Import(ImportSource::ClusterConfig),
            ],
        }
    }
}

/// One selected option of one selector. Stable tag, never a display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    S3Auth(S3AuthType),
    S3Connection(S3ConnectionType),
    Security(SecurityType),
    Kerberos(KerberosSubType),
    Import(ImportSource),
}

impl Mode {
    pub fn kind(self) -> ModeKind {
        match self {
            Mode::S3Auth(_) => ModeKind::S3Auth,
            Mode::S3Connection(_) => ModeKind::S3Connection,
            Mode::Security(_) => ModeKind::Security,
            Mode::Kerberos(_) => ModeKind::KerberosSubType,
            Mode::Import(_) => ModeKind::ImportSource,
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Mode::S3Auth(S3AuthType::AccessKey) => "mode.s3.auth.keys",
            Mode::S3Auth(S3AuthType::CredentialsFile) => "mode.s3.auth.profile",
            Mode::S3Connection(S3ConnectionType::Aws) => "mode.s3.connection.aws",
            Mode::S3Connection(S3ConnectionType::Custom) => "mode.s3.connection.custom",
            Mode::Security(SecurityType::None) => "mode.security.none",
            Mode::Security(SecurityType::Kerberos) => "mode.security.kerberos",
            Mode::Security(SecurityType::Knox) => "mode.security.knox",
            Mode::Kerberos(KerberosSubType::Password) => "mode.kerberos.password",
            Mode::Kerberos(KerberosSubType::Keytab) => "mode.kerberos.keytab",
            Mode::Import(ImportSource::SiteXml) => "mode.import.site",
            Mode::Import(ImportSource::ClusterConfig) => "mode.import.ccfg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modes {
    pub s3_auth: S3AuthType,
    pub s3_connection: S3ConnectionType,
    pub security: SecurityType,
    pub kerberos: KerberosSubType,
    pub import_source: ImportSource,
}

impl Modes {
    pub fn get(&self, kind: ModeKind) -> Mode {
        match kind {
            ModeKind::S3Auth => Mode::S3Auth(self.s3_auth),
            ModeKind::S3Connection => Mode::S3Connection(self.s3_connection),
            ModeKind::Security => Mode::Security(self.security),
            ModeKind::KerberosSubType => Mode::Kerberos(self.kerberos),
            ModeKind::ImportSource => Mode::Import(self.import_source),
        }
    }

    /// Set a selector, returning the option it replaced.
    pub fn set(&mut self, mode: Mode) -> Mode {
        let previous = self.get(mode.kind());
        match mode {
            Mode::S3Auth(v) => self.s3_auth = v,
            Mode::S3Connection(v) => self.s3_connection = v,
            Mode::Security(v) => self.security = v,
            Mode::Kerberos(v) => self.kerberos = v,
            Mode::Import(v) => self.import_source = v,
        }
        previous
    }
}

/// Values handed in by whoever opened the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Existing record to edit.
    pub name: Option<String>,
    /// With `name`: duplicate the record under this name.
    pub duplicate_name: Option<String>,
    pub connected_to_repo: bool,
}

/// Result of the save submitted from the creating step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub name: String,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct WizardContext {
    pub flow: FlowKind,
    pub flow_type: FlowType,
    pub state: EditState,
    pub model: Form,
    pub modes: Modes,
    pub files: StagedFiles,
    pub old_name: Option<String>,
    pub created: bool,
    pub connected_to_repo: bool,
    pub secure_enabled: bool,
    pub shims: Vec<ShimIdentifier>,
    pub launch: LaunchParams,
    pub save_outcome: Option<SaveOutcome>,
    pub test_results: Vec<TestCategory>,
    pub driver_installed: Option<bool>,
}

impl WizardContext {
    pub fn new(flow: FlowKind, flow_type: FlowType) -> Self {
        let state = match flow_type {
            FlowType::Edit => EditState::Edit,
            _ => EditState::New,
        };
        Self {
            flow,
            flow_type,
            state,
            model: Form::default(),
            modes: Modes::default(),
            files: StagedFiles::default(),
            old_name: None,
            created: false,
            connected_to_repo: false,
            secure_enabled: false,
            shims: Vec::new(),
            launch: LaunchParams::default(),
            save_outcome: None,
            test_results: Vec::new(),
            driver_installed: None,
        }
    }

    /// Build the context for a launch. A launch name turns a new run into an edit,
    /// and a duplicate name on top of it into a duplicate.
    pub fn launched(flow: FlowKind, import: bool, launch: LaunchParams) -> Self {
        let flow_type = match (&launch.name, &launch.duplicate_name, import) {
            (_, _, true) => FlowType::Import,
            (Some(_), Some(_), _) => FlowType::Duplicate,
            (Some(_), None, _) => FlowType::Edit,
            _ => FlowType::New,
        };
        let mut ctx = Self::new(flow, flow_type);
        ctx.connected_to_repo = launch.connected_to_repo;
        ctx.launch = launch;
        ctx
    }

    /// Header key per flow type ("new.header", "edit.header", ...).
    pub fn header_key(&self) -> String {
        format!("{}.header", self.flow_type.as_str())
    }
}
