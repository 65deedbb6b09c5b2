// Form fields and required-field rules
//
// Every editable value in every flow is addressed by a `FieldId`. A step's
// "can advance" predicate is a `Rule` evaluated over the form and the staged files.

use crate::models::files::{FileSlot, StagedFiles};
use crate::utils::validation::is_blank;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    // Shared
    Name,
    Description,

    // S3
    AccessKey,
    SecretKey,
    SessionToken,
    ProfileName,
    CredentialsFilePath,
    Region,
    Endpoint,
    PathStyleAccess,
    SignatureVersion,

    // Catalog
    Url,
    Username,
    Password,

    // Named cluster
    ShimVendor,
    ShimVersion,
    ImportPath,
    CcfgFilePath,
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

    // Kerberos
    KerberosAuthUsername,
    KerberosAuthPassword,
    KerberosImpUsername,
    KerberosImpPassword,
    KeytabAuthFile,
    KeytabImpFile,

    // Knox
    GatewayUrl,
    GatewayUsername,
    GatewayPassword,

    // Driver
    DriverPath,
}

impl FieldId {
    /// Message key of the field's label.
    pub fn label_key(self) -> &'static str {
        match self {
            FieldId::Name => "field.name",
            FieldId::Description => "field.description",
            FieldId::AccessKey => "field.access.key",
            FieldId::SecretKey => "field.secret.key",
            FieldId::SessionToken => "field.session.token",
            FieldId::ProfileName => "field.profile.name",
            FieldId::CredentialsFilePath => "field.credentials.file",
            FieldId::Region => "field.region",
            FieldId::Endpoint => "field.endpoint",
            FieldId::PathStyleAccess => "field.path.style.access",
            FieldId::SignatureVersion => "field.signature.version",
            FieldId::Url => "field.url",
            FieldId::Username => "field.username",
            FieldId::Password => "field.password",
            FieldId::ShimVendor => "field.shim.vendor",
            FieldId::ShimVersion => "field.shim.version",
            FieldId::ImportPath => "field.import.path",
            FieldId::CcfgFilePath => "field.ccfg.path",
            FieldId::HdfsHost => "field.hdfs.host",
            FieldId::HdfsPort => "field.hdfs.port",
            FieldId::HdfsUsername => "field.hdfs.username",
            FieldId::HdfsPassword => "field.hdfs.password",
            FieldId::JobTrackerHost => "field.job.tracker.host",
            FieldId::JobTrackerPort => "field.job.tracker.port",
            FieldId::ZooKeeperHost => "field.zookeeper.host",
            FieldId::ZooKeeperPort => "field.zookeeper.port",
            FieldId::OozieUrl => "field.oozie.url",
            FieldId::KafkaBootstrapServers => "field.kafka.servers",
            FieldId::KerberosAuthUsername => "field.kerberos.auth.username",
            FieldId::KerberosAuthPassword => "field.kerberos.auth.password",
            FieldId::KerberosImpUsername => "field.kerberos.imp.username",
            FieldId::KerberosImpPassword => "field.kerberos.imp.password",
            FieldId::KeytabAuthFile => "field.keytab.auth",
            FieldId::KeytabImpFile => "field.keytab.imp",
            FieldId::GatewayUrl => "field.gateway.url",
            FieldId::GatewayUsername => "field.gateway.username",
            FieldId::GatewayPassword => "field.gateway.password",
            FieldId::DriverPath => "field.driver.path",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(
            self,
            FieldId::SecretKey
                | FieldId::SessionToken
                | FieldId::Password
                | FieldId::HdfsPassword
                | FieldId::KerberosAuthPassword
                | FieldId::KerberosImpPassword
                | FieldId::GatewayPassword
        )
    }

    pub fn is_port(self) -> bool {
        matches!(
            self,
            FieldId::HdfsPort | FieldId::JobTrackerPort | FieldId::ZooKeeperPort
        )
    }

    /// Fields edited through the path picker rather than typed.
    pub fn is_path(self) -> bool {
        matches!(
            self,
            FieldId::CredentialsFilePath
                | FieldId::ImportPath
                | FieldId::CcfgFilePath
                | FieldId::KeytabAuthFile
                | FieldId::KeytabImpFile
                | FieldId::DriverPath
        )
    }
}

/// Field values of one wizard run. Absent and empty are treated alike by rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: BTreeMap<FieldId, String>,
}

impl Form {
    pub fn get(&self, field: FieldId) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Value or empty string.
    pub fn value(&self, field: FieldId) -> &str {
        self.get(field).unwrap_or_default()
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn clear(&mut self, field: FieldId) {
        self.values.remove(&field);
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.values.contains_key(&field)
    }

    pub fn is_filled(&self, field: FieldId) -> bool {
        !is_blank(self.get(field))
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    /// Non-empty value, trimmed, or `None`.
    pub fn non_empty(&self, field: FieldId) -> Option<String> {
        self.get(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Required-field predicate for a step in a given mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Always,
    Filled(FieldId),
    Staged(FileSlot),
    /// Both filled or both empty.
    Paired(FieldId, FieldId),
    All(Vec<Rule>),
    Any(Vec<Rule>),
}

impl Rule {
    pub fn all_filled(fields: &[FieldId]) -> Rule {
        Rule::All(fields.iter().copied().map(Rule::Filled).collect())
    }

    pub fn eval(&self, form: &Form, files: &StagedFiles) -> bool {
        match self {
            Rule::Always => true,
            Rule::Filled(f) => form.is_filled(*f),
            Rule::Staged(slot) => files.is_staged(*slot),
            Rule::Paired(a, b) => form.is_filled(*a) == form.is_filled(*b),
            Rule::All(rules) => rules.iter().all(|r| r.eval(form, files)),
            Rule::Any(rules) => rules.iter().any(|r| r.eval(form, files)),
        }
    }

    /// Fields the rule reads, in declaration order.
    pub fn fields(&self) -> Vec<FieldId> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<FieldId>) {
        match self {
            Rule::Always | Rule::Staged(_) => {}
            Rule::Filled(f) => push_unique(out, *f),
            Rule::Paired(a, b) => {
                push_unique(out, *a);
                push_unique(out, *b);
            }
            Rule::All(rules) | Rule::Any(rules) => {
                for r in rules {
                    r.collect_fields(out);
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<FieldId>, f: FieldId) {
    if !out.contains(&f) {
        out.push(f);
    }
}
