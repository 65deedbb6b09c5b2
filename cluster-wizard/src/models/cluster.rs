// Named cluster wire model and typed security view

use super::context::{ImportSource, KerberosSubType, Modes, SecurityType};
use crate::wizard::form::{FieldId, Form};
use serde::{Deserialize, Serialize};

/// A vendor/version descriptor selecting the cluster driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimIdentifier {
    pub id: String,
    pub vendor: String,
    pub version: String,
}

impl ShimIdentifier {
    /// Vendors in first-seen order, without duplicates.
    pub fn vendors(shims: &[ShimIdentifier]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in shims {
            if !out.contains(&s.vendor) {
                out.push(s.vendor.clone());
            }
        }
        out
    }

    pub fn versions_for(shims: &[ShimIdentifier], vendor: &str) -> Vec<String> {
        shims
            .iter()
            .filter(|s| s.vendor == vendor)
            .map(|s| s.version.clone())
            .collect()
    }

    pub fn find<'a>(
        shims: &'a [ShimIdentifier],
        vendor: &str,
        version: &str,
    ) -> Option<&'a ShimIdentifier> {
        shims
            .iter()
            .find(|s| s.vendor == vendor && s.version == version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KerberosConfig {
    Password {
        auth_username: String,
        auth_password: String,
        imp_username: String,
        imp_password: String,
    },
    Keytab {
        auth_keytab: String,
        imp_keytab: String,
    },
}

/// The security sub-configuration of a cluster. Only the selected type's values exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityConfig {
    None,
    Kerberos(KerberosConfig),
    Knox {
        gateway_url: String,
        gateway_username: String,
        gateway_password: String,
    },
}

impl SecurityConfig {
    pub fn from_form(form: &Form, modes: &Modes) -> Self {
        let v = |f| form.value(f).to_string();
        match modes.security {
            SecurityType::None => SecurityConfig::None,
            SecurityType::Kerberos => match modes.kerberos {
                KerberosSubType::Password => SecurityConfig::Kerberos(KerberosConfig::Password {
                    auth_username: v(FieldId::KerberosAuthUsername),
                    auth_password: v(FieldId::KerberosAuthPassword),
                    imp_username: v(FieldId::KerberosImpUsername),
                    imp_password: v(FieldId::KerberosImpPassword),
                }),
                KerberosSubType::Keytab => SecurityConfig::Kerberos(KerberosConfig::Keytab {
                    auth_keytab: v(FieldId::KeytabAuthFile),
                    imp_keytab: v(FieldId::KeytabImpFile),
                }),
            },
            SecurityType::Knox => SecurityConfig::Knox {
                gateway_url: v(FieldId::GatewayUrl),
                gateway_username: v(FieldId::GatewayUsername),
                gateway_password: v(FieldId::GatewayPassword),
            },
        }
    }

    pub fn security_type(&self) -> SecurityType {
        match self {
            SecurityConfig::None => SecurityType::None,
            SecurityConfig::Kerberos(_) => SecurityType::Kerberos,
            SecurityConfig::Knox { .. } => SecurityType::Knox,
        }
    }
}

/// Named cluster as exchanged with the server (camelCase JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamedCluster {
    pub name: String,
    pub shim_identifier: String,
    pub shim_vendor: String,
    pub shim_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    pub hdfs_host: String,
    pub hdfs_port: String,
    pub hdfs_username: String,
    pub hdfs_password: String,
    pub job_tracker_host: String,
    pub job_tracker_port: String,
    pub zoo_keeper_host: String,
    pub zoo_keeper_port: String,
    pub oozie_url: String,
    pub kafka_bootstrap_servers: String,
    pub security_type: SecurityType,
    pub kerberos_sub_type: KerberosSubType,
    pub kerberos_authentication_username: String,
    pub kerberos_authentication_password: String,
    pub kerberos_impersonation_username: String,
    pub kerberos_impersonation_password: String,
    pub keytab_auth_file: String,
    pub keytab_imp_file: String,
    pub gateway_url: String,
    pub gateway_username: String,
    pub gateway_password: String,
}

// Field <-> wire key table for the plain string fields.
const PLAIN_FIELDS: &[FieldId] = &[
    FieldId::Name,
    FieldId::ShimVendor,
    FieldId::ShimVersion,
    FieldId::HdfsHost,
    FieldId::HdfsPort,
    FieldId::HdfsUsername,
    FieldId::HdfsPassword,
    FieldId::JobTrackerHost,
    FieldId::JobTrackerPort,
    FieldId::ZooKeeperHost,
    FieldId::ZooKeeperPort,
    FieldId::OozieUrl,
    FieldId::KafkaBootstrapServers,
];

impl NamedCluster {
    fn plain_mut(&mut self, field: FieldId) -> Option<&mut String> {
        Some(match field {
            FieldId::Name => &mut self.name,
            FieldId::ShimVendor => &mut self.shim_vendor,
            FieldId::ShimVersion => &mut self.shim_version,
            FieldId::HdfsHost => &mut self.hdfs_host,
            FieldId::HdfsPort => &mut self.hdfs_port,
            FieldId::HdfsUsername => &mut self.hdfs_username,
            FieldId::HdfsPassword => &mut self.hdfs_password,
            FieldId::JobTrackerHost => &mut self.job_tracker_host,
            FieldId::JobTrackerPort => &mut self.job_tracker_port,
            FieldId::ZooKeeperHost => &mut self.zoo_keeper_host,
            FieldId::ZooKeeperPort => &mut self.zoo_keeper_port,
            FieldId::OozieUrl => &mut self.oozie_url,
            FieldId::KafkaBootstrapServers => &mut self.kafka_bootstrap_servers,
            _ => return None,
        })
    }

    /// Assemble the outbound record. Only the selected security type's values are sent.
    pub fn from_form(
        form: &Form,
        modes: &Modes,
        old_name: Option<&str>,
        shims: &[ShimIdentifier],
    ) -> Self {
        let mut wire = NamedCluster::default();
        for &f in PLAIN_FIELDS {
            if let Some(slot) = wire.plain_mut(f) {
                *slot = form.value(f).trim().to_string();
            }
        }

        if let Some(shim) = ShimIdentifier::find(shims, &wire.shim_vendor, &wire.shim_version) {
            wire.shim_identifier = shim.id.clone();
        }
        wire.old_name = old_name.map(str::to_string);

        let import_field = match modes.import_source {
            ImportSource::SiteXml => FieldId::ImportPath,
            ImportSource::ClusterConfig => FieldId::CcfgFilePath,
        };
        wire.import_path = form.non_empty(import_field);

        let security = SecurityConfig::from_form(form, modes);
        wire.security_type = security.security_type();
        wire.kerberos_sub_type = modes.kerberos;
        match security {
            SecurityConfig::None => {}
            SecurityConfig::Kerberos(KerberosConfig::Password {
                auth_username,
                auth_password,
                imp_username,
                imp_password,
            }) => {
                wire.kerberos_authentication_username = auth_username;
                wire.kerberos_authentication_password = auth_password;
                wire.kerberos_impersonation_username = imp_username;
                wire.kerberos_impersonation_password = imp_password;
            }
            SecurityConfig::Kerberos(KerberosConfig::Keytab {
                auth_keytab,
                imp_keytab,
            }) => {
                wire.keytab_auth_file = auth_keytab;
                wire.keytab_imp_file = imp_keytab;
            }
            SecurityConfig::Knox {
                gateway_url,
                gateway_username,
                gateway_password,
            } => {
                wire.gateway_url = gateway_url;
                wire.gateway_username = gateway_username;
                wire.gateway_password = gateway_password;
            }
        }
        wire
    }

    /// Load a server record into the form and mode selectors.
    pub fn apply_to(&self, form: &mut Form, modes: &mut Modes) {
        let mut copy = self.clone();
        for &f in PLAIN_FIELDS {
            if let Some(slot) = copy.plain_mut(f) {
                form.set(f, std::mem::take(slot));
            }
        }
        if let Some(p) = &self.import_path {
            form.set(FieldId::ImportPath, p.clone());
        }
        let pairs = [
            (FieldId::KerberosAuthUsername, &self.kerberos_authentication_username),
            (FieldId::KerberosAuthPassword, &self.kerberos_authentication_password),
            (FieldId::KerberosImpUsername, &self.kerberos_impersonation_username),
            (FieldId::KerberosImpPassword, &self.kerberos_impersonation_password),
            (FieldId::KeytabAuthFile, &self.keytab_auth_file),
            (FieldId::KeytabImpFile, &self.keytab_imp_file),
            (FieldId::GatewayUrl, &self.gateway_url),
            (FieldId::GatewayUsername, &self.gateway_username),
            (FieldId::GatewayPassword, &self.gateway_password),
        ];
        for (f, v) in pairs {
            form.set(f, v.clone());
        }
        modes.security = self.security_type;
        modes.kerberos = self.kerberos_sub_type;
    }
}

/// Body of the create/edit/duplicate/import responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveClusterResponse {
    pub named_cluster: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecureResponse {
    pub secure_enabled: String,
}

impl SecureResponse {
    pub fn is_enabled(&self) -> bool {
        self.secure_enabled.trim().eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallDriverResponse {
    pub installed: bool,
}
