// Connection profile wire models (S3 and catalog)

use super::context::{FlowKind, Modes, S3AuthType, S3ConnectionType};
use crate::wizard::form::{FieldId, Form};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SIGNATURE_VERSION: &str = "AWSS3V4SignerType";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Details {
    pub name: String,
    pub description: String,
    /// 0 = access/secret key, 1 = credentials file profile.
    pub auth_type: u8,
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
    pub profile_name: String,
    pub credentials_file_path: String,
    pub region: String,
    /// 0 = default AWS endpoint, 1 = custom endpoint.
    pub connection_type: u8,
    pub endpoint: String,
    pub path_style_access: String,
    pub signature_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogDetails {
    pub name: String,
    pub description: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionDetails {
    S3(S3Details),
    Catalog(CatalogDetails),
}

impl ConnectionDetails {
    pub fn name(&self) -> &str {
        match self {
            ConnectionDetails::S3(d) => &d.name,
            ConnectionDetails::Catalog(d) => &d.name,
        }
    }

    /// Assemble the outbound details for a connection flow.
    pub fn from_form(flow: FlowKind, form: &Form, modes: &Modes) -> Option<Self> {
        let v = |f| form.value(f).trim().to_string();
        match flow {
            FlowKind::S3 => {
                let mut d = S3Details {
                    name: v(FieldId::Name),
                    description: v(FieldId::Description),
                    auth_type: modes.s3_auth.wire_value(),
                    region: v(FieldId::Region),
                    connection_type: modes.s3_connection.wire_value(),
                    ..Default::default()
                };
                match modes.s3_auth {
                    S3AuthType::AccessKey => {
                        d.access_key = v(FieldId::AccessKey);
                        d.secret_key = v(FieldId::SecretKey);
                        d.session_token = v(FieldId::SessionToken);
                    }
                    S3AuthType::CredentialsFile => {
                        d.profile_name = v(FieldId::ProfileName);
                        d.credentials_file_path = v(FieldId::CredentialsFilePath);
                    }
                }
                if modes.s3_connection == S3ConnectionType::Custom {
                    d.endpoint = v(FieldId::Endpoint);
                    d.path_style_access = v(FieldId::PathStyleAccess);
                    d.signature_version = v(FieldId::SignatureVersion);
                }
                Some(ConnectionDetails::S3(d))
            }
            FlowKind::Catalog => Some(ConnectionDetails::Catalog(CatalogDetails {
                name: v(FieldId::Name),
                description: v(FieldId::Description),
                url: v(FieldId::Url),
                username: v(FieldId::Username),
                password: v(FieldId::Password),
            })),
            FlowKind::HadoopCluster | FlowKind::Driver => None,
        }
    }

    /// Load a persisted record into the form and mode selectors.
    pub fn apply_to(&self, form: &mut Form, modes: &mut Modes) {
        match self {
            ConnectionDetails::S3(d) => {
                modes.s3_auth = S3AuthType::from_wire(d.auth_type);
                modes.s3_connection = S3ConnectionType::from_wire(d.connection_type);
                let pairs = [
                    (FieldId::Name, &d.name),
                    (FieldId::Description, &d.description),
                    (FieldId::AccessKey, &d.access_key),
                    (FieldId::SecretKey, &d.secret_key),
                    (FieldId::SessionToken, &d.session_token),
                    (FieldId::ProfileName, &d.profile_name),
                    (FieldId::CredentialsFilePath, &d.credentials_file_path),
                    (FieldId::Region, &d.region),
                    (FieldId::Endpoint, &d.endpoint),
                    (FieldId::PathStyleAccess, &d.path_style_access),
                    (FieldId::SignatureVersion, &d.signature_version),
                ];
                for (f, val) in pairs {
                    form.set(f, val.clone());
                }
            }
            ConnectionDetails::Catalog(d) => {
                let pairs = [
                    (FieldId::Name, &d.name),
                    (FieldId::Description, &d.description),
                    (FieldId::Url, &d.url),
                    (FieldId::Username, &d.username),
                    (FieldId::Password, &d.password),
                ];
                for (f, val) in pairs {
                    form.set(f, val.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_key_auth_serializes_numeric_types() {
        let mut form = Form::default();
        form.set(FieldId::Name, "lake");
        form.set(FieldId::AccessKey, "AKIAEXAMPLE");
        form.set(FieldId::SecretKey, "secret");
        form.set(FieldId::ProfileName, "stale-profile");

        let details =
            ConnectionDetails::from_form(FlowKind::S3, &form, &Modes::default()).expect("s3");
        let v = serde_json::to_value(&details).expect("json");

        assert_eq!(v["type"], "s3");
        assert_eq!(v["authType"], 0);
        assert_eq!(v["connectionType"], 0);
        assert_eq!(v["accessKey"], "AKIAEXAMPLE");
        assert_eq!(v["profileName"], "", "Inactive auth fields must not be sent");
    }

    #[test]
    fn custom_endpoint_fields_follow_connection_type() {
        let mut form = Form::default();
        form.set(FieldId::Endpoint, "http://minio:9000");
        form.set(FieldId::PathStyleAccess, "true");
        form.set(FieldId::SignatureVersion, DEFAULT_SIGNATURE_VERSION);
        let modes = Modes {
            s3_connection: S3ConnectionType::Custom,
            ..Default::default()
        };

        let Some(ConnectionDetails::S3(d)) = ConnectionDetails::from_form(FlowKind::S3, &form, &modes)
        else {
            panic!("expected s3 details");
        };
        assert_eq!(d.connection_type, 1);
        assert_eq!(d.endpoint, "http://minio:9000");
    }

    #[test]
    fn catalog_round_trips_through_the_form() {
        let body = r#"{"type":"catalog","name":"cat","url":"https://catalog","username":"u","password":"p"}"#;
        let details: ConnectionDetails = serde_json::from_str(body).expect("catalog");
        assert_eq!(details.name(), "cat");

        let mut form = Form::default();
        let mut modes = Modes::default();
        details.apply_to(&mut form, &mut modes);

        assert_eq!(
            ConnectionDetails::from_form(FlowKind::Catalog, &form, &modes),
            Some(details)
        );
    }

    #[test]
    fn non_connection_flows_have_no_details() {
        assert!(ConnectionDetails::from_form(
            FlowKind::HadoopCluster,
            &Form::default(),
            &Modes::default()
        )
        .is_none());
    }
}
