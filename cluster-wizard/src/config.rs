// Wizard settings
//
// Layered with the `config` crate: built-in defaults, then an optional TOML file, then
// `CLUSTER_WIZARD__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "CLUSTER_WIZARD";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub base_url: String,
    pub cluster_path: String,
    pub connection_path: String,
}

impl ServerSettings {
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Sent as `cid` on every request when set.
    pub connection_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl HttpSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    pub level: String,
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Debug)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct I18nSettings {
    /// TOML file whose keys override the built-in messages.
    pub messages_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardSettings {
    pub server: ServerSettings,
    #[serde(default)]
    pub http: HttpSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub i18n: I18nSettings,
}

impl WizardSettings {
    /// Load settings. An explicit file must exist; the per-user default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (file, required) = match explicit {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (crate::utils::path_resolver::default_config_file(), false),
        };
        Self::load_from(file.as_deref(), required, ENV_PREFIX)
    }

    pub fn load_from(file: Option<&Path>, required: bool, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.base_url", "http://localhost:9051")?
            .set_default("server.cluster_path", "/cxf/hadoop-cluster")?
            .set_default("server.connection_path", "/cxf/connection")?
            .set_default("logging.level", "debug")?;

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .context("Failed to read wizard settings")?
            .try_deserialize::<WizardSettings>()
            .context("Invalid wizard settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_file() {
        let s = WizardSettings::load_from(None, false, "CW_TEST_DEFAULTS").expect("settings");
        assert_eq!(
            s.server.endpoint(&s.server.cluster_path),
            "http://localhost:9051/cxf/hadoop-cluster"
        );
        assert!(s.http.connection_id.is_none());
        assert!(s.http.timeout().is_none());
        assert_eq!(s.logging.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cluster-wizard.toml");
        let mut f = std::fs::File::create(&path).expect("create");
        writeln!(
            f,
            "[server]\nbase_url = \"https://pdi.example:8443/\"\n\n[http]\nconnection_id = \"repo-1\"\ntimeout_secs = 30\n\n[logging]\nlevel = \"warn\""
        )
        .expect("write");
        drop(f);

        let s = WizardSettings::load_from(Some(&path), true, "CW_TEST_FILE").expect("settings");

        assert_eq!(
            s.server.endpoint("/cxf/connection"),
            "https://pdi.example:8443/cxf/connection"
        );
        assert_eq!(s.http.connection_id.as_deref(), Some("repo-1"));
        assert_eq!(s.http.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(s.logging.level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(WizardSettings::load_from(Some(&missing), true, "CW_TEST_MISSING").is_err());
        assert!(WizardSettings::load_from(Some(&missing), false, "CW_TEST_MISSING").is_ok());
    }

    #[test]
    fn environment_overrides_file() {
        std::env::set_var("CW_TEST_ENV__SERVER__BASE_URL", "http://env-host:1234");
        let s = WizardSettings::load_from(None, false, "CW_TEST_ENV").expect("settings");
        std::env::remove_var("CW_TEST_ENV__SERVER__BASE_URL");

        assert_eq!(s.server.base_url, "http://env-host:1234");
    }
}
