//! Module configuration.

use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use secrecy::SecretString;
use serde::Deserialize;

/// Top-level frontdesk configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FrontDeskConfig {
    pub remote: RemoteConfig,
}

impl FrontDeskConfig {
    /// Load configuration from an optional YAML file with `FRONTDESK_`
    /// environment overrides (`FRONTDESK_REMOTE__USERNAME` and so on).
    ///
    /// # Errors
    /// Returns a figment error when the file or environment values do not
    /// deserialize into the expected shape.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("FRONTDESK_").split("__"))
            .extract()
    }
}

/// Connection settings for the remote directory system.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Login subdomain ("login" for production orgs, "test" for sandboxes).
    pub domain: String,
    pub username: String,
    pub password: SecretString,
    pub security_token: SecretString,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Bounded transport timeout; a timeout is treated as the remote being
    /// unavailable.
    pub timeout_ms: u64,
    pub objects: RemoteObjectsConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            domain: "login".to_owned(),
            username: String::new(),
            password: SecretString::from(String::new()),
            security_token: SecretString::from(String::new()),
            client_id: String::new(),
            client_secret: SecretString::from(String::new()),
            timeout_ms: 15_000,
            objects: RemoteObjectsConfig::default(),
        }
    }
}

/// Remote object type names. Managed-package prefixes differ between orgs,
/// so these are configurable rather than hard-coded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteObjectsConfig {
    pub ticket: String,
    pub visitor_log: String,
}

impl Default for RemoteObjectsConfig {
    fn default() -> Self {
        Self {
            ticket: "reda__Ticket__c".to_owned(),
            visitor_log: "reda__Visitor_Log__c".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = FrontDeskConfig::default();
        assert_eq!(cfg.remote.domain, "login");
        assert_eq!(cfg.remote.timeout_ms, 15_000);
        assert_eq!(cfg.remote.objects.ticket, "reda__Ticket__c");
        assert_eq!(cfg.remote.objects.visitor_log, "reda__Visitor_Log__c");
    }

    #[test]
    fn loads_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frontdesk.yaml");
        std::fs::write(
            &path,
            "remote:\n  domain: test\n  username: ops@example.com\n  timeout_ms: 5000\n",
        )
        .unwrap();

        let cfg = FrontDeskConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.remote.domain, "test");
        assert_eq!(cfg.remote.username, "ops@example.com");
        assert_eq!(cfg.remote.timeout_ms, 5000);
    }
}
