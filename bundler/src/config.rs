//! # Configuration
//!
//! Layout names used inside the microservices template archive are fixed and
//! exposed as constants. Values a deployment may reasonably want to change
//! (locale, placeholders, display colours, ports) live in [`Config`].

use serde::{Deserialize, Serialize};

use crate::error::invalid;
use crate::Result;

/// Folder holding per-credential custom code.
pub const CUSTOM_CODE: &str = "custom_code";

/// Folder holding publicly served pages and documents.
pub const PUBLIC: &str = "public";

/// Folder holding protocol discovery documents.
pub const WELL_KNOWN: &str = ".well-known";

/// Folder holding the template's test suites.
pub const TESTS: &str = "tests";

/// Environment file template.
pub const ENV_EXAMPLE: &str = ".env.example";

/// Environment file written for each microservice.
pub const ENV: &str = ".env";

/// Container build file.
pub const DOCKERFILE: &str = "Dockerfile";

/// Service composition file written at the bundle root.
pub const DOCKER_COMPOSE: &str = "docker-compose.yaml";

/// Reverse-proxy configuration written at the bundle root.
pub const CADDYFILE: &str = "Caddyfile";

/// Name of the default custom code slot shipped with each microservice kind.
pub const DEFAULT_SLOT: &str = "default";

/// Page and file names.
pub mod file_names {
    /// Deep-link discovery page.
    pub const DEEPLINK: &str = "deeplink";
    /// QR code discovery page.
    pub const QRCODE: &str = "qrcode";
    /// Verification flow details page.
    pub const DETAILS: &str = "details";
    /// Aggregate verification flow list page.
    pub const LIST: &str = "list";
    /// Verification query page.
    pub const DCQL_QUERY: &str = "dcql_query";
}

/// File extensions used for custom code and page data.
pub mod extensions {
    /// Zencode contract.
    pub const ZEN: &str = "zen";
    /// Contract input data.
    pub const KEYS: &str = "keys.json";
    /// Claims metadata.
    pub const METADATA: &str = "metadata.json";
    /// Credential expiration policy.
    pub const TIME: &str = "time.json";
    /// Merged schema description.
    pub const SCHEMA: &str = "schema.json";
}

/// Bundle generation settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Locale tag used for all generated display metadata.
    pub locale: String,

    /// Indentation (in spaces) used when serializing JSON documents.
    pub json_indent: usize,

    /// Base URL placeholders used in the template discovery documents.
    pub placeholders: Placeholders,

    /// Display colours applied to every credential configuration.
    pub display: DisplayColors,

    /// Port each microservice listens on behind the reverse proxy.
    pub service_port: u16,

    /// Host directory bind-mounted into every service container.
    pub host_config_dir: String,

    /// Location of the base microservices template archive.
    pub template_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            json_indent: 4,
            placeholders: Placeholders::default(),
            display: DisplayColors::default(),
            service_port: 3000,
            host_config_dir: "~/.config/didroom".to_string(),
            template_url:
                "https://github.com/ForkbombEu/DIDroom_microservices/archive/refs/heads/main.zip"
                    .to_string(),
        }
    }
}

impl Config {
    /// Load configuration overrides from a JSON document. Fields not present
    /// keep their default values.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error if the document is not valid
    /// configuration JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| invalid!("invalid configuration: {e}"))
    }
}

/// Literal placeholder strings standing in for each service's base URL in
/// the template discovery documents.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Placeholders {
    /// Authorization server base URL placeholder.
    pub authz_server: String,

    /// Credential issuer base URL placeholder.
    pub credential_issuer: String,

    /// Verifier base URL placeholder.
    pub verifier: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            authz_server: "{{ as_url }}".to_string(),
            credential_issuer: "{{ ci_url }}".to_string(),
            verifier: "{{ rp_url }}".to_string(),
        }
    }
}

/// Credential card colours.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayColors {
    /// Card background colour.
    pub background_color: String,

    /// Card text colour.
    pub text_color: String,
}

impl Default for DisplayColors {
    fn default() -> Self {
        Self {
            background_color: "#12107c".to_string(),
            text_color: "#FFFFFF".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides() {
        let config = Config::from_json(r##"{"locale": "it-IT", "display": {"text_color": "#000"}}"##)
            .expect("should parse");

        assert_eq!(config.locale, "it-IT");
        assert_eq!(config.json_indent, 4);
        assert_eq!(config.display.text_color, "#000");
        assert_eq!(config.display.background_color, "#12107c");
        assert_eq!(config.placeholders.credential_issuer, "{{ ci_url }}");
    }

    #[test]
    fn invalid_json() {
        let err = Config::from_json(r#"{"json_indent": "four"}"#).expect_err("should fail");
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
