//! # Test Fixtures
//!
//! A miniature microservices template, a sample organization snapshot, and a
//! provider serving both to bundle generation tests.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use credibil_bundler::archive::Archive;
use credibil_bundler::microservice::Kind;
use credibil_bundler::provider::{Environment, StandardEnvironment, Template};
use credibil_bundler::{Endpoint, Snapshot};

/// Top-level folder wrapping the template, as in source-hosting archives.
pub const TEMPLATE_ROOT: &str = "microservices-main";

const SNAPSHOT: &str = include_str!("../data/snapshot.json");

const TEMPLATE: &[(&str, &str)] = &[
    (".env.example", include_str!("../data/template/.env.example")),
    ("Dockerfile", include_str!("../data/template/Dockerfile")),
    ("scripts/qrcode.sh", include_str!("../data/template/scripts/qrcode.sh")),
    ("tests/authz_server.bats", include_str!("../data/template/tests/authz_server.bats")),
    ("tests/credential_issuer.bats", include_str!("../data/template/tests/credential_issuer.bats")),
    (
        "custom_code/authz_server/default.zen",
        include_str!("../data/template/custom_code/authz_server/default.zen"),
    ),
    (
        "custom_code/credential_issuer/default.zen",
        include_str!("../data/template/custom_code/credential_issuer/default.zen"),
    ),
    (
        "custom_code/verifier/default.zen",
        include_str!("../data/template/custom_code/verifier/default.zen"),
    ),
    (
        "public/authz_server/.well-known/oauth-authorization-server",
        include_str!("../data/template/public/authz_server/.well-known/oauth-authorization-server"),
    ),
    (
        "public/authz_server/authorize.zen",
        include_str!("../data/template/public/authz_server/authorize.zen"),
    ),
    (
        "public/credential_issuer/.well-known/openid-credential-issuer",
        include_str!(
            "../data/template/public/credential_issuer/.well-known/openid-credential-issuer"
        ),
    ),
    (
        "public/credential_issuer/deeplink.zen",
        include_str!("../data/template/public/credential_issuer/deeplink.zen"),
    ),
    (
        "public/credential_issuer/qrcode.zen",
        include_str!("../data/template/public/credential_issuer/qrcode.zen"),
    ),
    (
        "public/verifier/.well-known/openid-relying-party",
        include_str!("../data/template/public/verifier/.well-known/openid-relying-party"),
    ),
    (
        "public/verifier/dcql_query.keys.json",
        include_str!("../data/template/public/verifier/dcql_query.keys.json"),
    ),
    ("public/verifier/dcql_query.zen", include_str!("../data/template/public/verifier/dcql_query.zen")),
    ("public/verifier/deeplink.zen", include_str!("../data/template/public/verifier/deeplink.zen")),
    ("public/verifier/details.zen", include_str!("../data/template/public/verifier/details.zen")),
    ("public/verifier/list.zen", include_str!("../data/template/public/verifier/list.zen")),
    ("public/verifier/qrcode.zen", include_str!("../data/template/public/verifier/qrcode.zen")),
];

/// The fixture template as an archive, wrapped in [`TEMPLATE_ROOT`].
#[must_use]
pub fn template_archive() -> Archive {
    let mut archive = Archive::new();
    for (path, contents) in TEMPLATE {
        archive.add_entry(&format!("{TEMPLATE_ROOT}/{path}"), *contents);
    }
    archive
}

/// The fixture template, zip-encoded.
///
/// # Panics
///
/// Panics if the archive cannot be serialized.
#[must_use]
pub fn template() -> Vec<u8> {
    template_archive().to_bytes().expect("should serialize template")
}

/// The sample organization: two authorization servers, two issuers and one
/// verifier.
///
/// # Panics
///
/// Panics if the fixture is not a valid snapshot.
#[must_use]
pub fn snapshot() -> Snapshot {
    serde_json::from_str(SNAPSHOT).expect("should deserialize snapshot")
}

/// Decode a generated bundle.
///
/// # Panics
///
/// Panics if `bundle` is not a zip archive.
#[must_use]
pub fn open(bundle: &[u8]) -> Archive {
    Archive::from_bytes(bundle).expect("should be a zip archive")
}

/// Parse a JSON entry of `archive`.
///
/// # Panics
///
/// Panics if the entry is missing or is not JSON.
#[must_use]
pub fn read_json(archive: &Archive, path: &str) -> serde_json::Value {
    let text = archive.read_text(path).unwrap_or_else(|e| panic!("{path}: {e}"));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("{path}: {e}"))
}

/// Serves the fixture template, or fails to when `available` is false.
#[derive(Clone, Debug)]
pub struct Provider {
    available: bool,
    environment: StandardEnvironment,
}

impl Provider {
    /// A provider serving the fixture template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: true,
            environment: StandardEnvironment::default(),
        }
    }

    /// A provider whose template source is down.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Template for Provider {
    async fn fetch(&self) -> Result<Vec<u8>> {
        if !self.available {
            return Err(anyhow!("template host unreachable"));
        }
        Ok(template())
    }
}

impl Environment for Provider {
    fn fill(&self, endpoint: &Endpoint, kind: Kind) -> Result<BTreeMap<String, String>> {
        self.environment.fill(endpoint, kind)
    }
}
