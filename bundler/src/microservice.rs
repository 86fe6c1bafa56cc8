//! # Microservices
//!
//! The three kinds of microservice a bundle can contain, and the URL and
//! naming helpers shared by every assembler.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A deployable microservice kind. Each kind owns one subtree of the
/// template archive (`custom_code/<kind>/`, `public/<kind>/`).
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// OAuth authorization server.
    AuthzServer,

    /// `OpenID4VCI` credential issuer.
    CredentialIssuer,

    /// `OpenID4VP` verifier (relying party).
    Verifier,
}

impl Kind {
    /// All kinds, in bundle assembly order.
    pub const ALL: [Self; 3] = [Self::AuthzServer, Self::CredentialIssuer, Self::Verifier];

    /// Folder name used for the kind throughout the template archive.
    #[must_use]
    pub const fn folder(self) -> &'static str {
        match self {
            Self::AuthzServer => "authz_server",
            Self::CredentialIssuer => "credential_issuer",
            Self::Verifier => "verifier",
        }
    }

    /// Prefix for orchestration service names.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::AuthzServer => "as",
            Self::CredentialIssuer => "ci",
            Self::Verifier => "rp",
        }
    }

    /// File name of the kind's discovery document under `.well-known`.
    #[must_use]
    pub const fn well_known(self) -> &'static str {
        match self {
            Self::AuthzServer => "oauth-authorization-server",
            Self::CredentialIssuer => "openid-credential-issuer",
            Self::Verifier => "openid-relying-party",
        }
    }

    /// Kinds other than this one.
    pub fn others(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |k| *k != self)
    }

    /// Orchestration service name (and bundle folder name) for an endpoint
    /// of this kind.
    #[must_use]
    pub fn service_name(self, name: &str) -> String {
        format!("{}_{}", self.prefix(), slugify(name))
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder())
    }
}

/// Remove a single trailing `/` from a URL.
#[must_use]
pub fn clean_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// The public base URL of a microservice: the endpoint's URL with the kind's
/// folder appended (unless already present).
#[must_use]
pub fn microservice_url(endpoint: &str, kind: Kind) -> String {
    let url = clean_url(endpoint);
    let suffix = format!("/{}", kind.folder());
    if url.ends_with(&suffix) { url.to_string() } else { format!("{url}{suffix}") }
}

/// The `scheme://host` origin of a URL. URLs without a scheme are returned
/// up to the first path separator.
#[must_use]
pub fn origin(url: &str) -> String {
    let url = clean_url(url);
    url.find("://").map_or_else(
        || url.split('/').next().unwrap_or_default().to_string(),
        |idx| {
            let (scheme, rest) = url.split_at(idx + 3);
            let host = rest.split('/').next().unwrap_or_default();
            format!("{scheme}{host}")
        },
    )
}

/// Stable, path-safe identifier for an entity name: lower-case, each run of
/// characters other than ASCII letters and digits collapsed into `_`, with no
/// leading or trailing `_`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Whether a value can be used verbatim as an identifier and path segment
/// (`^[a-zA-Z0-9_]+$`).
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        assert_eq!(clean_url("https://example.com/"), "https://example.com");
        assert_eq!(
            microservice_url("https://example.com/", Kind::CredentialIssuer),
            "https://example.com/credential_issuer"
        );
        assert_eq!(
            microservice_url("https://example.com/authz_server", Kind::AuthzServer),
            "https://example.com/authz_server"
        );
        assert_eq!(origin("https://example.com:8443/a/b/"), "https://example.com:8443");
        assert_eq!(origin("example.com/verifier"), "example.com");
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("My Issuer!"), "my_issuer");
        assert_eq!(slugify("  ACME -- Auth (EU) "), "acme_auth_eu");
        assert_eq!(slugify("already_slug"), "already_slug");
        assert_eq!(Kind::Verifier.service_name("Shop Verifier"), "rp_shop_verifier");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Employee_ID2"));
        assert!(!is_identifier("employee-id"));
        assert!(!is_identifier(""));
    }
}
