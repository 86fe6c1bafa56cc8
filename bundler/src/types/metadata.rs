//! # Credential Issuer Metadata
//!
//! The subset of [OpenID4VCI Credential Issuer Metadata] written into a
//! credential issuer's discovery document.
//!
//! [OpenID4VCI Credential Issuer Metadata]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-issuer-metadata

use serde::{Deserialize, Serialize};

/// Describes how a single claim is displayed and whether the issuer always
/// includes it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimDescriptor {
    /// Whether the issuer will always include the claim in the credential.
    pub mandatory: bool,

    /// Display properties of the claim, one per locale.
    pub display: Vec<ClaimDisplay>,

    /// Path to the claim within the credential. A `None` element selects
    /// every element of an array.
    pub path: Vec<Option<String>>,
}

impl ClaimDescriptor {
    /// The claim path as a dotted string, with array wildcards rendered as
    /// `null`.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.path.iter().map(|p| p.as_deref().unwrap_or("null")).collect::<Vec<_>>().join(".")
    }
}

/// Localised claim name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimDisplay {
    /// Language tag (BCP 47).
    pub locale: String,

    /// Display name for the claim.
    pub name: String,
}

/// The protocol format of a supported credential.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Format {
    /// IETF SD-JWT VC.
    #[serde(rename = "dc+sd-jwt")]
    DcSdJwt,

    /// W3C Verifiable Credential secured with a linked-data proof.
    #[serde(rename = "ldp_vc")]
    LdpVc,
}

/// A credential the issuer can issue, keyed by `type_name` in
/// `credential_configurations_supported`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfiguration {
    /// Credential format.
    pub format: Format,

    /// Key binding methods supported by the issuer.
    pub cryptographic_binding_methods_supported: Vec<String>,

    /// Algorithms the issuer uses to sign the credential.
    pub credential_signing_alg_values_supported: Vec<String>,

    /// Proof types the issuer accepts as proof of key possession.
    pub proof_types_supported: ProofTypesSupported,

    /// Display properties of the credential.
    pub display: Vec<CredentialDisplay>,

    /// Format-specific credential type declaration.
    #[serde(flatten)]
    pub profile: FormatProfile,

    /// Claims the credential may contain.
    pub claims: Vec<ClaimDescriptor>,
}

/// Format-specific type declaration of a credential configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FormatProfile {
    /// SD-JWT VC type.
    Vct {
        /// The credential type identifier.
        vct: String,
    },

    /// W3C credential definition.
    Definition {
        /// `@context` and `type` of the credential.
        credential_definition: CredentialDefinition,
    },
}

/// `@context` and `type` of a W3C credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialDefinition {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential types, starting with `VerifiableCredential`.
    #[serde(rename = "type")]
    pub type_: Vec<String>,
}

/// Proof types accepted by the credential endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofTypesSupported {
    /// JWT proof support.
    pub jwt: ProofSigningAlgorithms,
}

/// Algorithms accepted for a proof type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofSigningAlgorithms {
    /// Supported signing algorithms.
    pub proof_signing_alg_values_supported: Vec<String>,
}

/// Display properties of a supported credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialDisplay {
    /// Display name.
    pub name: String,

    /// Language tag (BCP 47).
    pub locale: String,

    /// Credential logo.
    pub logo: Logo,

    /// Card background colour.
    pub background_color: String,

    /// Card text colour.
    pub text_color: String,

    /// Credential description.
    pub description: String,
}

/// Credential logo.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Logo {
    /// Logo URL.
    pub url: String,

    /// Alternative text.
    pub alt_text: String,

    /// Logo URI.
    pub uri: String,
}

/// Issuer or verifier display block written into discovery documents.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EntityDisplay {
    /// Display name.
    pub name: String,

    /// Language tag (BCP 47).
    pub locale: String,
}
