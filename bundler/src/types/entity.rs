//! # Organization Snapshot
//!
//! The complete, access-filtered set of configuration entities for one
//! organization. A snapshot is read-only input to bundle generation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::error::{invalid, unresolved};
use crate::microservice::is_identifier;

/// Everything needed to generate one organization's bundle.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Snapshot {
    /// The organization owning every other entity.
    pub organization: Organization,

    /// Deployed OAuth authorization servers.
    pub authorization_servers: Vec<AuthorizationServer>,

    /// Deployed credential issuers.
    pub credential_issuers: Vec<CredentialIssuer>,

    /// Deployed verifiers (relying parties).
    pub relying_parties: Vec<RelyingParty>,

    /// Credential, authorization and verification templates.
    pub templates: Vec<Template>,

    /// Issuance flows (one per issued credential type).
    pub issuance_flows: Vec<IssuanceFlow>,

    /// Verification flows.
    pub verification_flows: Vec<VerificationFlow>,
}

impl Snapshot {
    /// Check the invariants the generator relies on before anything is
    /// assembled:
    ///
    /// - flow ids are valid identifiers (they become path segments);
    /// - every `type_name` is a valid identifier and unique within the
    ///   organization;
    /// - verification flow names and descriptions fit in a contract string;
    /// - every entity a flow refers to is part of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error naming the offending flow, or an
    /// `Error::InputResolution` error for the first reference that does not
    /// resolve.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for flow in &self.issuance_flows {
            if !is_identifier(&flow.id) {
                return Err(invalid!("issuance flow id `{}` is not a valid identifier", flow.id));
            }
            if !is_identifier(&flow.type_name) {
                return Err(invalid!(
                    "issuance flow {} has invalid type_name `{}`",
                    flow.id,
                    flow.type_name
                ));
            }
            if !seen.insert(flow.type_name.as_str()) {
                return Err(invalid!("type_name `{}` is used more than once", flow.type_name));
            }

            self.authorization_server(&flow.authorization_server)?;
            self.credential_issuer(&flow.credential_issuer)?;
            self.template(&flow.credential_template)?;
            self.template(&flow.authorization_template)?;
        }

        for flow in &self.verification_flows {
            if !is_identifier(&flow.id) {
                return Err(invalid!("verification flow id `{}` is not a valid identifier", flow.id));
            }
            for (field, value) in [("name", &flow.name), ("description", &flow.description)] {
                if value.contains(['\'', '\n', '\r']) {
                    return Err(invalid!(
                        "verification flow {} {field} contains a quote or line break",
                        flow.id
                    ));
                }
            }

            self.relying_party(&flow.relying_party)?;
            self.template(&flow.template)?;
        }
        Ok(())
    }

    /// Look up a template by id.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InputResolution` error if the template is not part of
    /// the snapshot.
    pub fn template(&self, id: &str) -> Result<&Template> {
        self.templates.iter().find(|t| t.id == id).ok_or_else(|| unresolved!("template {id} not found"))
    }

    /// Look up an authorization server by id.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InputResolution` error if the authorization server is
    /// not part of the snapshot.
    pub fn authorization_server(&self, id: &str) -> Result<&AuthorizationServer> {
        find_endpoint(&self.authorization_servers, id, "authorization server")
    }

    /// Look up a credential issuer by id.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InputResolution` error if the credential issuer is
    /// not part of the snapshot.
    pub fn credential_issuer(&self, id: &str) -> Result<&CredentialIssuer> {
        find_endpoint(&self.credential_issuers, id, "credential issuer")
    }

    /// Look up a relying party by id.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InputResolution` error if the relying party is not
    /// part of the snapshot.
    pub fn relying_party(&self, id: &str) -> Result<&RelyingParty> {
        find_endpoint(&self.relying_parties, id, "relying party")
    }
}

fn find_endpoint<'a>(endpoints: &'a [Endpoint], id: &str, what: &str) -> Result<&'a Endpoint> {
    endpoints.iter().find(|e| e.id == id).ok_or_else(|| unresolved!("{what} {id} not found"))
}

/// The identity scope owning all other entities.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Organization {
    /// Organization identifier.
    pub id: String,

    /// Display name.
    pub name: String,
}

/// A configured microservice endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Entity identifier.
    pub id: String,

    /// Display name, also used to derive the service name.
    pub name: String,

    /// Public URL the service is deployed at.
    pub endpoint: String,
}

/// An OAuth authorization server endpoint.
pub type AuthorizationServer = Endpoint;

/// A credential issuer endpoint.
pub type CredentialIssuer = Endpoint;

/// A verifier (relying party) endpoint.
pub type RelyingParty = Endpoint;

/// A credential, authorization or verification template.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Template {
    /// Template identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// JSON-Schema-like description of the template's object.
    pub schema: Value,

    /// Additional schema (for authorization templates, the form fields shown
    /// to the holder).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_secondary: Option<Value>,

    /// Pre-built verification query, stored either as text or as an object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcql_query: Option<Value>,

    /// Custom contract executed by the microservice for this template.
    pub zencode_script: String,

    /// Input data (keys) for the custom contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zencode_data: Option<String>,
}

impl Template {
    /// The stored verification query as text: a string is returned as-is,
    /// any other JSON value in compact form.
    #[must_use]
    pub fn dcql_query_text(&self) -> Option<String> {
        match self.dcql_query.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Credential securing mechanism for an issuance flow.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Cryptography {
    /// SD-JWT VC (`dc+sd-jwt`).
    #[default]
    #[serde(rename = "sd-jwt")]
    SdJwt,

    /// W3C Verifiable Credential with linked-data proof (`ldp_vc`).
    #[serde(rename = "W3C-VC")]
    W3cVc,
}

/// An issuance flow links one credential type to one authorization server
/// and one credential issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct IssuanceFlow {
    /// Flow identifier.
    pub id: String,

    /// Credential type identifier (`^[a-zA-Z0-9_]+$`).
    pub type_name: String,

    /// Credential display name.
    pub display_name: String,

    /// Credential description.
    pub description: String,

    /// Credential logo URL.
    pub logo: String,

    /// Securing mechanism.
    pub cryptography: Cryptography,

    /// Id of the authorization server granting access to the credential.
    pub authorization_server: String,

    /// Id of the issuer issuing the credential.
    pub credential_issuer: String,

    /// Id of the template describing the credential's claims.
    pub credential_template: String,

    /// Id of the template describing the authorization step.
    pub authorization_template: String,

    /// Credential expiration policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
}

/// A verification flow requests credential presentation on behalf of one
/// relying party.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerificationFlow {
    /// Flow identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Description shown to the holder.
    pub description: String,

    /// Id of the relying party running the flow.
    pub relying_party: String,

    /// Id of the template carrying the verification query.
    pub template: String,
}

/// Credential expiration policy.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Expiration {
    /// Credentials expire a fixed period after issuance.
    Duration(DurationExpiration),

    /// Any other policy (typically a fixed date), passed on unchanged.
    Fixed(Value),
}

/// A duration-based expiration as stored with the issuance flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DurationExpiration {
    /// Always `duration`.
    pub mode: DurationMode,

    /// The period after which issued credentials expire.
    pub duration: Period,
}

/// Marker for duration-based expirations.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationMode {
    /// Expire after a period.
    Duration,
}

/// A calendar period.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Period {
    /// Whole years.
    pub years: u32,

    /// Whole months.
    pub months: u32,

    /// Whole days.
    pub days: u32,
}
