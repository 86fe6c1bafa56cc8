//! # Digital Credentials Query Language (DCQL)
//!
//! Verification templates store a DCQL query describing the credential a
//! verifier requests. The bundler reads the query to name the verifier's
//! custom code, and the helpers here build queries from issuance flows and
//! claim selections.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::Result;
use crate::error::invalid;
use crate::microservice::{is_identifier, slugify};
use crate::schema::ObjectSchema;
use crate::types::{Cryptography, IssuanceFlow};

/// Credential query id used for queries built from an issuance flow.
pub const DEFAULT_CREDENTIAL_ID: &str = "my_credential";

/// DCQL query for requesting Verifiable Presentations.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DcqlQuery {
    /// Identifies requested credentials.
    pub credentials: Vec<CredentialQuery>,

    /// Additional constraints on requested credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_sets: Option<Vec<CredentialSetQuery>>,
}

impl DcqlQuery {
    /// Parse a stored query.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error if the text is not a DCQL
    /// query.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| invalid!("invalid DCQL query: {e}"))
    }

    /// Build the single-credential query requesting the credential issued by
    /// `flow`, restricted to the selected claims and to credentials issued by
    /// `issuer_url`.
    #[must_use]
    pub fn from_issuance_flow(flow: &IssuanceFlow, claims: &[ClaimInput], issuer_url: &str) -> Self {
        let (format, meta, prefix, issuer_claim) = match flow.cryptography {
            Cryptography::SdJwt => (
                RequestedFormat::DcSdJwt,
                MetadataQuery::SdJwt {
                    vct_values: vec![flow.type_name.clone()],
                },
                None,
                "iss",
            ),
            Cryptography::W3cVc => (
                RequestedFormat::LdpVc,
                MetadataQuery::W3cVc {
                    type_values: vec![vec![flow.type_name.clone()]],
                },
                Some("credentialSubject"),
                "issuer",
            ),
        };

        let mut claim_queries = claims
            .iter()
            .filter(|c| c.selected)
            .map(|c| {
                c.to_claim(|id| match prefix {
                    Some(prefix) => vec![prefix.to_string(), id.to_string()],
                    None => vec![id.to_string()],
                })
            })
            .collect::<Vec<_>>();
        claim_queries.push(ClaimQuery {
            path: vec![Value::from(issuer_claim)],
            values: Some(vec![Value::from(issuer_url)]),
            ..ClaimQuery::default()
        });

        Self {
            credentials: vec![CredentialQuery {
                id: DEFAULT_CREDENTIAL_ID.to_string(),
                format,
                meta: Some(meta),
                claims: Some(claim_queries),
                ..CredentialQuery::default()
            }],
            credential_sets: None,
        }
    }

    /// The credential type requested by the first credential query, usable
    /// as a path segment: the first `vct` value, else the most specific
    /// W3C type of the first type set, else the query id. Values that are
    /// not valid identifiers are slugified.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error if the query requests no
    /// credentials, or no usable type can be derived.
    pub fn primary_credential_type(&self) -> Result<String> {
        let Some(query) = self.credentials.first() else {
            return Err(invalid!("DCQL query requests no credentials"));
        };

        let raw = match &query.meta {
            Some(MetadataQuery::SdJwt { vct_values }) => vct_values.first(),
            Some(MetadataQuery::W3cVc { type_values }) => type_values.first().and_then(|t| t.last()),
            _ => None,
        }
        .unwrap_or(&query.id);

        if is_identifier(raw) {
            return Ok(raw.clone());
        }
        let slug = slugify(raw);
        if slug.is_empty() {
            return Err(invalid!("cannot derive a credential type from `{raw}`"));
        }
        Ok(slug)
    }
}

/// A request for the presentation of a single credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialQuery {
    /// Identifies the credential in the response and, if provided, the
    /// constraints in `credential_sets`.
    pub id: String,

    /// The format of the requested credential
    pub format: RequestedFormat,

    /// Indicates whether multiple credentials can be returned for this
    /// query. Defaults to false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,

    /// Additional properties requested that apply to the metadata of the
    /// credential. Properties are specific to Credential Format Profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetadataQuery>,

    /// An array of objects that specifies claims in the requested credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<ClaimQuery>>,

    /// Combinations of claims to use when requesting credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_sets: Option<Vec<Vec<String>>>,
}

/// Contains a request for one or more credentials that satisfy a particular
/// use case for the Verifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialSetQuery {
    /// A list of Credential Query sets, one of which must identify a set of
    /// Credentials that satisfies the query.
    pub options: Vec<Vec<String>>,

    /// Whether the set is required. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Claims entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimQuery {
    /// Identifies the claim within the claims array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Claims path pointer: keys, array indices, or `null` for every array
    /// element.
    pub path: Vec<Value>,

    /// The expected values of the claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

/// Credential metadata query parameters. Properties are specific to Credential
/// Format Profile.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MetadataQuery {
    /// ISO-MDL format credential metadata.
    MsoMdoc {
        /// Allowed value for the `doctype` of the requested credential.
        doctype_value: String,
    },

    /// SD-JWT format credential metadata.
    SdJwt {
        /// Allowed `vct` values when querying for SD-JWT Credentials.
        vct_values: Vec<String>,
    },

    /// W3C VC format credential metadata.
    W3cVc {
        /// Alternative sets of types, each of which must all be present in
        /// the credential's `type` property.
        type_values: Vec<Vec<String>>,
    },
}

/// The format of the requested credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum RequestedFormat {
    /// A W3C Verifiable Credential.
    #[serde(rename = "jwt_vc_json")]
    JwtVcJson,

    /// A W3C Verifiable Credential secured with a linked-data proof.
    #[serde(rename = "ldp_vc")]
    LdpVc,

    /// A W3C Verifiable Credential using JSON-LD.
    #[serde(rename = "jwt_vc_json-ld")]
    JwtVcJsonLd,

    /// An ISO mDL (ISO.18013-5) mobile driving licence format credential.
    #[serde(rename = "mso_mdoc")]
    MsoMdoc,

    /// An IETF SD-JWT format credential.
    #[serde(rename = "dc+sd-jwt")]
    #[default]
    DcSdJwt,
}

impl Display for RequestedFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JwtVcJson => write!(f, "jwt_vc_json"),
            Self::LdpVc => write!(f, "ldp_vc"),
            Self::JwtVcJsonLd => write!(f, "jwt_vc_json-ld"),
            Self::MsoMdoc => write!(f, "mso_mdoc"),
            Self::DcSdJwt => write!(f, "dc+sd-jwt"),
        }
    }
}

/// A claim selection made when building a verification query.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimInput {
    /// Property name in the credential schema.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Comma-separated list of accepted values. Empty accepts any value.
    pub values: String,

    /// Whether the claim is requested.
    pub selected: bool,

    /// Value type, used to parse `values`.
    #[serde(rename = "type")]
    pub type_: ClaimType,
}

/// The value type of a [`ClaimInput`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    /// Text.
    #[default]
    String,

    /// Any JSON number.
    Number,

    /// `true` or `false`.
    Boolean,
}

impl ClaimInput {
    /// Convert the selection into a claim query, using `path` to build the
    /// claim path from the property id.
    ///
    /// Values that do not parse as the claim's type are dropped. A selection
    /// without any usable value matches every value.
    #[must_use]
    pub fn to_claim(&self, path: impl Fn(&str) -> Vec<String>) -> ClaimQuery {
        let raw = self.values.split(',').map(str::trim).filter(|v| !v.is_empty());
        let values = match self.type_ {
            ClaimType::String => raw.map(Value::from).collect::<Vec<_>>(),
            ClaimType::Number => raw.filter_map(parse_number).collect(),
            ClaimType::Boolean => {
                let mut flags = vec![];
                for flag in raw.filter_map(|v| v.parse::<bool>().ok()) {
                    if !flags.contains(&flag) {
                        flags.push(flag);
                    }
                }
                flags.into_iter().map(Value::from).collect()
            }
        };

        ClaimQuery {
            id: None,
            path: path(&self.id).into_iter().map(Value::from).collect(),
            values: (!values.is_empty()).then_some(values),
        }
    }
}

fn parse_number(value: &str) -> Option<Value> {
    value.parse::<i64>().map(Value::from).ok().or_else(|| {
        value.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
    })
}

/// One selected claim input per top-level schema property, in declaration
/// order. Property types other than string, number and boolean are treated
/// as strings.
#[must_use]
pub fn claim_inputs_from_schema(schema: &ObjectSchema) -> Vec<ClaimInput> {
    schema
        .properties
        .iter()
        .map(|(id, property)| ClaimInput {
            id: id.clone(),
            name: property.get("title").and_then(Value::as_str).unwrap_or(id).to_string(),
            values: String::new(),
            selected: true,
            type_: match property.get("type").and_then(Value::as_str) {
                Some("number") => ClaimType::Number,
                Some("boolean") => ClaimType::Boolean,
                _ => ClaimType::String,
            },
        })
        .collect()
}
