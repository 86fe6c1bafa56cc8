//! # Authorization Request
//!
//! Verifier Authorization Request objects embedded in a verifier's discovery
//! pages, and the entries of the verifier's aggregate flow list.
//!
//! See <https://openid.net/specs/openid-4-verifiable-presentations-1_0.html#name-authorization-request>

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authorization Request Object for a Wallet to present credentials to the
/// verifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AuthorizationRequest {
    /// The verifier's base URL.
    pub client_id: String,

    /// Always `vp_token`.
    pub response_type: ResponseType,

    /// Always `direct_post`: the Wallet posts the response to the verifier.
    pub response_mode: ResponseMode,

    /// The DCQL query describing the requested credentials.
    pub dcql_query: Value,
}

impl AuthorizationRequest {
    /// Create a request for the given verifier and query.
    #[must_use]
    pub fn new(client_id: impl Into<String>, dcql_query: Value) -> Self {
        Self {
            client_id: client_id.into(),
            response_type: ResponseType::VpToken,
            response_mode: ResponseMode::DirectPost,
            dcql_query,
        }
    }
}

/// The type of response expected from the Wallet.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// A Verifiable Presentation token.
    #[default]
    VpToken,
}

/// The mechanism the Wallet uses to return the response.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// The Wallet sends the response using an HTTPS POST to the verifier.
    #[default]
    DirectPost,
}

/// Payload of a verifier's deep-link and QR code pages.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RequestPayload {
    /// The request encoded in the link.
    pub request: AuthorizationRequest,
}

/// One entry in a verifier's flow list page.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FlowSummary {
    /// Flow name.
    pub name: String,

    /// Flow description.
    pub description: String,

    /// URL of the flow's details page.
    pub url: String,
}

/// The verifier's aggregate flow list page.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FlowList {
    /// Every verification flow served by the verifier.
    pub flows: Vec<FlowSummary>,
}
