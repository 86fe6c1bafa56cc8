//! # Credential Offer
//!
//! Credential Offers embedded in a credential issuer's discovery pages. A
//! Wallet scanning or following the page receives the offer by value.
//!
//! See <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-offer>

use serde::{Deserialize, Serialize};

/// A Credential Offer object that can be sent to a Wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// Credentials offered to the Wallet: keys of the issuer's
    /// `credential_configurations_supported` metadata.
    pub credential_configuration_ids: Vec<String>,

    /// The URL of the Credential Issuer.
    pub credential_issuer: String,

    /// Grant types the issuer is prepared to process for this offer. Only
    /// present when the Wallet could not otherwise tell which authorization
    /// server to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<Grants>,
}

impl CredentialOffer {
    /// Convenience method for extracting the authorization server named by
    /// the offer's authorization code grant, if any.
    #[must_use]
    pub fn authorization_server(&self) -> Option<&str> {
        self.grants.as_ref().map(|g| g.authorization_code.authorization_server.as_str())
    }
}

/// Grants offered to the Wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grants {
    /// Authorization Code grant.
    pub authorization_code: AuthorizationCodeGrant,
}

/// Authorization Code grant parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationCodeGrant {
    /// Identifies the authorization server the Wallet must use when the
    /// issuer's metadata lists more than one.
    pub authorization_server: String,
}

/// Payload of an issuer's deep-link and QR code pages.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OfferPayload {
    /// The offer encoded in the link.
    pub offer: CredentialOffer,
}
