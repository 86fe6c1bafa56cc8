//! # Credential Issuer
//!
//! Customises the template for one `OpenID4VCI` credential issuer. The
//! issuer's metadata lists one credential configuration per linked issuance
//! flow, and every flow gets its issuance contract, an optional expiration
//! policy, and a credential offer published as deep-link and QR code pages.
//!
//! When the issuer's flows are served by more than one authorization server,
//! each offer names the server to use in an authorization code grant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{
    Context, EnvVars, add_custom_code, add_environment, add_json, prune, public_path,
    well_known_path,
};
use crate::Result;
use crate::archive::Archive;
use crate::config::{Config, extensions};
use crate::discovery;
use crate::error::malformed;
use crate::microservice::{Kind, microservice_url};
use crate::patch::Patch;
use crate::schema::ObjectSchema;
use crate::types::{
    AuthorizationCodeGrant, AuthorizationServer, CredentialConfiguration, CredentialDefinition,
    CredentialDisplay, CredentialIssuer, CredentialOffer, Cryptography, EntityDisplay, Expiration,
    Format, FormatProfile, Grants, IssuanceFlow, Logo, OfferPayload, ProofSigningAlgorithms,
    ProofTypesSupported, Template,
};

const KIND: Kind = Kind::CredentialIssuer;

/// JSON-LD contexts of W3C credential definitions.
pub const W3C_CONTEXTS: [&str; 2] =
    ["https://www.w3.org/ns/credentials/v2", "https://www.w3.org/ns/credentials/examples/v2"];

/// An issuance flow with its references resolved.
#[derive(Clone, Copy, Debug)]
struct Linked<'a> {
    flow: &'a IssuanceFlow,
    template: &'a Template,
    server: &'a AuthorizationServer,
}

/// Build the credential issuer microservice for `issuer`.
///
/// # Errors
///
/// Returns an `Error::InputResolution` error if a linked flow's credential
/// template or authorization server is missing, an `Error::InvalidInput`
/// error if a credential template's schema is not an object schema, or a
/// template error if the archive does not have the expected layout.
#[instrument(level = "debug", skip_all, fields(issuer = %issuer.id))]
pub fn assemble(
    mut archive: Archive, issuer: &CredentialIssuer, env: &EnvVars, ctx: Context,
) -> Result<Archive> {
    let linked = ctx
        .snapshot
        .issuance_flows
        .iter()
        .filter(|f| f.credential_issuer == issuer.id)
        .map(|flow| {
            Ok(Linked {
                flow,
                template: ctx.snapshot.template(&flow.credential_template)?,
                server: ctx.snapshot.authorization_server(&flow.authorization_server)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!("{} linked issuance flows", linked.len());

    // distinct linked servers, in snapshot order
    let servers = ctx
        .snapshot
        .authorization_servers
        .iter()
        .filter(|a| linked.iter().any(|l| l.server.id == a.id))
        .map(|a| microservice_url(&a.endpoint, Kind::AuthzServer))
        .collect::<Vec<_>>();

    let mut configurations = Map::new();
    for l in &linked {
        let configuration = credential_configuration(l.flow, l.template, ctx.config)?;
        let configuration = serde_json::to_value(configuration)
            .map_err(|e| malformed!("cannot serialize {}: {e}", l.flow.type_name))?;
        configurations.insert(l.flow.type_name.clone(), configuration);
    }

    let url = microservice_url(&issuer.endpoint, KIND);
    let display = EntityDisplay {
        name: issuer.name.clone(),
        locale: ctx.config.locale.clone(),
    };
    let placeholders = [(ctx.config.placeholders.credential_issuer.as_str(), url.as_str())];
    archive.replace_json(&well_known_path(KIND), &placeholders, ctx.config.json_indent, |doc| {
        Ok(Patch::new()
            .set("authorization_servers", &servers)?
            .set("display[0]", &display)?
            .set("credential_configurations_supported", &configurations)?
            .apply(doc))
    })?;

    for l in &linked {
        let base = add_custom_code(&mut archive, KIND, &l.flow.type_name, l.template)?;
        if let Some(expiration) = &l.flow.expiration {
            let path = format!("{base}.{}", extensions::TIME);
            add_json(&mut archive, &path, &ExpirationPolicy::from(expiration), ctx.config.json_indent)?;
        }
    }

    let with_grants = servers.len() > 1;
    for l in &linked {
        let grants = with_grants.then(|| Grants {
            authorization_code: AuthorizationCodeGrant {
                authorization_server: microservice_url(&l.server.endpoint, Kind::AuthzServer),
            },
        });
        let payload = OfferPayload {
            offer: CredentialOffer {
                credential_configuration_ids: vec![l.flow.type_name.clone()],
                credential_issuer: url.clone(),
                grants,
            },
        };
        discovery::emit_pages(
            &mut archive,
            &public_path(KIND),
            &l.flow.id,
            &payload,
            ctx.config.json_indent,
        )?;
    }

    add_environment(&mut archive, env)?;
    prune(&mut archive, KIND);
    Ok(archive)
}

/// The credential configuration advertised for an issuance flow.
///
/// # Errors
///
/// Returns an `Error::InvalidInput` error if the template's schema is not an
/// object schema.
pub fn credential_configuration(
    flow: &IssuanceFlow, template: &Template, config: &Config,
) -> Result<CredentialConfiguration> {
    let schema = ObjectSchema::from_value(&template.schema)?;

    let (format, signing_alg, profile) = match flow.cryptography {
        Cryptography::SdJwt => (
            Format::DcSdJwt,
            "ES256",
            FormatProfile::Vct {
                vct: flow.type_name.clone(),
            },
        ),
        Cryptography::W3cVc => (
            Format::LdpVc,
            "Ed25519Signature2018",
            FormatProfile::Definition {
                credential_definition: CredentialDefinition {
                    context: W3C_CONTEXTS.iter().map(ToString::to_string).collect(),
                    type_: vec!["VerifiableCredential".to_string(), flow.type_name.clone()],
                },
            },
        ),
    };

    Ok(CredentialConfiguration {
        format,
        cryptographic_binding_methods_supported: vec!["jwk".to_string()],
        credential_signing_alg_values_supported: vec![signing_alg.to_string()],
        proof_types_supported: ProofTypesSupported {
            jwt: ProofSigningAlgorithms {
                proof_signing_alg_values_supported: vec!["ES256".to_string()],
            },
        },
        display: vec![CredentialDisplay {
            name: flow.display_name.clone(),
            locale: config.locale.clone(),
            logo: Logo {
                url: flow.logo.clone(),
                alt_text: format!("{} logo", flow.display_name),
                uri: flow.logo.clone(),
            },
            background_color: config.display.background_color.clone(),
            text_color: config.display.text_color.clone(),
            description: flow.description.clone(),
        }],
        profile,
        claims: schema.to_claims(&config.locale, &[]),
    })
}

/// Expiration policy file consumed by the issuer's contracts. Durations are
/// re-shaped into singular `{day, month, year}` fields; any other policy is
/// written unchanged.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ExpirationPolicy {
    /// Credentials expire a fixed period after issuance.
    Duration {
        /// Always `duration`.
        mode: String,

        /// The period.
        duration: PolicyPeriod,
    },

    /// Passed through unchanged.
    Other(Value),
}

/// A period in the expiration policy file.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PolicyPeriod {
    /// Days.
    pub day: u32,

    /// Months.
    pub month: u32,

    /// Years.
    pub year: u32,
}

impl From<&Expiration> for ExpirationPolicy {
    fn from(expiration: &Expiration) -> Self {
        match expiration {
            Expiration::Duration(d) => Self::Duration {
                mode: "duration".to_string(),
                duration: PolicyPeriod {
                    day: d.duration.days,
                    month: d.duration.months,
                    year: d.duration.years,
                },
            },
            Expiration::Fixed(policy) => Self::Other(policy.clone()),
        }
    }
}
