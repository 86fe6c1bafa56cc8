//! # Bundle
//!
//! Generates the deployment bundle for one organization: one customised
//! microservice per configured endpoint, each in its own folder, plus the
//! orchestration files that run them together behind one reverse proxy.
//!
//! Generation is all-or-nothing: the first error aborts the whole bundle.

use anyhow::Context as _;
use tracing::instrument;

use crate::Result;
use crate::archive::Archive;
use crate::assemble::{Context, EnvVars, authz_server, credential_issuer, verifier};
use crate::compose::Orchestration;
use crate::config::Config;
use crate::microservice::Kind;
use crate::provider::{Environment, Provider};
use crate::types::{Endpoint, Snapshot};

/// Content type of a generated bundle.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Fetch the base template through `provider` and generate the bundle.
///
/// # Errors
///
/// Returns an `Error::TemplateUnavailable` error if the template cannot be
/// fetched, or any error returned by [`create_bundle`].
#[instrument(level = "debug", skip_all, fields(organization = %snapshot.organization.id))]
pub async fn generate(
    provider: &impl Provider, snapshot: &Snapshot, config: &Config,
) -> Result<Vec<u8>> {
    let template = provider
        .fetch()
        .await
        .map_err(|e| crate::Error::TemplateUnavailable(format!("{e:#}")))?;
    create_bundle(&template, snapshot, provider, config)
}

/// Generate the bundle for `snapshot` from the zip-encoded base template.
///
/// Authorization servers are assembled first, then verifiers, then
/// credential issuers, each in snapshot order. Identical inputs produce
/// byte-identical bundles.
///
/// # Errors
///
/// Returns an `Error::InvalidInput` or `Error::InputResolution` error if the
/// snapshot is invalid or incomplete, or a template error if the template
/// does not have the expected layout.
#[instrument(level = "debug", skip_all, fields(organization = %snapshot.organization.id))]
pub fn create_bundle(
    template: &[u8], snapshot: &Snapshot, environment: &impl Environment, config: &Config,
) -> Result<Vec<u8>> {
    snapshot.validate()?;
    let template = Archive::from_bytes(template)?.strip_root();
    let ctx = Context { snapshot, config };

    let mut bundle = Archive::new();
    let mut orchestration = Orchestration::new(config);

    for server in &snapshot.authorization_servers {
        let env = fill(environment, server, Kind::AuthzServer)?;
        let service = orchestration.register(&server.name, Kind::AuthzServer, &server.endpoint)?;
        let archive = authz_server::assemble(template.clone(), server, &env, ctx)?;
        bundle.merge_as_subfolder(archive, &service);
    }
    for party in &snapshot.relying_parties {
        let env = fill(environment, party, Kind::Verifier)?;
        let service = orchestration.register(&party.name, Kind::Verifier, &party.endpoint)?;
        let archive = verifier::assemble(template.clone(), party, &env, ctx)?;
        bundle.merge_as_subfolder(archive, &service);
    }
    for issuer in &snapshot.credential_issuers {
        let env = fill(environment, issuer, Kind::CredentialIssuer)?;
        let service =
            orchestration.register(&issuer.name, Kind::CredentialIssuer, &issuer.endpoint)?;
        let archive = credential_issuer::assemble(template.clone(), issuer, &env, ctx)?;
        bundle.merge_as_subfolder(archive, &service);
    }

    tracing::debug!("bundling {} services", orchestration.services().len());
    orchestration.finalize(&mut bundle);
    bundle.to_bytes()
}

fn fill(environment: &impl Environment, endpoint: &Endpoint, kind: Kind) -> Result<EnvVars> {
    let env = environment
        .fill(endpoint, kind)
        .with_context(|| format!("filling environment for {kind} {}", endpoint.id))?;
    Ok(env)
}
