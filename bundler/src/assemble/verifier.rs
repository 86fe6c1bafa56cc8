//! # Verifier
//!
//! Customises the template for one `OpenID4VP` verifier. Each linked
//! verification flow gets a details page, its stored DCQL query, deep-link
//! and QR code pages carrying an Authorization Request, and its verification
//! contract, named after the credential type the query requests. The
//! verifier's list page enumerates every flow.

use serde_json::Value;
use tracing::instrument;

use super::{
    Context, EnvVars, add_custom_code, add_environment, add_json, prune, public_path,
    well_known_path,
};
use crate::Result;
use crate::archive::Archive;
use crate::config::{extensions, file_names};
use crate::dcql::DcqlQuery;
use crate::discovery;
use crate::error::{invalid, malformed};
use crate::microservice::{Kind, microservice_url};
use crate::patch::Patch;
use crate::types::{
    AuthorizationRequest, EntityDisplay, FlowList, FlowSummary, RelyingParty, RequestPayload,
    Template, VerificationFlow,
};

const KIND: Kind = Kind::Verifier;

const TITLE_MARKER: &str = "{{ title }}";
const DESCRIPTION_MARKER: &str = "{{ description }}";
const DCQL_QUERY_MARKER: &str = "{{ dcql_query }}";

/// Build the verifier microservice for `verifier`.
///
/// # Errors
///
/// Returns an `Error::InputResolution` error if a linked flow's template is
/// missing, an `Error::InvalidInput` error if its stored query is missing or
/// not a DCQL query, or a template error if the archive does not have the
/// expected layout.
#[instrument(level = "debug", skip_all, fields(verifier = %verifier.id))]
pub fn assemble(
    mut archive: Archive, verifier: &RelyingParty, env: &EnvVars, ctx: Context,
) -> Result<Archive> {
    let linked = ctx
        .snapshot
        .verification_flows
        .iter()
        .filter(|f| f.relying_party == verifier.id)
        .map(|f| Ok((f, ctx.snapshot.template(&f.template)?)))
        .collect::<Result<Vec<(&VerificationFlow, &Template)>>>()?;
    tracing::debug!("{} linked verification flows", linked.len());

    let url = microservice_url(&verifier.endpoint, KIND);
    let trusted = ctx
        .snapshot
        .credential_issuers
        .iter()
        .map(|i| microservice_url(&i.endpoint, Kind::CredentialIssuer))
        .collect::<Vec<_>>();
    let display = EntityDisplay {
        name: verifier.name.clone(),
        locale: ctx.config.locale.clone(),
    };
    let placeholders = [(ctx.config.placeholders.verifier.as_str(), url.as_str())];
    archive.replace_json(&well_known_path(KIND), &placeholders, ctx.config.json_indent, |doc| {
        Ok(Patch::new()
            .set("display[0]", &display)?
            .set("jwks.keys[0].kid", "")?
            .set("trusted_credential_issuers", &trusted)?
            .apply(doc))
    })?;

    let public = public_path(KIND);
    let mut list = FlowList::default();

    for (flow, template) in &linked {
        let flow_path = format!("{public}/{}", flow.id);
        let Some(query_text) = template.dcql_query_text() else {
            return Err(invalid!("template {} has no DCQL query", template.id));
        };
        let query_object: Value = serde_json::from_str(&query_text)
            .map_err(|e| invalid!("template {} has an invalid DCQL query: {e}", template.id))?;
        let query = DcqlQuery::parse(&query_text)?;

        // details page
        archive.copy_with_transform(
            &format!("{public}/{}.{}", file_names::DETAILS, extensions::ZEN),
            &format!("{flow_path}/{}.{}", file_names::DETAILS, extensions::ZEN),
            |page| {
                if !page.contains(TITLE_MARKER) || !page.contains(DESCRIPTION_MARKER) {
                    return Err(malformed!("details page is missing its title or description marker"));
                }
                Ok(page.replace(TITLE_MARKER, &flow.name).replace(DESCRIPTION_MARKER, &flow.description))
            },
        )?;

        // stored query page
        archive.copy_with_transform(
            &format!("{public}/{}.{}", file_names::DCQL_QUERY, extensions::KEYS),
            &format!("{flow_path}/{}.{}", file_names::DCQL_QUERY, extensions::KEYS),
            |page| {
                if !page.contains(DCQL_QUERY_MARKER) {
                    return Err(malformed!("query page is missing its query marker"));
                }
                Ok(page.replace(DCQL_QUERY_MARKER, &query_text))
            },
        )?;

        let slot = query.primary_credential_type()?;
        add_custom_code(&mut archive, KIND, &slot, template)?;

        let payload = RequestPayload {
            request: AuthorizationRequest::new(url.clone(), query_object),
        };
        discovery::emit_pages(&mut archive, &public, &flow.id, &payload, ctx.config.json_indent)?;

        list.flows.push(FlowSummary {
            name: flow.name.clone(),
            description: flow.description.clone(),
            url: format!("{url}/{}/{}", flow.id, file_names::DETAILS),
        });
    }

    let list_path = format!("{public}/{}.{}", file_names::LIST, extensions::KEYS);
    add_json(&mut archive, &list_path, &list, ctx.config.json_indent)?;

    add_environment(&mut archive, env)?;
    prune(&mut archive, KIND);
    Ok(archive)
}
