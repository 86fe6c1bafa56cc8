//! # Authorization Server
//!
//! Customises the template for one OAuth authorization server: its discovery
//! document advertises a scope per linked credential type, and each linked
//! flow gets its authorization contract plus a description of the fields the
//! holder fills in.

use serde_json::Value;
use tracing::instrument;

use super::{Context, EnvVars, add_custom_code, add_environment, add_json, prune, well_known_path};
use crate::Result;
use crate::archive::Archive;
use crate::config::extensions;
use crate::error::malformed;
use crate::microservice::{Kind, microservice_url};
use crate::patch::Patch;
use crate::schema::{ObjectSchema, merge_schemas};
use crate::types::{AuthorizationServer, ClaimDescriptor, IssuanceFlow, Template};

const KIND: Kind = Kind::AuthzServer;

/// Build the authorization server microservice for `server`.
///
/// # Errors
///
/// Returns an `Error::InputResolution` error if a linked flow's authorization
/// template is missing, or a template error if the archive does not have the
/// expected layout.
#[instrument(level = "debug", skip_all, fields(server = %server.id))]
pub fn assemble(
    mut archive: Archive, server: &AuthorizationServer, env: &EnvVars, ctx: Context,
) -> Result<Archive> {
    let linked = ctx
        .snapshot
        .issuance_flows
        .iter()
        .filter(|f| f.authorization_server == server.id)
        .map(|f| Ok((f, ctx.snapshot.template(&f.authorization_template)?)))
        .collect::<Result<Vec<(&IssuanceFlow, &Template)>>>()?;
    tracing::debug!("{} linked issuance flows", linked.len());

    let url = microservice_url(&server.endpoint, KIND);
    let scopes = linked.iter().map(|(f, _)| f.type_name.as_str()).collect::<Vec<_>>();
    let placeholders = [(ctx.config.placeholders.authz_server.as_str(), url.as_str())];
    archive.replace_json(&well_known_path(KIND), &placeholders, ctx.config.json_indent, |doc| {
        Ok(Patch::new().set("jwks.keys[0].kid", "")?.set("scopes_supported", &scopes)?.apply(doc))
    })?;

    for (flow, template) in &linked {
        let base = add_custom_code(&mut archive, KIND, &flow.type_name, template)?;
        let (schema, claims) = describe(template, &ctx.config.locale)?;
        add_json(&mut archive, &format!("{base}.{}", extensions::SCHEMA), &schema, ctx.config.json_indent)?;
        add_json(
            &mut archive,
            &format!("{base}.{}", extensions::METADATA),
            &serde_json::json!({ "claims": claims }),
            ctx.config.json_indent,
        )?;
    }

    add_environment(&mut archive, env)?;
    prune(&mut archive, KIND);
    Ok(archive)
}

/// The schema description of an authorization template: its form fields
/// (secondary schema) merged with the user attributes (primary schema), each
/// property list also recorded by name, and the claims derived from the
/// merged schema.
///
/// # Errors
///
/// Returns an `Error::InvalidInput` error if either schema is not an object
/// schema.
pub fn describe(template: &Template, locale: &str) -> Result<(Value, Vec<ClaimDescriptor>)> {
    let user_attributes = ObjectSchema::from_value(&template.schema)?;
    let form_fields = match &template.schema_secondary {
        Some(Value::Null) | None => ObjectSchema::default(),
        Some(schema) => ObjectSchema::from_value(schema)?,
    };

    let merged = merge_schemas(&[form_fields.clone(), user_attributes.clone()]);
    let claims = merged.to_claims(locale, &[]);
    let schema = serde_json::to_value(&merged)
        .map_err(|e| malformed!("cannot serialize schema for {}: {e}", template.id))?;
    let schema = Patch::new()
        .set("form_fields", form_fields.property_keys())?
        .set("user_attributes", user_attributes.property_keys())?
        .apply(schema);

    Ok((schema, claims))
}
