//! # Per-Kind Assemblers
//!
//! One assembler per microservice kind. Each takes its own copy of the base
//! template archive and one configured endpoint, and returns the archive
//! customised for that endpoint: discovery documents, custom code, pages,
//! environment and Dockerfile, with other kinds' folders pruned.
//!
//! The helpers in this module are shared by all three assemblers.

pub mod authz_server;
pub mod credential_issuer;
pub mod verifier;

use std::collections::BTreeMap;

use crate::Result;
use crate::archive::Archive;
use crate::config::{
    CUSTOM_CODE, Config, DEFAULT_SLOT, DOCKERFILE, ENV, ENV_EXAMPLE, PUBLIC, TESTS, WELL_KNOWN,
    extensions,
};
use crate::error::{Error, malformed};
use crate::microservice::Kind;
use crate::patch::to_string_indented;
use crate::types::{Snapshot, Template};

/// Read-only inputs shared by every assembler in one bundle.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    /// The organization's entities.
    pub snapshot: &'a Snapshot,

    /// Generation settings.
    pub config: &'a Config,
}

/// Environment values for one microservice.
pub type EnvVars = BTreeMap<String, String>;

/// Path of a kind's discovery document.
#[must_use]
pub fn well_known_path(kind: Kind) -> String {
    format!("{PUBLIC}/{}/{WELL_KNOWN}/{}", kind.folder(), kind.well_known())
}

/// Path of a kind's public folder.
#[must_use]
pub fn public_path(kind: Kind) -> String {
    format!("{PUBLIC}/{}", kind.folder())
}

/// Base path (without extension) of a custom code slot.
///
/// # Errors
///
/// Returns an `Error::MissingTemplateEntry` error if the template has no
/// custom code folder for `kind`.
pub fn custom_code_path(archive: &Archive, kind: Kind, slot: &str) -> Result<String> {
    let folder = format!("{CUSTOM_CODE}/{}", kind.folder());
    if !archive.has_folder(&folder) {
        return Err(Error::MissingTemplateEntry(format!("{folder} not found in template archive")));
    }
    Ok(format!("{folder}/{slot}"))
}

/// Write a template's custom code into `slot`, returning the slot's base
/// path. An empty script falls back to the kind's default contract; contract
/// keys are written only when present.
///
/// # Errors
///
/// Returns an `Error::MissingTemplateEntry` error if the custom code folder
/// or the default contract is missing.
pub fn add_custom_code(
    archive: &mut Archive, kind: Kind, slot: &str, template: &Template,
) -> Result<String> {
    let base = custom_code_path(archive, kind, slot)?;
    let zen = format!("{base}.{}", extensions::ZEN);

    if template.zencode_script.trim().is_empty() {
        let default = custom_code_path(archive, kind, DEFAULT_SLOT)?;
        archive.copy_entry(&format!("{default}.{}", extensions::ZEN), &zen)?;
    } else {
        archive.add_entry(&zen, template.zencode_script.as_str());
    }

    if let Some(keys) = template.zencode_data.as_deref().filter(|k| !k.trim().is_empty()) {
        archive.add_entry(&format!("{base}.{}", extensions::KEYS), keys);
    }
    Ok(base)
}

/// Serialize `value` as indented JSON into a new entry.
///
/// # Errors
///
/// Returns an `Error::MalformedTemplate` error if the value cannot be
/// serialized.
pub fn add_json(
    archive: &mut Archive, path: &str, value: &impl serde::Serialize, indent: usize,
) -> Result<()> {
    archive.add_entry(path, to_string_indented(value, indent)?);
    Ok(())
}

/// Write `.env` (from `.env.example`) and add build arguments to the
/// Dockerfile for every environment value.
///
/// # Errors
///
/// Returns an `Error::MissingTemplateEntry` error if either template file is
/// missing, or an `Error::MalformedTemplate` error if the Dockerfile has no
/// `FROM` instruction.
pub fn add_environment(archive: &mut Archive, env: &EnvVars) -> Result<()> {
    let example = archive.read_text(ENV_EXAMPLE)?;
    archive.add_entry(ENV, merge_env(&example, env));
    archive.replace_text(DOCKERFILE, |dockerfile| add_build_args(dockerfile, env))
}

/// Delete the folders of every other microservice kind, and the template's
/// tests.
pub fn prune(archive: &mut Archive, kind: Kind) {
    for other in kind.others() {
        archive.delete_folder(&format!("{CUSTOM_CODE}/{}", other.folder()));
        archive.delete_folder(&format!("{PUBLIC}/{}", other.folder()));
    }
    archive.delete_folder(TESTS);
}

// Assign values to matching `KEY=` lines, appending the rest.
fn merge_env(example: &str, env: &EnvVars) -> String {
    let mut pending = env.clone();
    let mut lines = vec![];

    for line in example.lines() {
        let key = line.split_once('=').map(|(k, _)| k.trim()).filter(|k| !k.starts_with('#'));
        match key.and_then(|k| pending.remove_entry(k)) {
            Some((key, value)) => lines.push(format!("{key}={value}")),
            None => lines.push(line.to_string()),
        }
    }
    lines.extend(pending.into_iter().map(|(key, value)| format!("{key}={value}")));

    let mut env = lines.join("\n");
    env.push('\n');
    env
}

// Replace `ARG KEY` lines, inserting missing ones after the first `FROM`.
fn add_build_args(dockerfile: &str, env: &EnvVars) -> Result<String> {
    let mut lines = dockerfile.lines().map(ToString::to_string).collect::<Vec<_>>();
    let Some(from) = lines.iter().position(|l| is_instruction(l, "FROM")) else {
        return Err(malformed!("{DOCKERFILE} has no FROM instruction"));
    };

    let mut insert_at = from + 1;
    for (key, value) in env {
        let arg = format!("ARG {key}={value}");
        if let Some(existing) = lines.iter_mut().find(|l| arg_name(l) == Some(key.as_str())) {
            *existing = arg;
        } else {
            lines.insert(insert_at, arg);
            insert_at += 1;
        }
    }

    let mut dockerfile = lines.join("\n");
    dockerfile.push('\n');
    Ok(dockerfile)
}

fn is_instruction(line: &str, instruction: &str) -> bool {
    line.split_whitespace().next().is_some_and(|word| word.eq_ignore_ascii_case(instruction))
}

fn arg_name(line: &str) -> Option<&str> {
    if !is_instruction(line, "ARG") {
        return None;
    }
    let declaration = line.trim_start()[3..].trim();
    declaration.split('=').next().map(str::trim)
}
