//! # Discovery Pages
//!
//! Issuers and verifiers publish two pages per flow: a deep link and a QR
//! code. Both are rendered by the microservice from a page contract copied
//! from the template (`<public>/<page>.zen`) and a keys file generated here
//! (`<public>/<flow id>/<page>.keys.json`).
//!
//! The two keys files share one payload. The deep-link variant adds
//! `deeplink_path`; the QR code variant adds `qrcode_path` and the `command`
//! used to render the code. Every other field is identical.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;
use crate::archive::Archive;
use crate::config::{extensions, file_names};
use crate::error::malformed;
use crate::patch::to_string_indented;

/// Script shipped with the template that renders a QR code page.
const QRCODE_SCRIPT: &str = "./scripts/qrcode.sh";

/// A discovery page variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    /// Clickable link carrying the payload.
    Deeplink,

    /// Scannable QR code carrying the payload.
    Qrcode,
}

impl Page {
    /// The page's file name (without extension).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deeplink => file_names::DEEPLINK,
            Self::Qrcode => file_names::QRCODE,
        }
    }

    // Fields added to the shared payload for this variant.
    fn extend(self, keys: &mut Map<String, Value>, page_path: &str) {
        match self {
            Self::Deeplink => {
                keys.insert("deeplink_path".to_string(), Value::from(page_path));
            }
            Self::Qrcode => {
                keys.insert("qrcode_path".to_string(), Value::from(page_path));
                keys.insert("command".to_string(), Value::from(format!("{QRCODE_SCRIPT} {page_path}")));
            }
        }
    }
}

/// Emit one discovery page for a flow: the template's page contract copied
/// into the flow's folder, and the page's keys file built from `payload`.
///
/// # Errors
///
/// Returns an `Error::MissingTemplateEntry` error if the template has no
/// contract for the page, or an `Error::MalformedTemplate` error if
/// `payload` does not serialize to a JSON object.
pub fn emit_page(
    archive: &mut Archive, public_path: &str, flow_id: &str, payload: &impl Serialize,
    page: Page, indent: usize,
) -> Result<()> {
    let payload = payload_object(payload)?;
    write_page(archive, public_path, flow_id, payload, page, indent)
}

/// Emit both the deep-link and QR code pages for a flow from one payload.
///
/// # Errors
///
/// See [`emit_page`].
pub fn emit_pages(
    archive: &mut Archive, public_path: &str, flow_id: &str, payload: &impl Serialize,
    indent: usize,
) -> Result<()> {
    let payload = payload_object(payload)?;
    for page in [Page::Deeplink, Page::Qrcode] {
        write_page(archive, public_path, flow_id, payload.clone(), page, indent)?;
    }
    Ok(())
}

fn write_page(
    archive: &mut Archive, public_path: &str, flow_id: &str, mut keys: Map<String, Value>,
    page: Page, indent: usize,
) -> Result<()> {
    let flow_path = format!("{public_path}/{flow_id}");
    let page_path = format!("{flow_path}/{}", page.name());
    tracing::debug!("emitting {page_path}");

    archive.copy_entry(
        &format!("{public_path}/{}.{}", page.name(), extensions::ZEN),
        &format!("{page_path}.{}", extensions::ZEN),
    )?;

    page.extend(&mut keys, &page_path);
    archive.add_entry(
        &format!("{page_path}.{}", extensions::KEYS),
        to_string_indented(&keys, indent)?,
    );
    Ok(())
}

fn payload_object(payload: &impl Serialize) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed!("page payload must be an object, got {other}")),
        Err(e) => Err(malformed!("cannot serialize page payload: {e}")),
    }
}
