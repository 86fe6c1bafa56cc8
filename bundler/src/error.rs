//! # Bundle Errors
//!
//! Every fatal condition raised while generating a bundle is attributable to
//! either the organization's input data or the base template archive. Use
//! [`Error::fault`] to tell the two apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bundle generation errors.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The organization snapshot failed validation: an invalid or duplicated
    /// `type_name`, an unparseable stored query, clashing microservice
    /// names, and the like.
    #[error(r#"{{"error": "invalid_input", "error_description": "{0}"}}"#)]
    InvalidInput(String),

    /// A referenced entity (template, authorization server, issuer) is
    /// missing from the snapshot.
    #[error(r#"{{"error": "input_resolution", "error_description": "{0}"}}"#)]
    InputResolution(String),

    /// A template document or page does not parse, or is missing the marker
    /// text to substitute.
    #[error(r#"{{"error": "malformed_template", "error_description": "{0}"}}"#)]
    MalformedTemplate(String),

    /// An entry expected in the template archive could not be found.
    #[error(r#"{{"error": "missing_template_entry", "error_description": "{0}"}}"#)]
    MissingTemplateEntry(String),

    /// The base template archive could not be retrieved.
    #[error(r#"{{"error": "template_unavailable", "error_description": "{0}"}}"#)]
    TemplateUnavailable(String),

    /// An archive could not be read or serialized.
    #[serde(rename = "packaging_error")]
    #[error(r#"{{"error": "packaging_error", "error_description": "{0}"}}"#)]
    Packaging(String),
}

/// Identifies which party is responsible for a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The organization's configuration data is incomplete or invalid.
    Input,

    /// The base template archive does not match what the generator expects.
    Template,
}

impl Error {
    /// Attribute the error to bad input data or to a template/packaging
    /// mismatch.
    #[must_use]
    pub const fn fault(&self) -> Fault {
        match self {
            Self::InvalidInput(_) | Self::InputResolution(_) => Fault::Input,
            Self::MalformedTemplate(_)
            | Self::MissingTemplateEntry(_)
            | Self::TemplateUnavailable(_)
            | Self::Packaging(_) => Fault::Template,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidInput(e)) => Self::InvalidInput(format!("{err}: {e}")),
            Some(Self::InputResolution(e)) => Self::InputResolution(format!("{err}: {e}")),
            Some(Self::MalformedTemplate(e)) => Self::MalformedTemplate(format!("{err}: {e}")),
            Some(Self::MissingTemplateEntry(e)) => {
                Self::MissingTemplateEntry(format!("{err}: {e}"))
            }
            Some(Self::TemplateUnavailable(e)) => {
                Self::TemplateUnavailable(format!("{err}: {e}"))
            }
            Some(Self::Packaging(e)) => Self::Packaging(format!("{err}: {e}")),
            None => {
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::Packaging(stack)
            }
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Packaging(err.to_string())
    }
}

/// Construct an `Error::InvalidInput` error from a string or existing error
/// value.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidInput(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::Error::InvalidInput(format!($err))
    };
}
pub(crate) use invalid;

/// Construct an `Error::InputResolution` error for an unresolved reference.
macro_rules! unresolved {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InputResolution(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::Error::InputResolution(format!($err))
    };
}
pub(crate) use unresolved;

/// Construct an `Error::MalformedTemplate` error.
macro_rules! malformed {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::MalformedTemplate(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::Error::MalformedTemplate(format!($err))
    };
}
pub(crate) use malformed;

#[cfg(test)]
mod test {
    use anyhow::{Context, anyhow};
    use serde_json::json;

    use super::*;

    // Test that error details are rendered as json.
    #[test]
    fn display() {
        let err = Error::InputResolution("template abc not found".to_string());
        assert_eq!(
            err.to_string(),
            r#"{"error": "input_resolution", "error_description": "template abc not found"}"#
        );
    }

    #[test]
    fn bundle_context() {
        let result = Err::<(), Error>(Error::MissingTemplateEntry("Dockerfile".to_string()))
            .context("assembling verifier");
        let err: Error = result.unwrap_err().into();

        assert_eq!(
            err,
            Error::MissingTemplateEntry("assembling verifier: Dockerfile".to_string())
        );
        assert_eq!(err.fault(), Fault::Template);
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("disk full")).context("writing archive");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err, Error::Packaging("writing archive -> disk full".to_string()));
    }

    #[test]
    fn json() {
        let err = Error::Packaging("cannot write".to_string());
        let ser = serde_json::to_value(&err).unwrap();
        assert_eq!(ser, json!({"error": "packaging_error", "error_description": "cannot write"}));
    }

    #[test]
    fn fault() {
        assert_eq!(Error::InvalidInput(String::new()).fault(), Fault::Input);
        assert_eq!(Error::InputResolution(String::new()).fault(), Fault::Input);
        assert_eq!(Error::MalformedTemplate(String::new()).fault(), Fault::Template);
        assert_eq!(Error::TemplateUnavailable(String::new()).fault(), Fault::Template);
    }
}
