//! Generates deployment bundles for an organization's credential
//! microservices: [OAuth authorization servers](https://www.rfc-editor.org/rfc/rfc8414),
//! [OpenID4VCI](https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html)
//! credential issuers and [OpenID4VP](https://openid.net/specs/openid-4-verifiable-presentations-1_0.html)
//! verifiers.
//!
//! A bundle is a zip archive holding one ready-to-run project per configured
//! endpoint, derived from a base microservices template, together with a
//! `docker-compose.yaml` and `Caddyfile` that run every service behind a
//! single reverse proxy.
//!
//! # Example
//!
//! ```rust,no_run
//! use credibil_bundler::provider::{RemoteTemplate, StandardEnvironment, Template};
//! use credibil_bundler::{Config, Snapshot, create_bundle};
//!
//! # async fn run(snapshot: Snapshot) -> anyhow::Result<()> {
//! let config = Config::default();
//! let template = RemoteTemplate::from(&config).fetch().await?;
//! let bundle = create_bundle(&template, &snapshot, &StandardEnvironment::default(), &config)?;
//! std::fs::write("microservices.zip", bundle)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod assemble;
pub mod bundle;
pub mod compose;
pub mod config;
pub mod dcql;
pub mod discovery;
pub mod microservice;
pub mod patch;
pub mod provider;
pub mod schema;
pub mod types;

mod error;

pub use self::bundle::{CONTENT_TYPE, create_bundle, generate};
pub use self::config::Config;
pub use self::error::{Error, Fault};
pub use self::types::*;

/// Result type for bundle generation.
pub type Result<T, E = Error> = anyhow::Result<T, E>;
