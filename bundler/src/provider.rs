//! # Provider Traits
//!
//! This module defines the `Provider` trait and its associated traits, which
//! library users implement to supply the base template archive and the
//! environment values written into each generated microservice.
//!
//! [`RemoteTemplate`] and [`StandardEnvironment`] cover the common case of
//! downloading the template from its published location and deriving the
//! environment from the endpoint itself.

use std::collections::BTreeMap;
use std::future::Future;

use anyhow::{Context, Result, bail};

use crate::config::Config;
use crate::microservice::{Kind, microservice_url};
use crate::types::Endpoint;

/// Bundle Provider trait.
pub trait Provider: Template + Environment + Clone {}

/// A blanket implementation for `Provider` trait so that any type implementing
/// the required super traits is considered a `Provider`.
impl<T> Provider for T where T: Template + Environment + Clone {}

/// The `Template` trait supplies the base microservices template archive.
pub trait Template: Send + Sync {
    /// Zip-encoded bytes of the base template.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// The `Environment` trait supplies the environment variables written to a
/// microservice's `.env` file and Dockerfile build arguments.
pub trait Environment: Send + Sync {
    /// Environment values for the microservice deployed at `endpoint`.
    ///
    /// Values are written verbatim.
    fn fill(&self, endpoint: &Endpoint, kind: Kind) -> Result<BTreeMap<String, String>>;
}

/// Downloads the base template archive over HTTP.
#[derive(Clone, Debug)]
pub struct RemoteTemplate {
    /// Location of the template archive.
    pub url: String,
}

impl RemoteTemplate {
    /// Create a template source for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&Config> for RemoteTemplate {
    fn from(config: &Config) -> Self {
        Self::new(config.template_url.clone())
    }
}

impl Template for RemoteTemplate {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("fetching template from {}", self.url);
        let response = reqwest::get(&self.url).await.context("requesting template")?;
        if !response.status().is_success() {
            bail!("template request to {} failed: {}", self.url, response.status());
        }
        let bytes = response.bytes().await.context("reading template")?;
        Ok(bytes.to_vec())
    }
}

/// Environment derived from the endpoint: `MS_NAME` (endpoint name),
/// `MS_URL` (microservice base URL) and `MS_PORT`.
#[derive(Clone, Debug)]
pub struct StandardEnvironment {
    /// Port the microservice listens on.
    pub service_port: u16,
}

impl Default for StandardEnvironment {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for StandardEnvironment {
    fn from(config: &Config) -> Self {
        Self {
            service_port: config.service_port,
        }
    }
}

impl Environment for StandardEnvironment {
    fn fill(&self, endpoint: &Endpoint, kind: Kind) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::from([
            ("MS_NAME".to_string(), endpoint.name.clone()),
            ("MS_URL".to_string(), microservice_url(&endpoint.endpoint, kind)),
            ("MS_PORT".to_string(), self.service_port.to_string()),
        ]))
    }
}
