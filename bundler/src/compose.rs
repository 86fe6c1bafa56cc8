//! # Orchestration
//!
//! Every microservice in a bundle runs as one compose service behind a
//! shared Caddy reverse proxy. [`Orchestration`] accumulates a service block
//! and a proxy route per registered endpoint, then writes
//! `docker-compose.yaml` and `Caddyfile` at the bundle root.
//!
//! Routes are grouped by the origin of the endpoint URL, so services of
//! different kinds deployed on one host share a single site block. Sites and
//! routes keep registration order.

use std::fmt::Write as _;

use crate::Result;
use crate::archive::Archive;
use crate::config::{CADDYFILE, Config, DOCKER_COMPOSE};
use crate::error::invalid;
use crate::microservice::{Kind, origin};

const CADDY_SERVICE: &str = r"
  caddy:
    container_name: caddy
    image: caddy:alpine
    restart: unless-stopped
    ports:
      - 80:80
      - 443:443
      - 443:443/udp
    volumes:
      - ./Caddyfile:/etc/caddy/Caddyfile
      - ./site:/srv
      - caddy_data:/data
      - caddy_config:/config

volumes:
  caddy_data:
  caddy_config:
";

/// Accumulated orchestration state for one bundle.
#[derive(Clone, Debug)]
pub struct Orchestration {
    service_port: u16,
    host_config_dir: String,
    services: Vec<String>,
    sites: Vec<Site>,
}

#[derive(Clone, Debug)]
struct Site {
    origin: String,
    routes: Vec<String>,
}

impl Orchestration {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            service_port: config.service_port,
            host_config_dir: config.host_config_dir.clone(),
            services: vec![],
            sites: vec![],
        }
    }

    /// Service names registered so far.
    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Register an endpoint, returning its service name.
    ///
    /// # Errors
    ///
    /// Returns an `Error::InvalidInput` error if another endpoint of the same
    /// kind already produced the same service name.
    pub fn register(&mut self, name: &str, kind: Kind, endpoint: &str) -> Result<String> {
        let service = kind.service_name(name);
        if self.services.contains(&service) {
            return Err(invalid!("more than one {kind} resolves to service `{service}`"));
        }

        let route = format!("reverse_proxy /{}/* {service}:{}", kind.folder(), self.service_port);
        let origin = origin(endpoint);
        match self.sites.iter_mut().find(|s| s.origin == origin) {
            Some(site) => site.routes.push(route),
            None => self.sites.push(Site { origin, routes: vec![route] }),
        }

        tracing::debug!("registered service {service}");
        self.services.push(service.clone());
        Ok(service)
    }

    /// Compose file contents.
    #[must_use]
    pub fn compose(&self) -> String {
        let mut compose = String::from("services:");
        for service in &self.services {
            let _ = write!(
                compose,
                "
  {service}:
    container_name: {service}
    build: ./{service}
    volumes:
    - type: bind
      source: {host}
      target: /root/.config/didroom
",
                host = self.host_config_dir
            );
        }

        let mut caddy = CADDY_SERVICE.to_string();
        if !self.services.is_empty() {
            let mut depends_on = String::from("    depends_on:\n");
            for service in &self.services {
                let _ = writeln!(depends_on, "      {service}:\n        condition: service_started");
            }
            caddy = caddy.replacen("  caddy:\n", &format!("  caddy:\n{depends_on}"), 1);
        }
        compose.push_str(&caddy);
        compose
    }

    /// Caddyfile contents.
    #[must_use]
    pub fn caddyfile(&self) -> String {
        let mut caddyfile = String::new();
        for site in &self.sites {
            let _ = writeln!(caddyfile, "{} {{", site.origin);
            for route in &site.routes {
                let _ = writeln!(caddyfile, "\t{route}");
            }
            caddyfile.push_str("}\n");
        }
        caddyfile
    }

    /// Write the compose file and Caddyfile at the root of `archive`.
    pub fn finalize(self, archive: &mut Archive) {
        archive.add_entry(DOCKER_COMPOSE, self.compose());
        archive.add_entry(CADDYFILE, self.caddyfile());
    }
}
