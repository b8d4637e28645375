//! Cluster/environment to bootstrap-address resolution.
//!
//! Resolution is a pluggable collaborator: the pipeline only sees
//! [`ResolveEndpoint`], so a deployment can swap the built-in static map for
//! an external lookup without touching the dump stages.

use std::collections::HashMap;
use std::env;

/// A resolved message-bus endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaEndpoint {
    pub bootstrap_servers: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no bootstrap address known for cluster '{cluster}' environment '{environment}'")]
    UnknownCluster { cluster: String, environment: String },
    #[error("no cluster/environment selector given and no KAFKA_BOOTSTRAP override set")]
    NoSelector,
}

/// Trait for resolving a (cluster, environment) selector to a Kafka endpoint.
pub trait ResolveEndpoint: Send + Sync {
    fn resolve(
        &self,
        cluster: Option<&str>,
        environment: Option<&str>,
    ) -> Result<KafkaEndpoint, ResolveError>;
}

/// Endpoint resolver backed by a static (cluster, environment) map.
///
/// An explicit override (typically from the `KAFKA_BOOTSTRAP` environment
/// variable) takes precedence over the map; with neither, resolution fails.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointResolver {
    entries: HashMap<(String, String), String>,
    override_bootstrap: Option<String>,
}

impl StaticEndpointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with the `KAFKA_BOOTSTRAP` override read from the
    /// environment.
    pub fn from_env() -> Self {
        Self {
            entries: HashMap::new(),
            override_bootstrap: env::var("KAFKA_BOOTSTRAP").ok(),
        }
    }

    /// Register a bootstrap address for a (cluster, environment) pair.
    pub fn with_entry(
        mut self,
        cluster: impl Into<String>,
        environment: impl Into<String>,
        bootstrap_servers: impl Into<String>,
    ) -> Self {
        self.entries
            .insert((cluster.into(), environment.into()), bootstrap_servers.into());
        self
    }

    /// Force a fixed bootstrap address regardless of selectors.
    pub fn with_override(mut self, bootstrap_servers: impl Into<String>) -> Self {
        self.override_bootstrap = Some(bootstrap_servers.into());
        self
    }
}

impl ResolveEndpoint for StaticEndpointResolver {
    fn resolve(
        &self,
        cluster: Option<&str>,
        environment: Option<&str>,
    ) -> Result<KafkaEndpoint, ResolveError> {
        if let Some(bootstrap) = &self.override_bootstrap {
            return Ok(KafkaEndpoint {
                bootstrap_servers: bootstrap.clone(),
            });
        }

        let (Some(cluster), Some(environment)) = (cluster, environment) else {
            return Err(ResolveError::NoSelector);
        };

        self.entries
            .get(&(cluster.to_string(), environment.to_string()))
            .map(|bootstrap| KafkaEndpoint {
                bootstrap_servers: bootstrap.clone(),
            })
            .ok_or_else(|| ResolveError::UnknownCluster {
                cluster: cluster.to_string(),
                environment: environment.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_finds_registered_entry() {
        let resolver = StaticEndpointResolver::new()
            .with_entry("PHY-PROD-CL1", "PROD", "phy-prod-kafka:9093")
            .with_entry("VM-UAT-CL2", "UAT", "vm-uat-kafka:9093");

        let endpoint = resolver.resolve(Some("VM-UAT-CL2"), Some("UAT")).unwrap();
        assert_eq!(endpoint.bootstrap_servers, "vm-uat-kafka:9093");
    }

    #[test]
    fn test_resolver_rejects_unknown_pair() {
        let resolver =
            StaticEndpointResolver::new().with_entry("PHY-PROD-CL1", "PROD", "phy-prod-kafka:9093");

        let result = resolver.resolve(Some("PHY-PROD-CL1"), Some("UAT"));
        assert!(matches!(result, Err(ResolveError::UnknownCluster { .. })));
    }

    #[test]
    fn test_override_wins_over_map() {
        let resolver = StaticEndpointResolver::new()
            .with_entry("PHY-PROD-CL1", "PROD", "phy-prod-kafka:9093")
            .with_override("localhost:9092");

        let endpoint = resolver.resolve(Some("PHY-PROD-CL1"), Some("PROD")).unwrap();
        assert_eq!(endpoint.bootstrap_servers, "localhost:9092");

        // Override also satisfies selector-less resolution.
        let endpoint = resolver.resolve(None, None).unwrap();
        assert_eq!(endpoint.bootstrap_servers, "localhost:9092");
    }

    #[test]
    fn test_missing_selector_without_override_fails() {
        let resolver = StaticEndpointResolver::new();
        assert!(matches!(
            resolver.resolve(None, None),
            Err(ResolveError::NoSelector)
        ));
    }
}
