use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

/// The pipeline's DNS seam: all it ever needs is "name -> first A record".
/// Mocked in tests to drive the scheduler without touching the network.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve_a(&self, name: &str) -> Option<IpAddr>;
}

pub struct Resolver {
    inner: TokioAsyncResolver,
}

impl Resolver {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 2;
        Self {
            inner: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

#[async_trait]
impl Resolve for Resolver {
    async fn resolve_a(&self, name: &str) -> Option<IpAddr> {
        match self.inner.ipv4_lookup(name).await {
            Ok(lookup) => lookup.iter().next().map(|a| IpAddr::V4(a.0)),
            Err(err) => {
                tracing::debug!(name, %err, "dns resolution failed");
                None
            }
        }
    }
}
