//! Reverse DNS at accept time.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::debug;

/// Cap on PTR queries so a slow resolver cannot stall accepts.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Shared reverse-lookup resolver.
pub struct DnsResolver {
    inner: TokioResolver,
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsResolver {
    /// System resolver config when available, library defaults otherwise.
    pub fn new() -> Self {
        let inner = TokioResolver::builder_tokio()
            .map(|b| b.build())
            .unwrap_or_else(|_| {
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            });
        Self { inner }
    }

    /// PTR name for `ip`, without the trailing dot. `None` on timeout,
    /// resolution failure, or an empty answer.
    pub async fn reverse_lookup(&self, ip: IpAddr) -> Option<String> {
        match tokio::time::timeout(LOOKUP_TIMEOUT, self.inner.reverse_lookup(ip)).await {
            Ok(Ok(ptr)) => ptr
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string()),
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "Reverse lookup failed");
                None
            }
            Err(_) => {
                debug!(%ip, "Reverse lookup timed out");
                None
            }
        }
    }
}
