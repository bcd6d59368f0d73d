// ── Host name resolution ──
//
// Node addresses and the controller-port host are resolved on every run.
// Resolution may block; the watch bridge runs reconciliation on the
// blocking pool for that reason.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use tracing::trace;

use crate::error::ResolveError;

/// Resolves a hostname to a single IPv4 address.
///
/// IPv6 literals and IPv6-only hosts are rejected with
/// [`ResolveError::NoAddress`]; the document only carries IPv4.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolveError>;
}

impl<R: HostResolver + ?Sized> HostResolver for Arc<R> {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        (**self).resolve(host)
    }
}

/// Parse `host` as an IP literal. `None` means it is a name.
fn literal(host: &str) -> Option<Result<Ipv4Addr, ResolveError>> {
    match host.parse::<IpAddr>().ok()? {
        IpAddr::V4(ip) => Some(Ok(ip)),
        IpAddr::V6(_) => Some(Err(ResolveError::NoAddress {
            host: host.to_owned(),
        })),
    }
}

/// The operating system's resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        if let Some(result) = literal(host) {
            return result;
        }

        let mut addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|e| ResolveError::Lookup {
                host: host.to_owned(),
                reason: e.to_string(),
            })?;

        let ip = addrs
            .find_map(|a| match a {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .ok_or_else(|| ResolveError::NoAddress {
                host: host.to_owned(),
            })?;
        trace!(host, %ip, "resolved");
        Ok(ip)
    }
}

/// A fixed hosts table, optionally falling back to another resolver.
#[derive(Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Ipv4Addr>,
    fallback: Option<Arc<dyn HostResolver>>,
}

impl StaticResolver {
    pub fn new(entries: HashMap<String, Ipv4Addr>) -> Self {
        Self {
            entries,
            fallback: None,
        }
    }

    pub fn with_entry(mut self, host: impl Into<String>, ip: Ipv4Addr) -> Self {
        self.entries.insert(host.into(), ip);
        self
    }

    pub fn with_fallback(mut self, fallback: impl HostResolver + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }
}

impl std::fmt::Debug for StaticResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticResolver")
            .field("entries", &self.entries)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        if let Some(ip) = self.entries.get(host) {
            return Ok(*ip);
        }
        if let Some(result) = literal(host) {
            return result;
        }
        match &self.fallback {
            Some(fallback) => fallback.resolve(host),
            None => Err(ResolveError::Lookup {
                host: host.to_owned(),
                reason: "not in hosts table".into(),
            }),
        }
    }
}
