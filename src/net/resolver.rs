//! Hostname resolution seam.

use futures_util::future::BoxFuture;
use std::io;
use std::net::IpAddr;
use std::sync::Mutex;

/// Looks up every address a hostname maps to.
pub trait Resolve: Send + Sync {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>>;
}

/// Resolver backed by the operating system (`getaddrinfo` via Tokio).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        Box::pin(async move {
            let addrs = tokio::net::lookup_host((host, 0)).await?;
            Ok(addrs.map(|addr| addr.ip()).collect())
        })
    }
}

/// Resolver answering from a fixed, replaceable record set.
///
/// Pins a gateway to known replicas without DNS, and lets tests script
/// failures.
#[derive(Debug)]
pub struct StaticResolver {
    records: Mutex<Result<Vec<IpAddr>, io::ErrorKind>>,
}

impl StaticResolver {
    pub fn new(records: Vec<IpAddr>) -> Self {
        Self { records: Mutex::new(Ok(records)) }
    }

    /// Replace the record set.
    pub fn set(&self, records: Vec<IpAddr>) {
        if let Ok(mut guard) = self.records.lock() {
            *guard = Ok(records);
        }
    }

    /// Make every following lookup fail with `kind`.
    pub fn fail(&self, kind: io::ErrorKind) {
        if let Ok(mut guard) = self.records.lock() {
            *guard = Err(kind);
        }
    }
}

impl Resolve for StaticResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        let answer = match self.records.lock() {
            Ok(guard) => match &*guard {
                Ok(records) => Ok(records.clone()),
                Err(kind) => Err(io::Error::new(*kind, format!("lookup of {} failed", host))),
            },
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "resolver state poisoned")),
        };
        Box::pin(async move { answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_resolver_handles_ip_literal() {
        let ips = SystemResolver.lookup("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_static_resolver_script() {
        let resolver = StaticResolver::new(vec!["10.0.0.1".parse().unwrap()]);
        assert_eq!(resolver.lookup("gw").await.unwrap().len(), 1);
        resolver.fail(io::ErrorKind::NotFound);
        assert!(resolver.lookup("gw").await.is_err());
    }
}
