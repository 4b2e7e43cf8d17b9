//! Address and canonical-name resolution.

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;

/// What DNS says about one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Every A/AAAA address the host resolves to.
    pub addrs: Vec<IpAddr>,
    /// Canonical name, fully qualified with a trailing dot. Equal to the host
    /// itself when it has no CNAME.
    pub cname: String,
}

/// Source of DNS answers.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolves `host` to its addresses and canonical name.
    async fn resolve(&self, host: &str) -> Result<Resolution>;
}

/// Appends the root label if missing and lowercases the name.
pub fn fqdn(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with('.') {
        lower
    } else {
        format!("{lower}.")
    }
}

/// [`HostResolver`] backed by `hickory-resolver`.
pub struct HickoryResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryResolver {
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl HostResolver for HickoryResolver {
    async fn resolve(&self, host: &str) -> Result<Resolution> {
        let name = fqdn(host);

        let response = self.resolver.lookup_ip(name.as_str()).await.map_err(Error::new)?;
        let addrs: Vec<IpAddr> = response.iter().collect();
        if addrs.is_empty() {
            return Err(Error::msg(format!("No IP addresses found for {host}")));
        }

        // The A/AAAA answer carries the CNAME chain; the last target is canonical
        let mut cname = name.clone();
        for record in response.as_lookup().record_iter() {
            if record.record_type() == RecordType::CNAME {
                if let Some(RData::CNAME(target)) = record.data() {
                    cname = fqdn(&target.0.to_utf8());
                }
            }
        }

        Ok(Resolution { addrs, cname })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn() {
        assert_eq!(fqdn("Example.COM"), "example.com.");
        assert_eq!(fqdn("example.com."), "example.com.");
        assert_eq!(fqdn("bucket.s3.amazonaws.com"), "bucket.s3.amazonaws.com.");
    }
}
