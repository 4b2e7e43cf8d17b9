//! Subdomain takeover rule engine.
//!
//! [`evaluate_rules`] walks [`RULES`] in order. The first rule whose DNS
//! predicate matches owns the host and ends the walk, whether or not its
//! fingerprints are found, so a host is attributed to at most one provider.

mod rules;

pub use rules::{Rule, RULES};

use crate::dns::Resolution;
use crate::engine::{Severity, Tag};

/// Outcome of evaluating the rule table for one host.
#[derive(Debug, Clone, Copy)]
pub enum TakeoverVerdict {
    /// No provider claims the host.
    NoProvider,
    /// A provider hosts the name and the body shows it is claimed.
    Provider(&'static Rule),
    /// A provider hosts the name and the body shows it is unclaimed.
    Vulnerable(&'static Rule),
}

impl TakeoverVerdict {
    /// Owning provider, if any.
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            TakeoverVerdict::NoProvider => None,
            TakeoverVerdict::Provider(rule) | TakeoverVerdict::Vulnerable(rule) => {
                Some(rule.provider)
            }
        }
    }

    /// Danger tag for a vulnerable host.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            TakeoverVerdict::Vulnerable(rule) => Some(rule.tag()),
            _ => None,
        }
    }
}

impl Rule {
    /// True when DNS attributes the host to this provider.
    pub fn owns(&self, resolution: &Resolution) -> bool {
        let cname = resolution.cname.as_str();
        self.cname_exact.iter().any(|exact| cname == *exact)
            || self.cname_suffixes.iter().any(|suffix| cname.ends_with(suffix))
            || resolution
                .addrs
                .iter()
                .any(|addr| self.addrs.iter().any(|known| addr.to_string() == *known))
    }

    /// True when `body` is this provider's unclaimed-name response.
    pub fn is_unclaimed(&self, body: &str) -> bool {
        (self.empty_body && body.is_empty())
            || self.fingerprints.iter().any(|fp| body.contains(fp))
    }

    pub fn tag(&self) -> Tag {
        Tag::new(
            format!("{} domain takeover", self.provider),
            Severity::Danger,
            self.reference,
        )
    }
}

/// Evaluates the provider table for a resolved host and its response body.
pub fn evaluate_rules(resolution: &Resolution, body: &str) -> TakeoverVerdict {
    for rule in RULES {
        if !rule.owns(resolution) {
            continue;
        }
        return if rule.is_unclaimed(body) {
            TakeoverVerdict::Vulnerable(rule)
        } else {
            TakeoverVerdict::Provider(rule)
        };
    }
    TakeoverVerdict::NoProvider
}
