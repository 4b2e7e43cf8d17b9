//! DNS resolution for takeover detection.
//!
//! Takeover rules need two facts about a host: the addresses it resolves to
//! and the canonical name at the end of its CNAME chain. [`HostResolver`]
//! hides where those come from so detection can be exercised without a
//! network.

mod resolution;

pub use resolution::{fqdn, HickoryResolver, HostResolver, Resolution};
