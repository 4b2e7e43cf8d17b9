//! HTTP request construction.
//!
//! Recon requests present a realistic browser User-Agent and a spoofed client
//! address, so origin servers and proxies that trust forwarding headers log a
//! random source instead of the scanner.

mod request;

pub use request::{random_client_ip, random_user_agent, RequestHeaders, USER_AGENTS};
