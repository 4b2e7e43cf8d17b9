//! Request headers: User-Agent rotation and client-IP spoofing.

use std::net::Ipv4Addr;

use rand::seq::IndexedRandom;
use rand::Rng;

/// Browser User-Agents rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.82 Mobile Safari/537.36",
];

/// Picks a User-Agent at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// A random public-looking IPv4 address (no 0.x, 10.x, 127.x or multicast).
pub fn random_client_ip() -> Ipv4Addr {
    let mut rng = rand::rng();
    loop {
        let first: u8 = rng.random_range(1..=223);
        if first == 10 || first == 127 {
            continue;
        }
        return Ipv4Addr::new(
            first,
            rng.random(),
            rng.random(),
            rng.random_range(1..=254),
        );
    }
}

/// Headers sent with every recon request.
pub struct RequestHeaders {
    user_agent: &'static str,
    client_ip: Ipv4Addr,
}

impl RequestHeaders {
    /// Random User-Agent and client IP for one request.
    pub fn random() -> Self {
        Self {
            user_agent: random_user_agent(),
            client_ip: random_client_ip(),
        }
    }

    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    pub fn client_ip(&self) -> Ipv4Addr {
        self.client_ip
    }

    /// Headers as (name, value) pairs. The same client IP appears in every
    /// forwarding header.
    pub fn as_vec(&self) -> Vec<(&'static str, String)> {
        let ip = self.client_ip;
        vec![
            ("user-agent", self.user_agent.to_string()),
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            ("accept-language", "en-US,en;q=0.9".to_string()),
            ("x-forwarded-for", ip.to_string()),
            ("x-real-ip", ip.to_string()),
            ("x-client-ip", ip.to_string()),
            ("forwarded", format!("for={ip};proto=http;by={ip}")),
            ("via", format!("1.1 {ip}")),
        ]
    }

    /// Applies the headers to a `reqwest::RequestBuilder`.
    pub fn apply_to_request_builder(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        self.as_vec()
            .into_iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
    }
}
