//! Port list aliases and parsing.

use crate::error_handling::ConfigError;

/// `small` alias
pub const SMALL_PORT_LIST: &[u16] = &[80, 443];

/// `medium` alias
pub const MEDIUM_PORT_LIST: &[u16] = &[80, 443, 8000, 8080, 8443];

/// `large` alias
pub const LARGE_PORT_LIST: &[u16] = &[
    80, 81, 443, 591, 2082, 2087, 2095, 2096, 3000, 8000, 8001, 8008, 8080, 8083, 8443, 8834,
    8888,
];

/// `xlarge` alias
pub const XLARGE_PORT_LIST: &[u16] = &[
    80, 81, 300, 443, 591, 593, 832, 981, 1010, 1311, 2082, 2087, 2095, 2096, 2480, 3000, 3128,
    3333, 4243, 4567, 4711, 4712, 4993, 5000, 5104, 5108, 5800, 6543, 7000, 7396, 7474, 8000,
    8001, 8008, 8014, 8042, 8069, 8080, 8081, 8088, 8090, 8091, 8118, 8123, 8172, 8222, 8243,
    8280, 8281, 8333, 8443, 8500, 8834, 8880, 8888, 8983, 9000, 9043, 9060, 9080, 9090, 9091,
    9200, 9443, 9800, 9981, 12443, 16080, 18091, 18092, 20720, 28017,
];

/// Expands a `--ports` value into a deduplicated port list.
///
/// Accepts one of the aliases (`small`, `medium`, `large`, `xlarge`) or a
/// comma-separated list of port numbers. Order of first appearance is kept.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>, ConfigError> {
    let spec = spec.trim();
    let alias = match spec.to_ascii_lowercase().as_str() {
        "small" => Some(SMALL_PORT_LIST),
        "medium" => Some(MEDIUM_PORT_LIST),
        "large" => Some(LARGE_PORT_LIST),
        "xlarge" => Some(XLARGE_PORT_LIST),
        _ => None,
    };
    if let Some(list) = alias {
        return Ok(list.to_vec());
    }

    let mut ports = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let port: u16 = part
            .parse()
            .map_err(|_| ConfigError::InvalidPort(part.to_string()))?;
        if port == 0 {
            return Err(ConfigError::InvalidPort(part.to_string()));
        }
        if !ports.contains(&port) {
            ports.push(port);
        }
    }

    if ports.is_empty() {
        return Err(ConfigError::InvalidPort(spec.to_string()));
    }
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_expand() {
        assert_eq!(parse_ports("small").unwrap(), vec![80, 443]);
        assert_eq!(parse_ports("MEDIUM").unwrap(), MEDIUM_PORT_LIST.to_vec());
        assert_eq!(parse_ports("large").unwrap().len(), LARGE_PORT_LIST.len());
        assert!(parse_ports("xlarge").unwrap().contains(&28017));
    }

    #[test]
    fn test_explicit_list_is_deduplicated() {
        assert_eq!(
            parse_ports("80, 8080,80,,443").unwrap(),
            vec![80, 8080, 443]
        );
    }

    #[test]
    fn test_invalid_ports_rejected() {
        assert!(parse_ports("http").is_err());
        assert!(parse_ports("0").is_err());
        assert!(parse_ports("70000").is_err());
        assert!(parse_ports(" , ").is_err());
    }
}
