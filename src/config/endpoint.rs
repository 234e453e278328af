//! Cluster seed addresses.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ConfigError;

/// A discovery seed: one host with a single port or an inclusive port range.
///
/// Accepted forms are `host:port`, `host:port..port` and `[v6addr]:port[..port]`.
/// A seed is only a hint for locating members, not a guaranteed live node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterEndpoint {
    host: String,
    ports: RangeInclusive<u16>,
}

impl ClusterEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        Self::with_range(host, port, port)
    }

    /// Seed covering `start..=end`.
    ///
    /// Rejects an empty host, port 0 and a reversed range, as parsing does.
    pub fn with_range(host: impl Into<String>, start: u16, end: u16) -> Result<Self, ConfigError> {
        let host = host.into();
        let shown = format!("{host}:{start}..{end}");
        if host.is_empty() {
            return Err(Self::invalid(&shown, "empty host"));
        }
        if start == 0 || end == 0 {
            return Err(Self::invalid(&shown, "port 0 is not addressable"));
        }
        if start > end {
            return Err(Self::invalid(&shown, "port range is reversed"));
        }
        Ok(Self {
            host,
            ports: start..=end,
        })
    }

    /// The local seed used when nothing is configured: `127.0.0.1:47500..47509`.
    pub(super) fn local_default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            ports: 47500..=47509,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.ports.clone()
    }

    /// Expand the seed into concrete `host:port` addresses.
    pub fn addresses(&self) -> impl Iterator<Item = String> + '_ {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        self.ports.clone().map(move |port| format!("{host}:{port}"))
    }

    fn invalid(addr: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidEndpoint {
            addr: addr.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_port(addr: &str, raw: &str) -> Result<u16, ConfigError> {
        match raw.trim().parse::<u16>() {
            Ok(0) => Err(Self::invalid(addr, "port 0 is not addressable")),
            Ok(port) => Ok(port),
            Err(_) => Err(Self::invalid(addr, format!("bad port '{raw}'"))),
        }
    }
}

impl FromStr for ClusterEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = s.trim();
        if addr.is_empty() {
            return Err(Self::invalid(s, "empty address"));
        }

        let (host, ports) = if let Some(rest) = addr.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| Self::invalid(addr, "unterminated '['"))?;
            let ports = after
                .strip_prefix(':')
                .ok_or_else(|| Self::invalid(addr, "missing port"))?;
            (host, ports)
        } else {
            let (host, ports) = addr
                .split_once(':')
                .ok_or_else(|| Self::invalid(addr, "missing port"))?;
            if ports.contains(':') {
                return Err(Self::invalid(addr, "IPv6 hosts must be bracketed"));
            }
            (host, ports)
        };

        if host.is_empty() {
            return Err(Self::invalid(addr, "empty host"));
        }

        let ports = match ports.split_once("..") {
            Some((start, end)) => {
                let start = Self::parse_port(addr, start)?;
                let end = Self::parse_port(addr, end)?;
                if start > end {
                    return Err(Self::invalid(addr, "port range is reversed"));
                }
                start..=end
            }
            None => {
                let port = Self::parse_port(addr, ports)?;
                port..=port
            }
        };

        Ok(Self {
            host: host.to_string(),
            ports,
        })
    }
}

impl fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if self.ports.start() == self.ports.end() {
            write!(f, ":{}", self.ports.start())
        } else {
            write!(f, ":{}..{}", self.ports.start(), self.ports.end())
        }
    }
}

/// Parse a comma-separated seed list such as `"10.0.0.1:47500..47509,10.0.0.2:47500"`.
pub fn parse_endpoints(list: &str) -> Result<Vec<ClusterEndpoint>, ConfigError> {
    let endpoints = list
        .split(',')
        .map(str::parse)
        .collect::<Result<Vec<ClusterEndpoint>, _>>()?;

    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints);
    }
    Ok(endpoints)
}

/// Render seeds back into the comma-separated form, for logs and errors.
pub fn join_endpoints(endpoints: &[ClusterEndpoint]) -> String {
    endpoints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_port() {
        let ep: ClusterEndpoint = "cache-1:47500".parse().unwrap();
        assert_eq!(ep.host(), "cache-1");
        assert_eq!(ep.ports(), 47500..=47500);
        assert_eq!(ep.addresses().collect::<Vec<_>>(), vec!["cache-1:47500"]);
    }

    #[test]
    fn test_parse_port_range() {
        let ep: ClusterEndpoint = "172.17.0.6:47500..47509".parse().unwrap();
        assert_eq!(ep.ports(), 47500..=47509);
        assert_eq!(ep.addresses().count(), 10);
        assert_eq!(ep.to_string(), "172.17.0.6:47500..47509");
    }

    #[test]
    fn test_parse_ipv6() {
        let ep: ClusterEndpoint = "[::1]:47500..47501".parse().unwrap();
        assert_eq!(ep.host(), "::1");
        assert_eq!(
            ep.addresses().collect::<Vec<_>>(),
            vec!["[::1]:47500", "[::1]:47501"]
        );
        assert_eq!(ep.to_string(), "[::1]:47500..47501");
    }

    #[test]
    fn test_parse_list_trims_items() {
        let eps = parse_endpoints(" a:1 , b:2..3").unwrap();
        assert_eq!(eps.len(), 2);
        assert_eq!(join_endpoints(&eps), "a:1,b:2..3");
    }

    #[test]
    fn test_constructors_check_like_parsing() {
        assert_eq!(
            ClusterEndpoint::with_range("cache-1", 47500, 47509).unwrap(),
            "cache-1:47500..47509".parse().unwrap()
        );
        assert_eq!(
            ClusterEndpoint::new("cache-1", 47500).unwrap(),
            "cache-1:47500".parse().unwrap()
        );

        for (host, start, end) in [("h", 9, 3), ("h", 0, 0), ("h", 0, 10), ("", 1, 1)] {
            assert!(
                matches!(
                    ClusterEndpoint::with_range(host, start, end),
                    Err(ConfigError::InvalidEndpoint { .. })
                ),
                "expected '{host}:{start}..{end}' to be rejected"
            );
        }
        assert!(ClusterEndpoint::new("h", 0).is_err());
    }

    #[test]
    fn test_rejects_bad_addresses() {
        for bad in ["", "host", ":80", "host:0", "host:9..3", "host:x", "::1:80", "[::1]80"] {
            assert!(
                bad.parse::<ClusterEndpoint>().is_err(),
                "expected '{bad}' to be rejected"
            );
        }
        assert!(parse_endpoints("a:1,,b:2").is_err());
    }
}
