//! Relay address parsing: `host[:port]`.

use std::fmt;
use std::str::FromStr;

/// Port used when an address omits one. Shared by the relay and clients.
pub const DEFAULT_PORT: u16 = 4000;

/// A relay endpoint as typed by a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAddress {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("invalid port in address: {0}")]
    InvalidPort(String),
}

impl FromStr for RelayAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        // Bracketed IPv6: [::1] or [::1]:4000
        if let Some(rest) = s.strip_prefix('[')
            && let Some((host, tail)) = rest.split_once(']')
        {
            let port = match tail.strip_prefix(':') {
                Some(p) => parse_port(p)?,
                None if tail.is_empty() => DEFAULT_PORT,
                None => return Err(AddressError::InvalidPort(tail.to_string())),
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        match s.split_once(':') {
            Some((host, port)) if !host.is_empty() => Ok(Self {
                host: host.to_string(),
                port: parse_port(port)?,
            }),
            Some(_) => Err(AddressError::Empty),
            None => Ok(Self {
                host: s.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(s: &str) -> Result<u16, AddressError> {
    s.parse()
        .map_err(|_| AddressError::InvalidPort(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port() {
        let addr: RelayAddress = "play.example.net:25000".parse().unwrap();
        assert_eq!(addr.host, "play.example.net");
        assert_eq!(addr.port, 25000);
    }

    #[test]
    fn test_default_port_when_omitted() {
        let addr: RelayAddress = "localhost".parse().unwrap();
        assert_eq!(addr.port, DEFAULT_PORT);
        assert_eq!(addr.to_string(), "localhost:4000");
    }

    #[test]
    fn test_ipv6_brackets() {
        let addr: RelayAddress = "[::1]:9000".parse().unwrap();
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.port, 9000);
        assert_eq!(addr.to_string(), "[::1]:9000");

        let addr: RelayAddress = "[::1]".parse().unwrap();
        assert_eq!(addr.port, DEFAULT_PORT);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!("".parse::<RelayAddress>(), Err(AddressError::Empty));
        assert_eq!(":4000".parse::<RelayAddress>(), Err(AddressError::Empty));
        assert!(matches!(
            "host:notaport".parse::<RelayAddress>(),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            "host:70000".parse::<RelayAddress>(),
            Err(AddressError::InvalidPort(_))
        ));
    }
}
