use std::fmt;
use std::str::FromStr;

use crate::error::TargetError;

/// Port used when a token has no explicit port
pub const DEFAULT_PORT: u16 = 443;

/// Host and port whose certificate gets checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host name or IP address, without brackets
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Target {
    /// Create a target from host name and port
    ///
    /// ```
    /// # use ssl_monitor::Target;
    /// let target = Target::new("example.com", 8443);
    /// assert_eq!("example.com:8443", target.to_string());
    /// ```
    pub fn new<T>(host: T, port: u16) -> Self
    where
        T: Into<String>,
    {
        Target {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    /// Parse `host`, `host:port` or `[v6]:port`
    ///
    /// ```
    /// # use ssl_monitor::Target;
    /// let target: Target = "example.com".parse().unwrap();
    /// assert_eq!(443, target.port);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();

        let (host, port) = if let Some(rest) = token.strip_prefix('[') {
            match rest.split_once(']') {
                Some((host, "")) => (host, None),
                Some((host, port)) => match port.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(TargetError::InvalidPort(s.to_string())),
                },
                None => return Err(TargetError::EmptyHost(s.to_string())),
            }
        } else {
            match token.rsplit_once(':') {
                // bare IPv6 address without brackets
                Some((host, _)) if host.contains(':') => (token, None),
                Some((host, port)) => (host, Some(port)),
                None => (token, None),
            }
        };

        if host.is_empty() {
            return Err(TargetError::EmptyHost(s.to_string()));
        }

        let port = match port {
            Some(p) => match p.parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => return Err(TargetError::InvalidPort(s.to_string())),
            },
            None => DEFAULT_PORT,
        };

        Ok(Target::new(host, port))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
