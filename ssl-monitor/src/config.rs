use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// SMTP server details for outgoing e-mails
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct SmtpConfig {
    /// SMTP server host name
    pub host: String,
    /// SMTP server port, usually 587 for STARTTLS
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password
    pub password: String,
    /// Sender mailbox
    #[serde(rename = "from")]
    pub from_address: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SmtpConfig {
    /// Parse SMTP details from a JSON document
    ///
    /// ```
    /// # use ssl_monitor::SmtpConfig;
    /// let config = SmtpConfig::from_json(r#"{
    ///     "host": "smtp.example.com",
    ///     "port": 587,
    ///     "user": "monitor",
    ///     "password": "secret",
    ///     "from": "monitor@example.com"
    /// }"#).unwrap();
    /// assert_eq!(587, config.port);
    /// ```
    pub fn from_json<T>(json: T) -> Result<Self, ConfigError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(json.as_ref())?)
    }

    /// Load SMTP details from a JSON file
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let content = fs::read_to_string(path)?;
        Self::from_json(content)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const JSON: &str = r#"{
        "host": "smtp.example.com",
        "port": 587,
        "user": "monitor",
        "password": "secret",
        "from": "monitor@example.com",
        "comment": "ignored"
    }"#;

    #[test]
    fn t_from_json() {
        let config = SmtpConfig::from_json(JSON).unwrap();
        assert_eq!("smtp.example.com", config.host);
        assert_eq!(587, config.port);
        assert_eq!("monitor", config.user);
        assert_eq!("secret", config.password);
        assert_eq!("monitor@example.com", config.from_address);
    }

    #[test]
    fn t_debug_hides_password() {
        let config = SmtpConfig::from_json(JSON).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn t_missing_field() {
        let result = SmtpConfig::from_json(r#"{"host": "smtp.example.com", "port": 587}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn t_port_must_be_integer() {
        let json = JSON.replace("587", "\"587\"");
        assert!(matches!(
            SmtpConfig::from_json(json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn t_from_file() {
        let path = std::env::temp_dir().join(format!("ssl-monitor-{}.json", std::process::id()));
        fs::write(&path, JSON).unwrap();
        let config = SmtpConfig::from_file(&path);
        fs::remove_file(&path).unwrap();
        assert_eq!("smtp.example.com", config.unwrap().host);
    }

    #[test]
    fn t_from_missing_file() {
        let result = SmtpConfig::from_file("/nonexistent/ssl-monitor.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
