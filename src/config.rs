use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

pub const MAX_THREADS: usize = 1000;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("domain must not be empty")]
    EmptyDomain,
    #[error("threads must be in 1..={MAX_THREADS}, got {0}")]
    Threads(usize),
    #[error("timeout must be in 1..={MAX_TIMEOUT_SECS} seconds, got {0}")]
    Timeout(u64),
    #[error("retries must be at most {MAX_RETRIES}, got {0}")]
    Retries(u32),
    #[error("invalid header {0:?}, expected \"Key: Value\"")]
    Header(String),
}

/// Which probe stages run for each candidate. DNS always runs; it is the
/// hard gate that decides whether a candidate exists at all.
#[derive(Debug, Clone, Copy)]
pub struct Stages {
    pub http: bool,
    pub ports: bool,
    pub tls: bool,
    pub fingerprint: bool,
    pub vulns: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            http: true,
            ports: true,
            tls: true,
            fingerprint: true,
            vulns: true,
        }
    }
}

impl Stages {
    /// Existence sweep: resolve names, probe nothing else.
    pub fn dns_only() -> Self {
        Self {
            http: false,
            ports: false,
            tls: false,
            fingerprint: false,
            vulns: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub domain: String,
    pub wordlist: Option<PathBuf>,
    /// Admission-gate width: how many probe pipelines run at once.
    pub threads: usize,
    /// Per-network-call timeout, seconds.
    pub timeout_secs: u64,
    /// Outbound probes per second across all pipelines; 0 disables limiting.
    pub rate_limit: u32,
    pub retries: u32,
    /// Per-candidate start delay in milliseconds, spreads the ramp-up.
    pub delay_ms: u64,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub stages: Stages,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            wordlist: None,
            threads: 10,
            timeout_secs: 5,
            rate_limit: 0,
            retries: 3,
            delay_ms: 0,
            user_agent: format!("subscout/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
            stages: Stages::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(ConfigError::Threads(self.threads));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Timeout(self.timeout_secs));
        }
        if self.retries > MAX_RETRIES {
            return Err(ConfigError::Retries(self.retries));
        }
        Ok(())
    }
}

/// Parse a `Key: Value` header argument as passed on the command line.
pub fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| ConfigError::Header(raw.to_string()))?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(ConfigError::Header(raw.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ScanConfig {
        ScanConfig {
            domain: "example.com".into(),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn default_config_validates() {
        assert_eq!(base().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_threads() {
        let mut cfg = base();
        cfg.threads = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::Threads(0)));
        cfg.threads = 1001;
        assert_eq!(cfg.validate(), Err(ConfigError::Threads(1001)));
        cfg.threads = 1000;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_timeout_and_retries() {
        let mut cfg = base();
        cfg.timeout_secs = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::Timeout(0)));
        cfg.timeout_secs = 61;
        assert_eq!(cfg.validate(), Err(ConfigError::Timeout(61)));
        cfg.timeout_secs = 5;
        cfg.retries = 11;
        assert_eq!(cfg.validate(), Err(ConfigError::Retries(11)));
    }

    #[test]
    fn rejects_empty_domain() {
        let mut cfg = base();
        cfg.domain = "  ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyDomain));
    }

    #[test]
    fn parses_headers() {
        assert_eq!(
            parse_header("X-Api-Key: abc123").unwrap(),
            ("X-Api-Key".to_string(), "abc123".to_string())
        );
        assert!(parse_header("no-colon-here").is_err());
        assert!(parse_header(": empty-key").is_err());
    }
}
