use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finding severity, ordered from worst to least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Categorical risk level derived from the additive risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Info,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    pub port: u16,
    pub protocol: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

/// Facts extracted from the certificate presented on port 443.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub expired: bool,
    pub expires_soon: bool,
    pub self_signed: bool,
    pub wildcard: bool,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    /// Weak or deprecated algorithm findings, e.g. "SHA1 signature (weak)".
    pub weaknesses: Vec<String>,
    /// Whether the endpoint completed a handshake at TLS 1.2 or newer.
    pub modern_protocol: bool,
    pub grade: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub category: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub solution: String,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// The aggregate record for one discovered subdomain.
///
/// A record only exists once DNS resolution succeeded; every other probe
/// degrades to absent fields rather than invalidating the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub subdomain: String,
    pub ip: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    pub ports: Vec<PortInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateSummary>,
    pub technologies: Vec<Technology>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ScanRecord {
    /// Fresh record for a resolved candidate; probe stages fill the rest in.
    pub fn new(subdomain: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            subdomain: subdomain.into(),
            ip,
            status: None,
            title: None,
            server: None,
            content_length: None,
            ports: Vec::new(),
            certificate: None,
            technologies: Vec::new(),
            vulnerabilities: Vec::new(),
            risk_level: RiskLevel::Info,
            confidence: 50,
            timestamp: Utc::now(),
            elapsed_ms: 0,
        }
    }
}

/// Run-level aggregate handed to the summary printer, the HTML report and
/// the dashboard snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub domain: String,
    pub total_candidates: usize,
    pub found: usize,
    pub open_ports: usize,
    pub vulnerabilities: usize,
    pub high_risk: usize,
    pub risk_distribution: HashMap<String, usize>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScanSummary {
    pub fn from_records(
        domain: &str,
        total_candidates: usize,
        records: &[ScanRecord],
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
    ) -> Self {
        let mut risk_distribution: HashMap<String, usize> = HashMap::new();
        for record in records {
            *risk_distribution
                .entry(record.risk_level.to_string())
                .or_insert(0) += 1;
        }
        Self {
            domain: domain.to_string(),
            total_candidates,
            found: records.len(),
            open_ports: records.iter().map(|r| r.ports.len()).sum(),
            vulnerabilities: records.iter().map(|r| r.vulnerabilities.len()).sum(),
            high_risk: records
                .iter()
                .filter(|r| r.risk_level == RiskLevel::High)
                .count(),
            risk_distribution,
            started,
            finished,
            duration_ms: (finished - started).num_milliseconds().max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(risk: RiskLevel, ports: usize) -> ScanRecord {
        let mut r = ScanRecord::new("a.example.com", "192.0.2.1".parse::<IpAddr>().unwrap());
        r.risk_level = risk;
        r.ports = (0..ports)
            .map(|i| PortInfo {
                port: 8000 + i as u16,
                protocol: "tcp".into(),
                service: "http-alt".into(),
                banner: None,
            })
            .collect();
        r
    }

    #[test]
    fn summary_counts_risk_distribution() {
        let records = vec![
            record(RiskLevel::High, 2),
            record(RiskLevel::High, 0),
            record(RiskLevel::Info, 1),
        ];
        let now = Utc::now();
        let summary = ScanSummary::from_records("example.com", 10, &records, now, now);
        assert_eq!(summary.found, 3);
        assert_eq!(summary.high_risk, 2);
        assert_eq!(summary.open_ports, 3);
        assert_eq!(summary.risk_distribution.get("high"), Some(&2));
        assert_eq!(summary.risk_distribution.get("info"), Some(&1));
    }

    #[test]
    fn record_serializes_round_trip() {
        let r = record(RiskLevel::Medium, 1);
        let json = serde_json::to_string(&r).unwrap();
        let back: ScanRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subdomain, r.subdomain);
        assert_eq!(back.risk_level, RiskLevel::Medium);
        assert_eq!(back.ports.len(), 1);
    }
}
