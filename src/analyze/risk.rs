//! Deterministic risk scoring: an additive score over a completed record,
//! folded into a categorical level by fixed thresholds, plus a confidence
//! model describing how much probe data backs the record.

use crate::types::{RiskLevel, ScanRecord, Severity};

const OPEN_PORT_ALERT_THRESHOLD: usize = 10;

/// Additive score. Exposed separately from the level so tests can pin the
/// exact arithmetic.
pub fn risk_score(record: &ScanRecord) -> i32 {
    let mut score = 0;

    for vuln in &record.vulnerabilities {
        score += match vuln.severity {
            Severity::Critical => 10,
            Severity::High => 7,
            Severity::Medium => 4,
            Severity::Low => 1,
        };
    }

    if let Some(cert) = &record.certificate {
        if cert.expired {
            score += 8;
        }
        if cert.expires_soon {
            score += 3;
        }
        if !cert.weaknesses.is_empty() {
            score += 5;
        }
    }

    if record.ports.len() > OPEN_PORT_ALERT_THRESHOLD {
        score += 3;
    }

    match record.status {
        Some(403) => score += 2,
        Some(500) => score += 5,
        _ => {}
    }

    score
}

pub fn assess_risk(record: &ScanRecord) -> RiskLevel {
    match risk_score(record) {
        s if s >= 15 => RiskLevel::High,
        s if s >= 8 => RiskLevel::Medium,
        s if s >= 3 => RiskLevel::Low,
        _ => RiskLevel::Info,
    }
}

/// Base 50, plus fixed credit for each probe that produced data, capped at
/// 100. Emitted records always have an IP, so the floor in practice is 70.
pub fn confidence(record: &ScanRecord) -> u8 {
    let mut confidence: u32 = 50;

    if !record.ip.is_unspecified() {
        confidence += 20;
    }
    if record.status.is_some() {
        confidence += 15;
    }
    if !record.technologies.is_empty() {
        confidence += 10;
    }
    if record.certificate.is_some() {
        confidence += 5;
    }

    confidence.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CertificateSummary, PortInfo, Technology, Vulnerability};
    use chrono::Utc;
    use std::net::IpAddr;

    fn record() -> ScanRecord {
        ScanRecord::new("app.example.com", "192.0.2.10".parse::<IpAddr>().unwrap())
    }

    fn vuln(severity: Severity) -> Vulnerability {
        Vulnerability {
            name: "finding".into(),
            severity,
            description: String::new(),
            solution: String::new(),
            confidence: 80,
            evidence: None,
        }
    }

    fn cert() -> CertificateSummary {
        CertificateSummary {
            subject: "CN=app.example.com".into(),
            issuer: "CN=CA".into(),
            not_before: Utc::now(),
            not_after: Utc::now(),
            days_until_expiry: 200,
            expired: false,
            expires_soon: false,
            self_signed: false,
            wildcard: false,
            signature_algorithm: "sha256WithRSAEncryption".into(),
            public_key_algorithm: "RSA".into(),
            weaknesses: vec![],
            modern_protocol: true,
            grade: "A+".into(),
        }
    }

    #[test]
    fn two_highs_score_medium_one_critical_tips_high() {
        let mut r = record();
        r.vulnerabilities = vec![vuln(Severity::High), vuln(Severity::High)];
        assert_eq!(risk_score(&r), 14);
        assert_eq!(assess_risk(&r), RiskLevel::Medium);

        r.vulnerabilities.push(vuln(Severity::Critical));
        assert_eq!(risk_score(&r), 24);
        assert_eq!(assess_risk(&r), RiskLevel::High);
    }

    #[test]
    fn threshold_edges() {
        let mut r = record();
        assert_eq!(assess_risk(&r), RiskLevel::Info);

        r.vulnerabilities = vec![vuln(Severity::Low); 3];
        assert_eq!(risk_score(&r), 3);
        assert_eq!(assess_risk(&r), RiskLevel::Low);

        r.vulnerabilities = vec![vuln(Severity::Medium), vuln(Severity::Medium)];
        assert_eq!(risk_score(&r), 8);
        assert_eq!(assess_risk(&r), RiskLevel::Medium);

        r.vulnerabilities = vec![vuln(Severity::Critical), vuln(Severity::Low)];
        // 10 + 1 = 11, still medium; certificate trouble pushes it over.
        let mut c = cert();
        c.expired = true;
        r.certificate = Some(c);
        assert_eq!(risk_score(&r), 19);
        assert_eq!(assess_risk(&r), RiskLevel::High);
    }

    #[test]
    fn certificate_deductions_stack() {
        let mut r = record();
        let mut c = cert();
        c.expired = true;
        c.expires_soon = true;
        c.weaknesses = vec!["SHA1 signature (weak)".into()];
        r.certificate = Some(c);
        assert_eq!(risk_score(&r), 16);
        assert_eq!(assess_risk(&r), RiskLevel::High);
    }

    #[test]
    fn port_sprawl_and_status_codes_count() {
        let mut r = record();
        r.ports = (0..11)
            .map(|i| PortInfo {
                port: 8000 + i,
                protocol: "tcp".into(),
                service: "http-alt".into(),
                banner: None,
            })
            .collect();
        r.status = Some(500);
        assert_eq!(risk_score(&r), 8);
        assert_eq!(assess_risk(&r), RiskLevel::Medium);

        r.status = Some(403);
        assert_eq!(risk_score(&r), 5);
        assert_eq!(assess_risk(&r), RiskLevel::Low);
    }

    #[test]
    fn confidence_reaches_exactly_100_with_all_probes() {
        let mut r = record();
        assert_eq!(confidence(&r), 70);

        r.status = Some(200);
        r.technologies = vec![Technology {
            name: "nginx".into(),
            version: None,
            category: "web-server".into(),
            confidence: 100,
        }];
        r.certificate = Some(cert());
        assert_eq!(confidence(&r), 100);
    }

    #[test]
    fn confidence_is_upper_clamped() {
        let mut r = record();
        r.status = Some(200);
        r.technologies = vec![Technology {
            name: "a".into(),
            version: None,
            category: "x".into(),
            confidence: 1,
        }];
        r.certificate = Some(cert());
        // 50+20+15+10+5 lands exactly on the cap; nothing can exceed it.
        assert!(confidence(&r) <= 100);
    }
}
