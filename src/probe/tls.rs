use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use chrono::{DateTime, Utc};
use native_tls::{Protocol, TlsConnector};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::types::CertificateSummary;

const TLS_PORT: u16 = 443;
const EXPIRY_SOON_DAYS: i64 = 30;

/// Fetches and judges the certificate presented on port 443.
///
/// The handshake stack is blocking (native-tls over a std TcpStream), so
/// the async entry point hops onto the blocking pool.
pub struct CertAnalyzer {
    timeout: Duration,
}

impl CertAnalyzer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// `None` covers every failure mode: nothing listening, handshake
    /// refused, unparseable certificate. The pipeline treats all of them as
    /// "no certificate data".
    pub async fn analyze(&self, host: &str) -> Option<CertificateSummary> {
        let host = host.to_string();
        let timeout = self.timeout;
        match tokio::task::spawn_blocking(move || fetch_summary(&host, timeout)).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::debug!(%err, "certificate analysis task failed");
                None
            }
        }
    }
}

fn fetch_summary(host: &str, timeout: Duration) -> Option<CertificateSummary> {
    // TLS 1.2+ first; only if that handshake fails do we fall back and mark
    // the endpoint as legacy-only. native-tls does not expose the
    // negotiated version directly.
    let (stream, modern_protocol) = match handshake(host, timeout, Some(Protocol::Tlsv12)) {
        Some(stream) => (stream, true),
        None => (handshake(host, timeout, Some(Protocol::Tlsv10))?, false),
    };

    let der = stream.peer_certificate().ok()??.to_der().ok()?;
    let mut summary = summarize_der(&der)?;
    summary.modern_protocol = modern_protocol;
    summary.grade = compute_grade(&summary);
    Some(summary)
}

fn handshake(
    host: &str,
    timeout: Duration,
    min_protocol: Option<Protocol>,
) -> Option<native_tls::TlsStream<TcpStream>> {
    let connector = TlsConnector::builder()
        .min_protocol_version(min_protocol)
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .ok()?;

    let addr = (host, TLS_PORT).to_socket_addrs().ok()?.next()?;
    let tcp = TcpStream::connect_timeout(&addr, timeout).ok()?;
    tcp.set_read_timeout(Some(timeout)).ok()?;
    tcp.set_write_timeout(Some(timeout)).ok()?;

    connector.connect(host, tcp).ok()
}

fn summarize_der(der: &[u8]) -> Option<CertificateSummary> {
    let (_, cert) = X509Certificate::from_der(der).ok()?;

    let subject = cert.subject().to_string();
    let issuer = cert.issuer().to_string();
    let not_before = DateTime::<Utc>::from_timestamp(cert.validity().not_before.timestamp(), 0)?;
    let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)?;

    let now = Utc::now();
    let days_until_expiry = (not_after - now).num_days();
    let expired = now > not_after;

    let signature_algorithm =
        signature_algorithm_name(&cert.signature_algorithm.algorithm.to_id_string());
    let (public_key_algorithm, rsa_bits) = match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => ("RSA".to_string(), Some(rsa.key_size())),
        Ok(PublicKey::EC(_)) => ("ECDSA".to_string(), None),
        Ok(PublicKey::DSA(_)) => ("DSA".to_string(), None),
        _ => ("unknown".to_string(), None),
    };

    let mut san_names: Vec<String> = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                san_names.push((*dns).to_string());
            }
        }
    }
    let wildcard =
        san_names.iter().any(|n| n.starts_with("*.")) || subject.contains("CN=*.");

    let weaknesses = certificate_weaknesses(&signature_algorithm, &public_key_algorithm, rsa_bits);

    Some(CertificateSummary {
        subject: subject.clone(),
        issuer: issuer.clone(),
        not_before,
        not_after,
        days_until_expiry,
        expired,
        expires_soon: days_until_expiry < EXPIRY_SOON_DAYS,
        self_signed: subject == issuer,
        wildcard,
        signature_algorithm,
        public_key_algorithm,
        weaknesses,
        modern_protocol: true,
        grade: String::new(),
    })
}

fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.4" => "md5WithRSAEncryption".to_string(),
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption".to_string(),
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption".to_string(),
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption".to_string(),
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption".to_string(),
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256".to_string(),
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384".to_string(),
        "1.3.101.112" => "ed25519".to_string(),
        other => other.to_string(),
    }
}

pub fn certificate_weaknesses(
    signature_algorithm: &str,
    public_key_algorithm: &str,
    rsa_bits: Option<usize>,
) -> Vec<String> {
    let mut weaknesses = Vec::new();
    if signature_algorithm.starts_with("md5") {
        weaknesses.push("MD5 signature (weak)".to_string());
    }
    if signature_algorithm.starts_with("sha1") {
        weaknesses.push("SHA1 signature (weak)".to_string());
    }
    if public_key_algorithm == "DSA" {
        weaknesses.push("DSA public key (deprecated)".to_string());
    }
    if let Some(bits) = rsa_bits {
        if bits < 2048 {
            weaknesses.push(format!("RSA key of {bits} bits (weak)"));
        }
    }
    weaknesses
}

/// Letter grade from a fixed deduction table. Pure so the fixtures below
/// can pin every branch.
pub fn compute_grade(summary: &CertificateSummary) -> String {
    let mut score: i32 = 100;

    if summary.expired {
        score -= 50;
    }
    if summary.expires_soon {
        score -= 20;
    }
    if summary.self_signed {
        score -= 30;
    }
    if summary.wildcard {
        score -= 10;
    }
    for weakness in &summary.weaknesses {
        if weakness.contains("weak") {
            score -= 20;
        }
        if weakness.contains("deprecated") {
            score -= 15;
        }
    }
    if !summary.modern_protocol {
        score -= 25;
    }

    match score {
        s if s >= 90 => "A+",
        s if s >= 80 => "A",
        s if s >= 70 => "B",
        s if s >= 60 => "C",
        s if s >= 50 => "D",
        _ => "F",
    }
    .to_string()
}
