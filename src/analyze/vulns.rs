use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::limiter::RateLimiter;
use crate::probe::http::HttpFacts;
use crate::types::{Severity, Vulnerability};

/// Security headers every response is expected to carry, with the value we
/// suggest when one is missing. Keys are lowercase to match how the HTTP
/// stage stores header names.
const EXPECTED_HEADERS: &[(&str, &str, &str)] = &[
    ("x-content-type-options", "X-Content-Type-Options", "nosniff"),
    ("x-frame-options", "X-Frame-Options", "DENY"),
    ("x-xss-protection", "X-XSS-Protection", "1; mode=block"),
    (
        "strict-transport-security",
        "Strict-Transport-Security",
        "max-age=31536000",
    ),
    (
        "content-security-policy",
        "Content-Security-Policy",
        "default-src 'self'",
    ),
    (
        "referrer-policy",
        "Referrer-Policy",
        "strict-origin-when-cross-origin",
    ),
];

const TRAVERSAL_PAYLOADS: &[&str] = &["../", "..\\", "....//", "%2e%2e%2f"];

const SQL_PAYLOADS: &[&str] = &["' OR '1'='1", "' UNION SELECT NULL--", "' OR 1=1--", "admin'--"];

const SQL_ERROR_SIGNATURES: &[&str] = &[
    "mysql_fetch_array",
    "mysql_num_rows",
    "ora-01756",
    "microsoft ole db provider",
    "odbc sql server driver",
    "sqlserver jdbc driver",
    "postgresql query failed",
    "warning: mysql_",
    "valid mysql result",
    "mysqlclient.",
];

const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('sx7331')</script>",
    "<img src=x onerror=alert('sx7331')>",
];

/// Markers whose presence in a response body suggests leaked internals.
const DISCLOSURE_MARKERS: &[(&str, &str)] = &[
    ("password", "Password material referenced in response"),
    ("api_key", "API key referenced in response"),
    ("secret", "Secret material referenced in response"),
    ("stack trace", "Stack trace disclosed in response"),
    ("traceback (most recent call last)", "Python traceback disclosed"),
];

fn finding(
    name: &str,
    severity: Severity,
    description: String,
    solution: &str,
    confidence: u8,
) -> Vulnerability {
    Vulnerability {
        name: name.to_string(),
        severity,
        description,
        solution: solution.to_string(),
        confidence,
        evidence: None,
    }
}

/// Checks that only read the already-probed response. Pure, so the fixture
/// tests below cover every branch without a network.
pub fn passive_findings(facts: &HttpFacts) -> Vec<Vulnerability> {
    let mut findings = Vec::new();

    for (key, display, expected) in EXPECTED_HEADERS {
        if !facts.headers.contains_key(*key) {
            findings.push(finding(
                &format!("Missing Security Header: {display}"),
                Severity::Medium,
                format!("Response does not set the {display} header"),
                &format!("Add {display}: {expected}"),
                90,
            ));
        }
    }

    if let Some(hsts) = facts.headers.get("strict-transport-security") {
        if !hsts.contains("includeSubDomains") {
            findings.push(finding(
                "Weak HSTS Configuration",
                Severity::Low,
                "HSTS header is missing the includeSubDomains directive".to_string(),
                "Add includeSubDomains to the Strict-Transport-Security header",
                80,
            ));
        }
    }

    if let Some(server) = facts.headers.get("server") {
        if server.contains('/') {
            findings.push(finding(
                "Server Version Disclosure",
                Severity::Low,
                format!("Server header discloses a version: {server}"),
                "Remove or obfuscate the server version",
                95,
            ));
        }
        if server.contains("Apache/2.2") || server.contains("Apache/2.0") {
            findings.push(finding(
                "Outdated Apache Version",
                Severity::High,
                format!("End-of-life Apache release advertised: {server}"),
                "Upgrade Apache to a supported release",
                90,
            ));
        }
    }

    if let Some(powered_by) = facts.headers.get("x-powered-by") {
        findings.push(finding(
            "Technology Disclosure",
            Severity::Low,
            format!("X-Powered-By discloses the stack: {powered_by}"),
            "Remove the X-Powered-By header",
            95,
        ));
    }

    let body_lower = facts.body.to_lowercase();
    for (marker, description) in DISCLOSURE_MARKERS {
        if body_lower.contains(marker) {
            findings.push(finding(
                "Information Disclosure",
                Severity::Medium,
                (*description).to_string(),
                "Strip sensitive information from responses",
                70,
            ));
        }
    }

    if facts.scheme == "http" {
        findings.push(finding(
            "HTTP Instead of HTTPS",
            Severity::High,
            "Host serves content over plain HTTP".to_string(),
            "Serve over HTTPS and redirect HTTP traffic",
            100,
        ));
    } else if body_lower.contains("src=\"http://") || body_lower.contains("href=\"http://") {
        findings.push(finding(
            "Mixed Content",
            Severity::Medium,
            "HTTPS page references plain-HTTP resources".to_string(),
            "Load every resource over HTTPS",
            85,
        ));
    }

    findings
}

/// Active heuristics: crafted URLs whose responses betray traversal, SQL
/// error leakage or payload reflection. Inconclusive probes yield nothing.
pub struct VulnScanner {
    client: Client,
    limiter: Option<Arc<RateLimiter>>,
}

impl VulnScanner {
    pub fn new(client: Client, limiter: Option<Arc<RateLimiter>>) -> Self {
        Self { client, limiter }
    }

    pub async fn scan(&self, facts: &HttpFacts, cancel: &CancellationToken) -> Vec<Vulnerability> {
        let mut findings = passive_findings(facts);

        if let Some(v) = self.check_traversal(&facts.url, cancel).await {
            findings.push(v);
        }
        if let Some(v) = self.check_sql_errors(&facts.url, cancel).await {
            findings.push(v);
        }
        if let Some(v) = self.check_reflected_payload(&facts.url, cancel).await {
            findings.push(v);
        }

        findings
    }

    async fn check_traversal(&self, base: &str, cancel: &CancellationToken) -> Option<Vulnerability> {
        for payload in TRAVERSAL_PAYLOADS {
            let url = format!("{}/{}etc/passwd", base.trim_end_matches('/'), payload);
            let body = self.fetch_body(&url, cancel).await?;
            if body.contains("root:") || body.contains("bin:") {
                let mut v = finding(
                    "Directory Traversal",
                    Severity::High,
                    "Path traversal payload exposed filesystem contents".to_string(),
                    "Validate and canonicalize request paths",
                    85,
                );
                v.evidence = Some(url);
                return Some(v);
            }
        }
        None
    }

    async fn check_sql_errors(&self, base: &str, cancel: &CancellationToken) -> Option<Vulnerability> {
        for payload in SQL_PAYLOADS {
            let url = format!("{}?id={}", base, urlencoding::encode(payload));
            let body = self.fetch_body(&url, cancel).await?.to_lowercase();
            if SQL_ERROR_SIGNATURES.iter().any(|sig| body.contains(sig)) {
                let mut v = finding(
                    "SQL Injection",
                    Severity::Critical,
                    "Crafted parameter triggered a database error message".to_string(),
                    "Use parameterized queries and validate input",
                    80,
                );
                v.evidence = Some(url);
                return Some(v);
            }
        }
        None
    }

    async fn check_reflected_payload(
        &self,
        base: &str,
        cancel: &CancellationToken,
    ) -> Option<Vulnerability> {
        for payload in XSS_PAYLOADS {
            let url = format!("{}?q={}", base, urlencoding::encode(payload));
            let body = self.fetch_body(&url, cancel).await?;
            if body.contains(payload) {
                let mut v = finding(
                    "Cross-Site Scripting (XSS)",
                    Severity::High,
                    "Script payload reflected unencoded in the response".to_string(),
                    "Encode output and validate input",
                    75,
                );
                v.evidence = Some(url);
                return Some(v);
            }
        }
        None
    }

    /// One throttled GET; any failure (or cancellation of the throttle
    /// wait) makes the whole check inconclusive.
    async fn fetch_body(&self, url: &str, cancel: &CancellationToken) -> Option<String> {
        if let Some(limiter) = &self.limiter {
            limiter.wait(cancel).await.ok()?;
        }
        let response = self.client.get(url).send().await.ok()?;
        response.text().await.ok()
    }
}
