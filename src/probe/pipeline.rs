use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::analyze::{fingerprint, risk, vulns::VulnScanner};
use crate::config::{ScanConfig, Stages};
use crate::limiter::{Backoff, RateLimiter, Retryer};
use crate::probe::dns::{Resolve, Resolver};
use crate::probe::http::HttpProbe;
use crate::probe::ports::PortScanner;
use crate::probe::tls::CertAnalyzer;
use crate::types::ScanRecord;

/// The per-candidate stage sequence: DNS → HTTP → ports → TLS →
/// fingerprint → vulnerability heuristics. Stages run strictly in order for
/// one candidate; the scheduler provides the cross-candidate parallelism.
///
/// DNS is the only hard gate — `probe` returns `None` for names that do not
/// resolve. Every later stage degrades to absent fields.
pub struct ProbePipeline {
    resolver: Box<dyn Resolve>,
    http: HttpProbe,
    ports: PortScanner,
    certs: CertAnalyzer,
    vulns: VulnScanner,
    limiter: Option<Arc<RateLimiter>>,
    retryer: Retryer,
    stages: Stages,
    start_delay: Duration,
}

impl ProbePipeline {
    pub fn from_config(config: &ScanConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = HttpProbe::from_config(config)?;

        let limiter = (config.rate_limit > 0)
            .then(|| Arc::new(RateLimiter::per_second(config.rate_limit)));
        let retryer = Retryer::new(
            config.retries,
            Backoff::Exponential {
                base: Duration::from_millis(500),
                max: timeout,
            },
        );
        let vulns = VulnScanner::new(http.client().clone(), limiter.clone());

        Ok(Self {
            resolver: Box::new(Resolver::new(timeout)),
            http,
            ports: PortScanner::new(timeout),
            certs: CertAnalyzer::new(timeout),
            vulns,
            limiter,
            retryer,
            stages: config.stages,
            start_delay: Duration::from_millis(config.delay_ms),
        })
    }

    /// Swap the DNS seam; tests use this to drive the pipeline without a
    /// network.
    pub fn with_resolver(mut self, resolver: Box<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run every enabled stage for one candidate name.
    ///
    /// `None` means the candidate is not part of the output: it did not
    /// resolve, or the run was cancelled before its record completed.
    pub async fn probe(&self, subdomain: &str, cancel: &CancellationToken) -> Option<ScanRecord> {
        let started = Instant::now();

        if !self.start_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.start_delay) => {}
            }
        }

        // Stage 1: DNS. The hard gate.
        if let Some(limiter) = &self.limiter {
            limiter.wait(cancel).await.ok()?;
        }
        let ip = self.resolver.resolve_a(subdomain).await?;
        let mut record = ScanRecord::new(subdomain, ip);

        // Stage 2: HTTP. Hardened by the retryer; failure leaves the
        // response fields absent.
        let facts = if self.stages.http {
            if let Some(limiter) = &self.limiter {
                limiter.wait(cancel).await.ok()?;
            }
            match self
                .retryer
                .execute(cancel, || self.http.check(subdomain))
                .await
            {
                Ok(facts) => Some(facts),
                Err(err) => {
                    tracing::debug!(subdomain, %err, "http probe inconclusive");
                    None
                }
            }
        } else {
            None
        };
        if let Some(facts) = &facts {
            record.status = Some(facts.status);
            record.title = facts.title.clone();
            record.server = facts.server.clone();
            record.content_length = facts.content_length;
        }

        // Stage 3: port scan.
        if self.stages.ports {
            record.ports = self.ports.quick_scan(ip).await;
        }

        // Stage 4: certificate analysis.
        if self.stages.tls {
            record.certificate = self.certs.analyze(subdomain).await;
        }

        // Stage 5: technology fingerprint, off the stage-2 response.
        if self.stages.fingerprint {
            if let Some(facts) = &facts {
                record.technologies = fingerprint::detect(facts);
            }
        }

        // Stage 6: vulnerability heuristics. Needs a reachable HTTP
        // endpoint; without one the whole stage is inconclusive.
        if self.stages.vulns {
            if let Some(facts) = &facts {
                record.vulnerabilities = self.vulns.scan(facts, cancel).await;
            }
        }

        record.risk_level = risk::assess_risk(&record);
        record.confidence = risk::confidence(&record);
        record.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            subdomain,
            ip = %record.ip,
            risk = %record.risk_level,
            elapsed_ms = record.elapsed_ms,
            "candidate probed"
        );
        Some(record)
    }
}
