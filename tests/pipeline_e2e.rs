use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use subscout::config::{ScanConfig, Stages};
use subscout::probe::dns::Resolve;
use subscout::probe::pipeline::ProbePipeline;
use subscout::scheduler::Scheduler;
use subscout::types::RiskLevel;

/// Answers only for the names it was seeded with; everything else fails to
/// resolve, like a wordlist full of nonexistent candidates.
struct StaticResolver {
    answers: HashMap<String, IpAddr>,
}

impl StaticResolver {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            answers: entries
                .iter()
                .map(|(name, ip)| (name.to_string(), ip.parse().unwrap()))
                .collect(),
        }
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve_a(&self, name: &str) -> Option<IpAddr> {
        self.answers.get(name).copied()
    }
}

fn dns_only_config() -> ScanConfig {
    ScanConfig {
        domain: "example.com".into(),
        stages: Stages::dns_only(),
        threads: 5,
        ..ScanConfig::default()
    }
}

fn candidates(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| format!("{w}.example.com")).collect()
}

async fn run_scan(pipeline: Arc<ProbePipeline>, words: &[&str]) -> Vec<subscout::types::ScanRecord> {
    let scheduler = Scheduler::new(5);
    let cancel = CancellationToken::new();
    scheduler
        .run(candidates(words), move |candidate: String| {
            let pipeline = pipeline.clone();
            let cancel = cancel.clone();
            async move { pipeline.probe(&candidate, &cancel).await }
        })
        .await
}

#[tokio::test]
async fn only_resolving_candidates_are_emitted() {
    let pipeline = Arc::new(
        ProbePipeline::from_config(&dns_only_config())
            .unwrap()
            .with_resolver(Box::new(StaticResolver::new(&[(
                "www.example.com",
                "93.184.216.34",
            )]))),
    );

    let records = run_scan(pipeline, &["www", "api"]).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.subdomain, "www.example.com");
    assert_eq!(record.ip, "93.184.216.34".parse::<IpAddr>().unwrap());
    // DNS-only probing: resolved IP is the only evidence.
    assert_eq!(record.confidence, 70);
    assert_eq!(record.risk_level, RiskLevel::Info);
    assert!(record.status.is_none());
    assert!(record.ports.is_empty());
}

#[tokio::test]
async fn unresolvable_candidates_are_excluded_idempotently() {
    let pipeline = Arc::new(
        ProbePipeline::from_config(&dns_only_config())
            .unwrap()
            .with_resolver(Box::new(StaticResolver::new(&[]))),
    );

    for _ in 0..2 {
        let records = run_scan(pipeline.clone(), &["www", "api", "mail"]).await;
        assert!(records.is_empty());
    }
}

#[tokio::test]
async fn cancelled_run_emits_no_partial_records() {
    let pipeline = Arc::new(
        ProbePipeline::from_config(&ScanConfig {
            domain: "example.com".into(),
            stages: Stages::dns_only(),
            delay_ms: 60_000,
            ..ScanConfig::default()
        })
        .unwrap()
        .with_resolver(Box::new(StaticResolver::new(&[(
            "www.example.com",
            "93.184.216.34",
        )]))),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    // The pre-start delay observes cancellation before any probing begins.
    let record = pipeline.probe("www.example.com", &cancel).await;
    assert!(record.is_none());
}
