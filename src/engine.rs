use std::sync::Arc;

use chrono::Utc;
use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::probe::pipeline::ProbePipeline;
use crate::scheduler::Scheduler;
use crate::types::{ScanRecord, ScanSummary};
use crate::wordlist::Wordlist;

/// Outcome of one full enumeration run.
pub struct ScanOutcome {
    pub records: Vec<ScanRecord>,
    pub summary: ScanSummary,
}

/// Wires the pieces together: wordlist → candidate names → admission-gated
/// scheduler → one probe pipeline execution per candidate.
pub struct Engine {
    config: ScanConfig,
    wordlist: Wordlist,
    pipeline: Arc<ProbePipeline>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(config: ScanConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let wordlist = Wordlist::load(config.wordlist.as_deref())?;
        let pipeline = Arc::new(ProbePipeline::from_config(&config)?);
        Ok(Self {
            config,
            wordlist,
            pipeline,
            cancel: CancellationToken::new(),
        })
    }

    pub fn candidate_count(&self) -> usize {
        self.wordlist.len()
    }

    /// Token that stops limiter waits and backoff sleeps. In-flight network
    /// calls are not interrupted; they die by their own timeouts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn scan(&self, progress: Option<ProgressBar>) -> ScanOutcome {
        let started = Utc::now();
        let candidates: Vec<String> = self
            .wordlist
            .words()
            .iter()
            .map(|word| format!("{}.{}", word, self.config.domain))
            .collect();
        let total = candidates.len();

        tracing::info!(
            domain = %self.config.domain,
            candidates = total,
            threads = self.config.threads,
            "starting enumeration"
        );

        let scheduler = Scheduler::new(self.config.threads);
        let pipeline = self.pipeline.clone();
        let cancel = self.cancel.clone();
        let mut records = scheduler
            .run(candidates, move |candidate: String| {
                let pipeline = pipeline.clone();
                let cancel = cancel.clone();
                let progress = progress.clone();
                async move {
                    let record = pipeline.probe(&candidate, &cancel).await;
                    if let Some(progress) = &progress {
                        progress.inc(1);
                    }
                    record
                }
            })
            .await;

        // Completion order is nondeterministic; present results stably.
        records.sort_by(|a, b| a.subdomain.cmp(&b.subdomain));

        let finished = Utc::now();
        let summary =
            ScanSummary::from_records(&self.config.domain, total, &records, started, finished);

        tracing::info!(
            domain = %self.config.domain,
            found = summary.found,
            duration_ms = summary.duration_ms,
            "enumeration finished"
        );

        ScanOutcome { records, summary }
    }
}
