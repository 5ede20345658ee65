use std::path::PathBuf;

use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Enumerate and probe subdomains of a target domain
    Scan {
        /// Target domain (e.g. example.com)
        domain: String,

        /// Path to a custom wordlist file (one word per line)
        #[arg(short = 'w', long)]
        wordlist: Option<PathBuf>,

        /// Concurrent probe pipelines (1-1000)
        #[arg(short = 't', long, default_value_t = 10)]
        threads: usize,

        /// Per-request timeout in seconds (1-60)
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Outbound probes per second, 0 = unlimited
        #[arg(short = 'r', long = "rate-limit", default_value_t = 0)]
        rate_limit: u32,

        /// Retries for failed HTTP probes (0-10)
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Delay before each candidate starts, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay: u64,

        /// Custom User-Agent string
        #[arg(long)]
        user_agent: Option<String>,

        /// Extra request headers (format: "Key: Value", repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,

        /// Output directory for reports and snapshots
        #[arg(short = 'o', long, default_value = "./results")]
        out: PathBuf,

        /// Save results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Save results as XML
        #[arg(long, default_value_t = false)]
        xml: bool,

        /// Save results as CSV
        #[arg(long, default_value_t = false)]
        csv: bool,

        /// Save results as plain text
        #[arg(long, default_value_t = false)]
        text: bool,

        /// Generate an HTML report
        #[arg(long, default_value_t = false)]
        html: bool,

        /// Resolve names only, skip every other probe stage
        #[arg(long, default_value_t = false)]
        dns_only: bool,

        /// Skip the port scan stage
        #[arg(long, default_value_t = false)]
        no_ports: bool,

        /// Skip the certificate analysis stage
        #[arg(long, default_value_t = false)]
        no_tls: bool,

        /// Skip the technology fingerprint stage
        #[arg(long, default_value_t = false)]
        no_fingerprint: bool,

        /// Skip the vulnerability heuristics stage
        #[arg(long, default_value_t = false)]
        no_vulns: bool,

        /// Disable the progress bar
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
