use std::collections::HashMap;
use std::fs;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{Cli, Commands};
use subscout::config::{parse_header, ScanConfig, Stages};
use subscout::engine::Engine;
use subscout::output::{self, SnapshotStore};

fn print_ascii_logo() {
    println!(
        r#"
             ___ _   _| |__  ___  ___ ___  _   _| |_
            / __| | | | '_ \/ __|/ __/ _ \| | | | __|
            \__ \ |_| | |_) \__ \ (__ (_) | |_| | |_
            |___/\__,_|_.__/|___/\___\___/ \__,_|\__|

                  Subdomain Recon Scanner v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep external crates (reqwest/hyper) at INFO so debug runs stay
    // readable; our own crate follows the requested level.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter_str = format!("subscout={crate_level},reqwest=info,hyper=info,h2=info");
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan {
            domain,
            wordlist,
            threads,
            timeout,
            rate_limit,
            retries,
            delay,
            user_agent,
            headers,
            out,
            json,
            xml,
            csv,
            text,
            html,
            dns_only,
            no_ports,
            no_tls,
            no_fingerprint,
            no_vulns,
            no_progress,
        } => {
            let mut parsed_headers = HashMap::new();
            for raw in &headers {
                let (key, value) = parse_header(raw)?;
                parsed_headers.insert(key, value);
            }

            let mut stages = if dns_only {
                Stages::dns_only()
            } else {
                Stages::default()
            };
            stages.ports &= !no_ports;
            stages.tls &= !no_tls;
            stages.fingerprint &= !no_fingerprint;
            stages.vulns &= !no_vulns;

            let mut config = ScanConfig {
                domain: domain.clone(),
                wordlist,
                threads,
                timeout_secs: timeout,
                rate_limit,
                retries,
                delay_ms: delay,
                headers: parsed_headers,
                stages,
                ..ScanConfig::default()
            };
            if let Some(user_agent) = user_agent {
                config.user_agent = user_agent;
            }

            let engine = Engine::new(config)?;

            print_ascii_logo();
            println!("[>] Target: {domain}");
            println!("[~] Threads: {threads}, timeout: {timeout}s, retries: {retries}");
            if rate_limit > 0 {
                println!("[~] Rate limit: {rate_limit} req/s");
            }
            if dns_only {
                println!("[·] Mode: DNS-only sweep");
            }
            println!("\n{}\n", "-".repeat(60));

            let progress = (!no_progress).then(|| {
                let bar = ProgressBar::new(engine.candidate_count() as u64);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}",
                    )
                    .expect("static progress template")
                    .progress_chars("=> "),
                );
                bar
            });

            let outcome = engine.scan(progress.clone()).await;
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            for record in &outcome.records {
                println!("{}", output::format_record(record));
            }
            output::text::print_summary(&outcome.summary);

            fs::create_dir_all(&out)?;
            if text {
                let path = out.join(format!("{domain}.txt"));
                output::write_text(&path, &outcome.records)?;
                println!("[+] Text results saved to {}", path.display());
            }
            if json {
                let path = out.join(format!("{domain}.json"));
                output::write_json(&path, &outcome.records)?;
                println!("[+] JSON results saved to {}", path.display());
            }
            if xml {
                let path = out.join(format!("{domain}.xml"));
                output::write_xml(&path, &outcome.records)?;
                println!("[+] XML results saved to {}", path.display());
            }
            if csv {
                let path = out.join(format!("{domain}.csv"));
                output::write_csv(&path, &outcome.records)?;
                println!("[+] CSV results saved to {}", path.display());
            }
            if html {
                let path = out.join(format!("{domain}.html"));
                output::write_html(&path, &outcome.summary, &outcome.records)?;
                println!("[+] HTML report saved to {}", path.display());
            }

            // Always refresh the dashboard snapshot; the dashboard reads it
            // back instead of re-scanning.
            let store = SnapshotStore::new(out.join("snapshots"));
            let snapshot_path = store.save(&outcome.summary, &outcome.records)?;
            tracing::info!(path = %snapshot_path.display(), "dashboard snapshot updated");
        }
    }
    Ok(())
}
