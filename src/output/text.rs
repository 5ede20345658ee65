use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::{ScanRecord, ScanSummary};

/// One stdout line per discovered host.
pub fn format_record(record: &ScanRecord) -> String {
    let mut line = format!("[FOUND] {} -> {}", record.subdomain, record.ip);
    if let Some(status) = record.status {
        line.push_str(&format!(" [{status}]"));
    }
    line.push_str(&format!(
        " risk={} confidence={}",
        record.risk_level, record.confidence
    ));
    if !record.ports.is_empty() {
        let ports: Vec<String> = record.ports.iter().map(|p| p.port.to_string()).collect();
        line.push_str(&format!(" ports={}", ports.join(",")));
    }
    if !record.vulnerabilities.is_empty() {
        line.push_str(&format!(" vulns={}", record.vulnerabilities.len()));
    }
    line
}

pub fn print_summary(summary: &ScanSummary) {
    println!();
    println!("{}", "-".repeat(60));
    println!("Domain:            {}", summary.domain);
    println!("Candidates probed: {}", summary.total_candidates);
    println!("Subdomains found:  {}", summary.found);
    println!("Open ports:        {}", summary.open_ports);
    println!("Vulnerabilities:   {}", summary.vulnerabilities);
    println!("High-risk hosts:   {}", summary.high_risk);
    let mut levels: Vec<_> = summary.risk_distribution.iter().collect();
    levels.sort();
    for (level, count) in levels {
        println!("  {level:<8} {count}");
    }
    println!("Duration:          {:.1}s", summary.duration_ms as f64 / 1000.0);
    println!("{}", "-".repeat(60));
}

pub fn write_text(path: &Path, records: &[ScanRecord]) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        writeln!(writer, "{}", format_record(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortInfo;
    use std::net::IpAddr;

    #[test]
    fn formats_the_essential_fields() {
        let mut record = ScanRecord::new("api.example.com", "192.0.2.7".parse::<IpAddr>().unwrap());
        record.status = Some(403);
        record.ports = vec![PortInfo {
            port: 443,
            protocol: "tcp".into(),
            service: "https".into(),
            banner: None,
        }];
        let line = format_record(&record);
        assert!(line.starts_with("[FOUND] api.example.com -> 192.0.2.7 [403]"));
        assert!(line.contains("ports=443"));
        assert!(!line.contains("vulns="));
    }
}
