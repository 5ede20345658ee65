use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use html_escape::encode_text;

use crate::types::{RiskLevel, ScanRecord, ScanSummary};

/// Self-contained HTML report: summary cards up top, one risk-badged row
/// per host with port/technology/vulnerability detail.
pub fn write_html(
    path: &Path,
    summary: &ScanSummary,
    records: &[ScanRecord],
) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    writeln!(
        w,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Subdomain Security Report - {domain}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: 'Segoe UI', Tahoma, sans-serif; color: #333; background: #f5f5f5; }}
  .container {{ max-width: 1200px; margin: 0 auto; padding: 20px; }}
  .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #fff;
             padding: 32px; text-align: center; border-radius: 10px; margin-bottom: 24px; }}
  .cards {{ display: flex; gap: 16px; flex-wrap: wrap; margin-bottom: 24px; }}
  .card {{ background: #fff; border-radius: 8px; padding: 16px 24px; flex: 1;
           box-shadow: 0 2px 4px rgba(0,0,0,0.08); text-align: center; }}
  .card .value {{ font-size: 1.8em; font-weight: bold; }}
  table {{ width: 100%; border-collapse: collapse; background: #fff; border-radius: 8px; }}
  th, td {{ padding: 10px 12px; text-align: left; border-bottom: 1px solid #eee; }}
  th {{ background: #fafafa; }}
  .badge {{ padding: 2px 10px; border-radius: 10px; color: #fff; font-size: 0.85em; }}
  .badge.high {{ background: #d9534f; }}
  .badge.medium {{ background: #f0ad4e; }}
  .badge.low {{ background: #5bc0de; }}
  .badge.info {{ background: #5cb85c; }}
  .detail {{ color: #777; font-size: 0.9em; }}
</style>
</head>
<body>
<div class="container">
<div class="header">
  <h1>Subdomain Security Report</h1>
  <p>{domain} &mdash; generated {generated}</p>
</div>"#,
        domain = encode_text(&summary.domain),
        generated = summary.finished.format("%Y-%m-%d %H:%M:%S UTC"),
    )?;

    writeln!(
        w,
        r#"<div class="cards">
  <div class="card"><div class="value">{}</div><div>Candidates</div></div>
  <div class="card"><div class="value">{}</div><div>Found</div></div>
  <div class="card"><div class="value">{}</div><div>Open ports</div></div>
  <div class="card"><div class="value">{}</div><div>Vulnerabilities</div></div>
  <div class="card"><div class="value">{}</div><div>High risk</div></div>
</div>"#,
        summary.total_candidates,
        summary.found,
        summary.open_ports,
        summary.vulnerabilities,
        summary.high_risk,
    )?;

    writeln!(
        w,
        "<table>\n<tr><th>Subdomain</th><th>IP</th><th>Status</th><th>Risk</th>\
         <th>Confidence</th><th>Details</th></tr>"
    )?;

    for record in records {
        let badge = badge_class(record.risk_level);
        let status = record
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut details: Vec<String> = Vec::new();
        if let Some(title) = &record.title {
            details.push(format!("title: {}", encode_text(title)));
        }
        if !record.ports.is_empty() {
            let ports: Vec<String> = record.ports.iter().map(|p| p.port.to_string()).collect();
            details.push(format!("ports: {}", ports.join(", ")));
        }
        if !record.technologies.is_empty() {
            let techs: Vec<String> = record
                .technologies
                .iter()
                .map(|t| encode_text(&t.name).into_owned())
                .collect();
            details.push(format!("tech: {}", techs.join(", ")));
        }
        if let Some(cert) = &record.certificate {
            details.push(format!("tls grade: {}", encode_text(&cert.grade)));
        }
        for vuln in &record.vulnerabilities {
            details.push(format!(
                "{}: {}",
                vuln.severity,
                encode_text(&vuln.name)
            ));
        }

        writeln!(
            w,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td><span class="badge {}">{}</span></td><td>{}</td><td class="detail">{}</td></tr>"#,
            encode_text(&record.subdomain),
            record.ip,
            status,
            badge,
            record.risk_level,
            record.confidence,
            details.join("<br>"),
        )?;
    }

    writeln!(w, "</table>\n</div>\n</body>\n</html>")?;
    w.flush()?;
    Ok(())
}

fn badge_class(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "high",
        RiskLevel::Medium => "medium",
        RiskLevel::Low => "low",
        RiskLevel::Info => "info",
    }
}
