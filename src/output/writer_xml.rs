use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::ScanRecord;

/// Minimal escaped XML in the `<subdomains><subdomain>` shape. Nothing in
/// the corpus justified pulling in an XML crate for a write-only format.
pub fn write_xml(path: &Path, records: &[ScanRecord]) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, "<subdomains>")?;

    for record in records {
        writeln!(w, "  <subdomain>")?;
        writeln!(w, "    <name>{}</name>", escape(&record.subdomain))?;
        writeln!(w, "    <ip>{}</ip>", record.ip)?;
        if let Some(status) = record.status {
            writeln!(w, "    <status>{status}</status>")?;
        }
        if let Some(title) = &record.title {
            writeln!(w, "    <title>{}</title>", escape(title))?;
        }
        if let Some(server) = &record.server {
            writeln!(w, "    <server>{}</server>", escape(server))?;
        }
        if !record.ports.is_empty() {
            writeln!(w, "    <ports>")?;
            for port in &record.ports {
                writeln!(
                    w,
                    r#"      <port number="{}" service="{}"/>"#,
                    port.port,
                    escape(&port.service)
                )?;
            }
            writeln!(w, "    </ports>")?;
        }
        for vuln in &record.vulnerabilities {
            writeln!(
                w,
                r#"    <vulnerability severity="{}">{}</vulnerability>"#,
                vuln.severity,
                escape(&vuln.name)
            )?;
        }
        writeln!(w, "    <risk>{}</risk>", record.risk_level)?;
        writeln!(w, "    <confidence>{}</confidence>", record.confidence)?;
        writeln!(w, "  </subdomain>")?;
    }

    writeln!(w, "</subdomains>")?;
    w.flush()?;
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
