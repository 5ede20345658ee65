use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::types::ScanRecord;

/// Flattened per-host rows; list-valued fields are joined so the file stays
/// one row per subdomain.
pub fn write_csv(path: &Path, records: &[ScanRecord]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record([
        "subdomain",
        "ip",
        "status",
        "title",
        "server",
        "content_length",
        "open_ports",
        "technologies",
        "vulnerabilities",
        "cert_grade",
        "risk_level",
        "confidence",
        "elapsed_ms",
    ])?;

    for record in records {
        let ports: Vec<String> = record.ports.iter().map(|p| p.port.to_string()).collect();
        let technologies: Vec<String> =
            record.technologies.iter().map(|t| t.name.clone()).collect();
        let vulnerabilities: Vec<String> = record
            .vulnerabilities
            .iter()
            .map(|v| format!("{} ({})", v.name, v.severity))
            .collect();

        writer.write_record(&[
            record.subdomain.clone(),
            record.ip.to_string(),
            record.status.map(|s| s.to_string()).unwrap_or_default(),
            record.title.clone().unwrap_or_default(),
            record.server.clone().unwrap_or_default(),
            record
                .content_length
                .map(|l| l.to_string())
                .unwrap_or_default(),
            ports.join(" "),
            technologies.join("; "),
            vulnerabilities.join("; "),
            record
                .certificate
                .as_ref()
                .map(|c| c.grade.clone())
                .unwrap_or_default(),
            record.risk_level.to_string(),
            record.confidence.to_string(),
            record.elapsed_ms.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
