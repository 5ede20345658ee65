use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::types::ScanRecord;

pub fn write_json(path: &Path, records: &[ScanRecord]) -> anyhow::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}
