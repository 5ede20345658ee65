pub mod dashboard;
pub mod html;
pub mod text;
pub mod writer_csv;
pub mod writer_json;
pub mod writer_xml;

pub use dashboard::{Snapshot, SnapshotStore};
pub use html::write_html;
pub use text::{format_record, write_text};
pub use writer_csv::write_csv;
pub use writer_json::write_json;
pub use writer_xml::write_xml;
