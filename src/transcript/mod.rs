pub mod export;
pub mod store;
pub mod types;

pub use export::{export_to_file, export_transcript, format_duration_ms, ExportFormat};
pub use store::TranscriptStore;
pub use types::{Role, Turn};
