pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preview;
pub mod state;

pub use models::PreviewData;
pub use preview::{extract_preview, PreviewExtractor, PreviewOptions};
