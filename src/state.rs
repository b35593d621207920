use crate::preview::PreviewExtractor;

/// Shared application state passed to all handlers.
///
/// The extractor holds the one HTTP client (and its connection pool) used
/// for every preview fetch.
#[derive(Clone)]
pub struct AppState {
    pub extractor: PreviewExtractor,
}
