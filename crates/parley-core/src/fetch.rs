//! DocumentFetcher port.
//!
//! Retrieving a page and extracting its title and plain text is delegated
//! to an adapter; the `HttpDocumentFetcher` implementation lives in
//! parley-infra.

use parley_types::error::FetchError;
use parley_types::summary::Document;

/// Retrieves a URL and returns its title plus extracted plain text.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Document, FetchError>> + Send;
}
