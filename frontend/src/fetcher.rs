use classifier::{FetchError, ModelFetcher};
use gloo_net::http::Request;

/// Fetches model files from the page's own origin.
pub struct GlooFetcher;

impl ModelFetcher for GlooFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = Request::get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(url, format!("Network error: {}", e)))?;

        if !response.ok() {
            return Err(FetchError::new(
                url,
                format!("Server error: {} {}", response.status(), response.status_text()),
            ));
        }

        response
            .binary()
            .await
            .map_err(|e| FetchError::new(url, format!("Failed to read body: {}", e)))
    }
}
