use scraper::Html;
use tracing::instrument;

use crate::errors::CdlError;
use crate::session::Transport;

/// Fetches `url` through the session transport and parses the body. Any
/// non-success status is an error; the body is read to the end before
/// parsing so the connection is released on every path.
#[instrument(skip(transport))]
pub async fn fetch_page(transport: &Transport, url: &str) -> Result<Html, CdlError> {
    let response = transport.get(url).await?;
    if !response.status().is_success() {
        tracing::error!("Error status code received : {} |{}|", response.status(), url);
        return Err(CdlError::ErrorStatusCode {
            status_code: response.status().to_string(),
            url: url.to_string(),
        });
    }
    let body = response.text().await.map_err(|e| {
        tracing::error!("Failed to read page body from {}", url);
        tracing::error!("{}", e);
        CdlError::NetworkError(e.to_string())
    })?;
    Ok(Html::parse_document(&body))
}
