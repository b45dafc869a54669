use scraper::Html;
use tracing::instrument;
use url::Url;

use crate::config::parse_selector;
use crate::errors::CdlError;
use crate::link::get_full_link;
use crate::page::fetch_page;
use crate::session::Session;

pub const MEDIA_TYPE: &str = "video/mp4";
/// Attribute carrying the resolution label of a source, e.g. `720p`.
pub const RESOLUTION_ATTRIBUTE: &str = "data-res";

/// Finds the direct media url for a lecture at exactly `resolution`. Labels
/// are compared as strings, so `720` never matches `720p` and no nearby
/// resolution is tried.
#[instrument(skip(session))]
pub async fn resolve_video(
    session: &Session,
    lecture_url: &str,
    resolution: &str,
) -> Result<String, CdlError> {
    let document = fetch_page(session.transport(), lecture_url).await?;
    let src = find_video_source(&document, &session.config().markup.video_sources, resolution)?;
    match src {
        Some(src) => {
            let base = Url::parse(lecture_url)
                .map_err(|_| CdlError::InvalidUrl(lecture_url.to_string()))?;
            get_full_link(&src, &base).ok_or(CdlError::InvalidUrl(src))
        }
        None => {
            tracing::error!("No {} source at {} on {}", MEDIA_TYPE, resolution, lecture_url);
            Err(CdlError::NotFound("could not find the video file".to_string()))
        }
    }
}

/// First source element with the media type and resolution asked for.
pub(crate) fn find_video_source(
    document: &Html,
    selector: &str,
    resolution: &str,
) -> Result<Option<String>, CdlError> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .map(|element| element.value())
        .find(|source| {
            source.attr("type") == Some(MEDIA_TYPE)
                && source.attr(RESOLUTION_ATTRIBUTE) == Some(resolution)
                && source.attr("src").map_or(false, |src| !src.is_empty())
        })
        .and_then(|source| source.attr("src"))
        .map(str::to_string))
}
