use scraper::{ElementRef, Html};
use tracing::{event, instrument, Level};
use url::{ParseError, Url};

use crate::config::parse_selector;
use crate::errors::CdlError;
use crate::page::fetch_page;
use crate::session::Session;

/// Lectures rendered client side point here instead of at a page of their
/// own; their video lives on the course page.
pub const PLACEHOLDER_HREF: &str = "javascript:void(0);";

/// A titled link found on a course or learning path page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// Get the full link to a page, given the url it is relative to.
pub(crate) fn get_full_link(link: &str, base_url: &Url) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    match Url::parse(link) {
        Ok(url) => Some(url.to_string()),
        Err(e)
            if e == ParseError::EmptyHost
                || e == ParseError::RelativeUrlWithoutBase
                || e == ParseError::RelativeUrlWithCannotBeABaseBase =>
        {
            base_url.join(link).ok().map(|u| u.to_string())
        }
        Err(e) => {
            event!(Level::ERROR, "Failed to get full link for {}", link);
            event!(Level::ERROR, "{}", e);
            None
        }
    }
}

/// Prefers the `title` attribute, the anchor text otherwise.
fn anchor_title(element: &ElementRef) -> String {
    match element.value().attr("title") {
        Some(title) if !title.trim().is_empty() => title.trim().to_string(),
        _ => element.text().collect::<Vec<_>>().join(" ").trim().to_string(),
    }
}

/// Returns the lectures of a course in page order. An empty result is not an
/// error here; whether a course without lectures is fatal is up to the caller.
#[instrument(skip(session))]
pub async fn list_lectures(session: &Session, course_url: &str) -> Result<Vec<Link>, CdlError> {
    let document = fetch_page(session.transport(), course_url).await?;
    let config = session.config();
    let lectures = extract_lectures(
        &document,
        &config.markup.course_contents,
        course_url,
        &config.base_url,
    )?;
    event!(Level::DEBUG, "Found {} lectures on {}", lectures.len(), course_url);
    Ok(lectures)
}

pub(crate) fn extract_lectures(
    document: &Html,
    selector: &str,
    course_url: &str,
    base_url: &Url,
) -> Result<Vec<Link>, CdlError> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if href == PLACEHOLDER_HREF {
                Some(Link {
                    title: anchor_title(&element),
                    url: course_url.to_string(),
                })
            } else if href.ends_with(".html") {
                let url = get_full_link(href, base_url)?;
                tracing::debug!("Full link for {} => {}", href, &url);
                Some(Link {
                    title: anchor_title(&element),
                    url,
                })
            } else {
                None
            }
        })
        .collect())
}

/// Returns the courses of a learning path in page order. A path without
/// courses is an error: there is nothing to download.
#[instrument(skip(session))]
pub async fn list_courses(session: &Session, path_url: &str) -> Result<Vec<Link>, CdlError> {
    let document = fetch_page(session.transport(), path_url).await?;
    let courses = extract_courses(&document, &session.config().markup.learning_path_courses)?;
    if courses.is_empty() {
        tracing::error!("No courses found on {}", path_url);
        return Err(CdlError::NotFound("no courses found".to_string()));
    }
    event!(Level::DEBUG, "Found {} courses on {}", courses.len(), path_url);
    Ok(courses)
}

pub(crate) fn extract_courses(document: &Html, selector: &str) -> Result<Vec<Link>, CdlError> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Link {
                title: anchor_title(&element),
                url: href.to_string(),
            })
        })
        .collect())
}
