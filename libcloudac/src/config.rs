use scraper::Selector;
use url::Url;

use crate::errors::CdlError;

const DEFAULT_BASE_URL: &str = "https://cloudacademy.com";
const LOGIN_PATH: &str = "/login/";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Where the platform lives and how its pages are marked up.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Prefix for relative lecture links found on course pages.
    pub base_url: Url,
    /// Credentials are posted here. Must not be empty.
    pub login_url: String,
    /// Fetched after login to confirm the session is signed in.
    pub home_url: String,
    pub user_agent: String,
    pub markup: Markup,
}

impl SiteConfig {
    /// The live platform.
    pub fn production() -> Result<Self, CdlError> {
        Self::for_base_url(DEFAULT_BASE_URL)
    }

    /// Derives the login and home pages from `base_url`.
    pub fn for_base_url(base_url: &str) -> Result<Self, CdlError> {
        let base_url =
            Url::parse(base_url).map_err(|_| CdlError::InvalidUrl(base_url.to_string()))?;
        let login_url = base_url
            .join(LOGIN_PATH)
            .map_err(|e| CdlError::InvalidUrl(e.to_string()))?;
        let home_url = base_url
            .join("/")
            .map_err(|e| CdlError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            login_url: login_url.to_string(),
            home_url: home_url.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            markup: Markup::default(),
        })
    }
}

/// Every CSS selector the scraper relies on. When the site changes its
/// markup, this is the only place that needs to follow.
#[derive(Debug, Clone)]
pub struct Markup {
    /// Lecture anchors on a course page.
    pub course_contents: String,
    /// Course anchors on a learning path page.
    pub learning_path_courses: String,
    /// Media source candidates on a lecture page.
    pub video_sources: String,
    /// Only present on pages rendered for a signed in user.
    pub signed_in_marker: String,
}

impl Default for Markup {
    fn default() -> Self {
        Self {
            course_contents: "#course-contents a".to_string(),
            learning_path_courses: "article.course a".to_string(),
            video_sources: "source[type='video/mp4']".to_string(),
            signed_in_marker: ".navbar-user".to_string(),
        }
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CdlError> {
    Selector::parse(selector).map_err(|e| {
        tracing::error!("Unusable css selector {}", selector);
        CdlError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{e:?}"),
        }
    })
}
