use reqwest::{Client, Response};
use tracing::{event, instrument, Level};

use crate::config::{parse_selector, SiteConfig};
use crate::errors::CdlError;
use crate::page::fetch_page;

/// Performs HTTP calls on behalf of the session. The underlying client
/// keeps a cookie store, so every request made after login carries the
/// cookies the platform handed out.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(user_agent: &str) -> Result<Self, CdlError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build http client\nError : {}", e);
                CdlError::ClientBuildError(e.to_string())
            })?;
        Ok(Self { client })
    }

    /// Sends a GET. Only transport failures are errors here; status codes
    /// are left to the caller.
    pub async fn get(&self, url: &str) -> Result<Response, CdlError> {
        self.client.get(url).send().await.map_err(|e| {
            event!(Level::ERROR, "Error fetching {}", url);
            event!(Level::ERROR, "{}", e);
            CdlError::NetworkError(e.to_string())
        })
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<Response, CdlError> {
        self.client.post(url).form(form).send().await.map_err(|e| {
            event!(Level::ERROR, "Error posting form to {}", url);
            event!(Level::ERROR, "{}", e);
            CdlError::NetworkError(e.to_string())
        })
    }
}

/// The signed in identity used for every request of a run.
#[derive(Debug)]
pub struct Session {
    config: SiteConfig,
    transport: Transport,
    username: Option<String>,
}

impl Session {
    pub fn new(config: SiteConfig) -> Result<Self, CdlError> {
        let transport = Transport::new(&config.user_agent)?;
        Ok(Self {
            config,
            transport,
            username: None,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Logs in with a form POST, then loads the home page and looks for the
    /// signed in marker. The status of the POST is not trusted: the platform
    /// answers 200 to bad credentials too.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), CdlError> {
        if self.config.login_url.is_empty() {
            tracing::error!("No login url configured");
            return Err(CdlError::MissingLoginUrl);
        }
        // A failed attempt must not leave an earlier identity signed in.
        self.username = None;
        let response = self
            .transport
            .post_form(
                &self.config.login_url,
                &[("email", username), ("password", password)],
            )
            .await?;
        if !response.status().is_success() {
            tracing::warn!(
                "Login form answered with status {}, checking home page anyway",
                response.status()
            );
        }
        // Drain the body so the connection goes back to the pool.
        if let Err(e) = response.bytes().await {
            tracing::debug!("Failed to read login response body\nError : {}", e);
        }

        let home = fetch_page(&self.transport, &self.config.home_url).await?;
        let marker = parse_selector(&self.config.markup.signed_in_marker)?;
        if home.select(&marker).next().is_none() {
            tracing::error!(
                "Signed in marker {} missing from {}",
                self.config.markup.signed_in_marker,
                self.config.home_url
            );
            return Err(CdlError::AuthenticationFailed(
                "invalid credentials or login flow changed".to_string(),
            ));
        }

        tracing::debug!("Signed in as {}", username);
        self.username = Some(username.to_string());
        Ok(())
    }
}
