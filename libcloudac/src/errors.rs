use std::fmt::Formatter;

/// Broad failure classes. Callers use this to decide whether an error ends
/// the whole run, the current course, or just the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Transport,
    Auth,
    NotFound,
    Io,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CdlError {
    MissingLoginUrl,
    InvalidUrl(String),
    InvalidSelector {
        selector: String,
        message: String,
    },
    NetworkError(String),
    ErrorStatusCode {
        status_code: String,
        url: String,
    },
    ClientBuildError(String),
    AuthenticationFailed(String),
    /// An entry point was called before `Session::authenticate` succeeded.
    NotSignedIn,
    NotFound(String),
    ErrorCreatingDestinationDirectory {
        dir: String,
        message: String,
    },
    /// parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
}

impl CdlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CdlError::MissingLoginUrl
            | CdlError::InvalidUrl(_)
            | CdlError::InvalidSelector { .. } => ErrorKind::Config,
            CdlError::NetworkError(_)
            | CdlError::ErrorStatusCode { .. }
            | CdlError::ClientBuildError(_) => ErrorKind::Transport,
            CdlError::AuthenticationFailed(_) | CdlError::NotSignedIn => ErrorKind::Auth,
            CdlError::NotFound(_) => ErrorKind::NotFound,
            CdlError::ErrorCreatingDestinationDirectory { .. }
            | CdlError::FileOperationError { .. } => ErrorKind::Io,
        }
    }
}

impl std::fmt::Display for CdlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            CdlError::MissingLoginUrl => "login url is not set".to_string(),
            CdlError::InvalidUrl(url) => format!("Invalid url received : {url}"),
            CdlError::InvalidSelector { selector, message } => {
                format!("invalid css selector {selector} : {message}")
            }
            CdlError::NetworkError(err) => format!("error connecting to internet. {err}"),
            CdlError::ErrorStatusCode { status_code, url } => {
                format!("server returned an error response. {url} => {status_code}")
            }
            CdlError::ClientBuildError(err) => format!("failed to build http client. {err}"),
            CdlError::AuthenticationFailed(reason) => format!("login failed. {reason}"),
            CdlError::NotSignedIn => "session is not signed in".to_string(),
            CdlError::NotFound(what) => what.to_string(),
            CdlError::ErrorCreatingDestinationDirectory { dir, message } => {
                format!("error creating destination directory {dir}. {message}")
            }
            CdlError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for CdlError {}
