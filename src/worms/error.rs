use reqwest::{StatusCode, Url};

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
#[derive(Debug)]
pub enum Error {
    /// The registry answered with a non-success status
    HttpStatus { status: StatusCode, url: Url },

    /// The registry answered with a success status but no body
    EmptyResponse(StatusCode),

    UrlParseError(url::ParseError),
    ReqwestError(reqwest::Error),
    JsonError(serde_json::Error),
}

impl Error {
    /// Was this caused by the registry rejecting the request, as opposed to the request never
    /// completing or the response being unusable?
    pub fn is_http_status(&self) -> bool {
        matches!(self, Error::HttpStatus { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::HttpStatus { status, url } => write!(f, "HTTP status {status} for url ({url})"),
            Error::EmptyResponse(status) => write!(f, "empty response body (HTTP status {status})"),
            Error::UrlParseError(e) => write!(f, "error parsing URL: {e}"),
            Error::ReqwestError(e) => write!(f, "error making request: {e}"),
            Error::JsonError(e) => write!(f, "error decoding response: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::HttpStatus { .. } => None,
            Error::EmptyResponse(_) => None,
            Error::UrlParseError(e) => Some(e),
            Error::ReqwestError(e) => Some(e),
            Error::JsonError(e) => Some(e),
        }
    }
}
