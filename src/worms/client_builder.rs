use reqwest::{IntoUrl, Url};
use std::time::Duration;

use super::{Client, Error, Result};

/// The REST endpoint of the public WoRMS registry.
pub const DEFAULT_BASE_URL: &str = "https://www.marinespecies.org/rest/";

// -------------------------------------------------------------------------------------------------
// ClientBuilder
// -------------------------------------------------------------------------------------------------
pub struct ClientBuilder {
    base_url: Url,
    marine_only: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    const USER_AGENT: &'static str = concat!("wormslookup/", env!("CARGO_PKG_VERSION"));

    pub fn new() -> Self {
        ClientBuilder {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL should parse"),
            marine_only: true,
            timeout: None,
        }
    }

    /// Use a different registry endpoint.
    ///
    /// Request paths are resolved relative to this URL, so a trailing slash is added if missing.
    pub fn base_url<T: IntoUrl>(mut self, url: T) -> Result<Self> {
        let mut url = url.into_url().map_err(Error::ReqwestError)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        Ok(self)
    }

    /// Restrict matches to taxa flagged as marine. Enabled by default.
    pub fn marine_only(mut self, marine_only: bool) -> Self {
        self.marine_only = marine_only;
        self
    }

    /// Set a total per-request timeout. By default the transport's default is used.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut builder = reqwest::ClientBuilder::new().user_agent(Self::USER_AGENT);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(Error::ReqwestError)?;
        Ok(Client {
            base_url: self.base_url,
            marine_only: self.marine_only,
            inner,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
