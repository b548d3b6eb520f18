use reqwest::{header, Url};
use tracing::debug;

use super::models::AphiaRecord;
use super::{ClientBuilder, Error, Result};

// -------------------------------------------------------------------------------------------------
// Client
// -------------------------------------------------------------------------------------------------
/// A client for the WoRMS REST API.
#[derive(Debug)]
pub struct Client {
    pub(super) base_url: Url,
    pub(super) marine_only: bool,
    pub(super) inner: reqwest::Client,
}

const MATCH_NAMES_PATH: &str = "AphiaRecordsByMatchNames";
const SCIENTIFIC_NAMES_PARAM: &str = "scientificnames[]";
const MARINE_ONLY_PARAM: &str = "marine_only";

impl Client {
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn marine_only(&self) -> bool {
        self.marine_only
    }

    /// Match a single scientific name against the registry.
    ///
    /// The registry answers with one group of candidate records per submitted name; since only
    /// one name is submitted, there is normally a single group. `null` groups are dropped.
    pub async fn match_name(&self, name: &str) -> Result<Vec<Vec<AphiaRecord>>> {
        let url = self.match_name_url(name)?;
        debug!("Next API query to run: {url}");

        let response = self.get_url(url).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(Error::ReqwestError)?;

        // The registry answers `204 No Content` when nothing matches
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::EmptyResponse(status));
        }

        let groups: Vec<Option<Vec<AphiaRecord>>> =
            serde_json::from_slice(&body).map_err(Error::JsonError)?;
        Ok(groups.into_iter().flatten().collect())
    }

    /// Construct the request URL for matching `name`.
    ///
    /// The name is form-encoded into the query string, so spaces become `+`.
    pub fn match_name_url(&self, name: &str) -> Result<Url> {
        let url = self
            .base_url
            .join(MATCH_NAMES_PATH)
            .map_err(Error::UrlParseError)?;
        let marine_only = if self.marine_only { "true" } else { "false" };
        Url::parse_with_params(
            url.as_str(),
            &[(SCIENTIFIC_NAMES_PARAM, name), (MARINE_ONLY_PARAM, marine_only)],
        )
        .map_err(Error::UrlParseError)
    }
}

// private implementation
impl Client {
    async fn get_url(&self, url: Url) -> Result<reqwest::Response> {
        let response = self
            .inner
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(Error::ReqwestError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status, url });
        }
        Ok(response)
    }
}
