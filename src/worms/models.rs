use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// -------------------------------------------------------------------------------------------------
// AphiaRecord
// -------------------------------------------------------------------------------------------------
/// A taxon record from the WoRMS registry, as returned by the name-matching endpoints.
///
/// Every field is optional: the registry returns `null` for anything it doesn't know, and older
/// records omit some fields entirely. Fields this type doesn't name are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AphiaRecord {
    #[serde(rename = "AphiaID")]
    pub aphia_id: Option<i64>,
    pub url: Option<String>,
    pub scientificname: Option<String>,
    pub authority: Option<String>,
    pub status: Option<String>,
    pub unacceptreason: Option<String>,
    #[serde(rename = "taxonRankID")]
    pub taxon_rank_id: Option<i64>,
    pub rank: Option<String>,
    #[serde(rename = "valid_AphiaID")]
    pub valid_aphia_id: Option<i64>,
    pub valid_name: Option<String>,
    pub valid_authority: Option<String>,
    #[serde(rename = "parentNameUsageID")]
    pub parent_name_usage_id: Option<i64>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub citation: Option<String>,
    /// The registry spells this `lsid`; it is written out as `LSID`.
    #[serde(rename = "LSID", alias = "lsid")]
    pub lsid: Option<String>,
    #[serde(rename = "isMarine")]
    pub is_marine: Option<i64>,
    #[serde(rename = "isBrackish")]
    pub is_brackish: Option<i64>,
    #[serde(rename = "isFreshwater")]
    pub is_freshwater: Option<i64>,
    #[serde(rename = "isTerrestrial")]
    pub is_terrestrial: Option<i64>,
    #[serde(rename = "isExtinct")]
    pub is_extinct: Option<i64>,
    pub match_type: Option<String>,
    pub modified: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AphiaRecord {
    /// The column name and cell text of every field, in the order the registry lists them.
    /// Null fields become empty cells.
    pub fn cells(&self) -> Vec<(String, String)> {
        fn text(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }
        fn int(v: &Option<i64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }

        let mut cells: Vec<(String, String)> = [
            ("AphiaID", int(&self.aphia_id)),
            ("url", text(&self.url)),
            ("scientificname", text(&self.scientificname)),
            ("authority", text(&self.authority)),
            ("status", text(&self.status)),
            ("unacceptreason", text(&self.unacceptreason)),
            ("taxonRankID", int(&self.taxon_rank_id)),
            ("rank", text(&self.rank)),
            ("valid_AphiaID", int(&self.valid_aphia_id)),
            ("valid_name", text(&self.valid_name)),
            ("valid_authority", text(&self.valid_authority)),
            ("parentNameUsageID", int(&self.parent_name_usage_id)),
            ("kingdom", text(&self.kingdom)),
            ("phylum", text(&self.phylum)),
            ("class", text(&self.class)),
            ("order", text(&self.order)),
            ("family", text(&self.family)),
            ("genus", text(&self.genus)),
            ("citation", text(&self.citation)),
            ("LSID", text(&self.lsid)),
            ("isMarine", int(&self.is_marine)),
            ("isBrackish", int(&self.is_brackish)),
            ("isFreshwater", int(&self.is_freshwater)),
            ("isTerrestrial", int(&self.is_terrestrial)),
            ("isExtinct", int(&self.is_extinct)),
            ("match_type", text(&self.match_type)),
            ("modified", text(&self.modified)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();

        cells.extend(self.extra.iter().map(|(k, v)| (k.clone(), json_cell(v))));
        cells
    }
}

/// Render an arbitrary JSON value as cell text.
fn json_cell(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
