use crate::error::LookupError;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Settings shared by the lookup client and the presentation layers.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub districts_url: String,
    pub schools_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub maps_api_key: String,
    pub stale_policy: StaleResponsePolicy,
}

/// What to do with a search response that is no longer the newest one for its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StaleResponsePolicy {
    /// Drop responses from searches that were superseded before they resolved.
    #[default]
    Discard,
    /// Apply every response in the order it arrives.
    LastResolvedWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchDomain {
    District,
    School,
}

impl SearchDomain {
    pub fn label(self) -> &'static str {
        match self {
            SearchDomain::District => "district",
            SearchDomain::School => "school",
        }
    }
}

/// ArcGIS returns `null` for blank text columns; treat them as empty.
fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictRecord {
    #[serde(rename(deserialize = "LEAID"))]
    pub id: String,
    #[serde(rename(deserialize = "NAME"), default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename(deserialize = "LCITY"), default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(rename(deserialize = "LSTATE"), default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(rename(deserialize = "LZIP"), default, deserialize_with = "null_as_empty")]
    pub zip: String,
}

impl DistrictRecord {
    /// "City, ST 12345"
    pub fn locality(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolRecord {
    #[serde(rename(deserialize = "NCESSCH"))]
    pub id: String,
    #[serde(rename(deserialize = "NAME"), default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename(deserialize = "STREET"), default, deserialize_with = "null_as_empty")]
    pub street: String,
    #[serde(rename(deserialize = "CITY"), default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(rename(deserialize = "STATE"), default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(rename(deserialize = "ZIP"), default, deserialize_with = "null_as_empty")]
    pub zip: String,
    #[serde(rename(deserialize = "LEAID"), default)]
    pub district_id: Option<String>,
}

impl SchoolRecord {
    /// "Street, City, ST 12345"
    pub fn address(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
    }
}

/// Issued when a search starts; carries everything the lookup needs, captured at trigger time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub domain: SearchDomain,
    pub generation: u64,
    pub query: String,
    pub district_id: Option<String>,
}

/// Events flowing from the lookup controller back to presentation layers.
#[derive(Debug)]
pub enum AppEvent {
    DistrictsResolved {
        ticket: SearchTicket,
        outcome: Result<Vec<DistrictRecord>, LookupError>,
    },
    SchoolsResolved {
        ticket: SearchTicket,
        outcome: Result<Vec<SchoolRecord>, LookupError>,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Searching { domain: SearchDomain, query: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Searching { domain, query } => {
                format!("Searching {}s for \"{}\"…", domain.label(), query)
            }
        }
    }
}

/// Point-in-time view of the search state, for one-shot output.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSnapshot {
    pub timestamp_utc: String,
    pub district_query: String,
    pub school_query: String,
    pub districts: Vec<DistrictRecord>,
    pub schools: Vec<SchoolRecord>,
    pub selected_district: Option<DistrictRecord>,
    pub selected_school: Option<SchoolRecord>,
    pub map_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
