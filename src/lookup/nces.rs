//! NCES EDGE ArcGIS feature-layer client.
//!
//! Both layers expose the standard ArcGIS REST `query` operation; records come back as
//! `{"features": [{"attributes": {...}}]}` or `{"error": {...}}` with a 200 status.

use super::{LookupResult, LookupService};
use crate::error::LookupError;
use crate::model::{DistrictRecord, LookupConfig, SchoolRecord, SearchDomain};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const DEFAULT_DISTRICTS_URL: &str = "https://nces.ed.gov/opengis/rest/services/K12_School_Locations/EDGE_GEOCODE_PUBLICLEA_2122/MapServer/0/query";
pub const DEFAULT_SCHOOLS_URL: &str = "https://nces.ed.gov/opengis/rest/services/K12_School_Locations/EDGE_GEOCODE_PUBLICSCH_2122/MapServer/0/query";

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    features: Option<Vec<Feature<T>>>,
    error: Option<ArcGisError>,
}

#[derive(Debug, Deserialize)]
struct Feature<T> {
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct ArcGisError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

pub struct NcesClient {
    http: reqwest::Client,
    districts_url: String,
    schools_url: String,
}

impl NcesClient {
    pub fn new(cfg: &LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            districts_url: cfg.districts_url.clone(),
            schools_url: cfg.schools_url.clone(),
        })
    }

    #[instrument(name = "feature layer query", level = "debug", skip_all, fields(domain = domain.label()))]
    async fn query_layer<T: DeserializeOwned>(
        &self,
        domain: SearchDomain,
        url: &str,
        where_clause: String,
    ) -> LookupResult<T> {
        debug!(%where_clause, "querying feature layer");
        let resp = self
            .http
            .get(url)
            .query(&[
                ("where", where_clause.as_str()),
                ("outFields", "*"),
                ("returnGeometry", "false"),
                ("f", "json"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LookupError::from_http(domain, e))?;

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LookupError::from_http(domain, e))?;
        let records = parse_features(domain, body)?;
        debug!(count = records.len(), "feature layer answered");
        Ok(records)
    }
}

impl LookupService for NcesClient {
    fn search_districts<'a>(&'a self, query: &'a str) -> BoxFuture<'a, LookupResult<DistrictRecord>> {
        self.query_layer(SearchDomain::District, &self.districts_url, district_where(query))
            .boxed()
    }

    fn search_schools<'a>(
        &'a self,
        query: &'a str,
        district_id: Option<&'a str>,
    ) -> BoxFuture<'a, LookupResult<SchoolRecord>> {
        self.query_layer(
            SearchDomain::School,
            &self.schools_url,
            school_where(query, district_id),
        )
        .boxed()
    }
}

/// Quote a value as an SQL string literal for an ArcGIS `where` clause.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn name_like(query: &str) -> String {
    format!("UPPER(NAME) LIKE UPPER({})", sql_literal(&format!("%{query}%")))
}

pub(crate) fn district_where(query: &str) -> String {
    name_like(query)
}

pub(crate) fn school_where(query: &str, district_id: Option<&str>) -> String {
    match district_id {
        Some(id) => format!("{} AND LEAID = {}", name_like(query), sql_literal(id)),
        None => name_like(query),
    }
}

pub(crate) fn parse_features<T: DeserializeOwned>(
    domain: SearchDomain,
    body: serde_json::Value,
) -> LookupResult<T> {
    let parsed: QueryResponse<T> = serde_json::from_value(body)
        .map_err(|e| LookupError::failed(domain, format!("unexpected response: {e}")))?;

    if let Some(err) = parsed.error {
        warn!(domain = domain.label(), code = ?err.code, message = %err.message, "feature layer returned an error");
        let reason = match err.code {
            Some(code) => format!("service error {code}: {}", err.message),
            None => format!("service error: {}", err.message),
        };
        return Err(LookupError::failed(domain, reason));
    }

    parsed
        .features
        .map(|features| features.into_iter().map(|f| f.attributes).collect())
        .ok_or_else(|| LookupError::failed(domain, "response had no features"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StaleResponsePolicy;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    enum Reply {
        Canned(String),
        Stall,
    }

    /// Serve one connection on an ephemeral port. The handle yields the request head.
    async fn serve_once(reply: Reply) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/query", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            match reply {
                Reply::Canned(resp) => {
                    sock.write_all(resp.as_bytes()).await.unwrap();
                    sock.shutdown().await.ok();
                }
                Reply::Stall => tokio::time::sleep(Duration::from_secs(5)).await,
            }
            String::from_utf8_lossy(&head).into_owned()
        });
        (base, handle)
    }

    fn client(url: &str, timeout: Duration) -> NcesClient {
        NcesClient::new(&LookupConfig {
            districts_url: url.to_string(),
            schools_url: url.to_string(),
            timeout,
            user_agent: "school-data-finder-test".into(),
            maps_api_key: String::new(),
            stale_policy: StaleResponsePolicy::default(),
        })
        .unwrap()
    }

    fn ok_json(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn school_query_sends_encoded_where_clause() {
        let body = r#"{"features":[{"attributes":{"NCESSCH":"789","NAME":"Lincoln High","STREET":"1 Main St","CITY":"Town","STATE":"AL","ZIP":"35000","LEAID":"0100005"}}]}"#;
        let (url, server) = serve_once(Reply::Canned(ok_json(body))).await;

        let schools = client(&url, Duration::from_secs(5))
            .search_schools("Lincoln", Some("0100005"))
            .await
            .unwrap();
        assert_eq!(schools.len(), 1);
        assert_eq!(schools[0].id, "789");
        assert_eq!(schools[0].district_id.as_deref(), Some("0100005"));

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /query?"), "{request_line}");
        assert!(
            request_line.contains(
                "where=UPPER%28NAME%29+LIKE+UPPER%28%27%25Lincoln%25%27%29+AND+LEAID+%3D+%270100005%27"
            ),
            "{request_line}"
        );
        assert!(request_line.contains("&outFields=*&returnGeometry=false&f=json"), "{request_line}");
    }

    #[tokio::test]
    async fn non_success_status_becomes_lookup_failure() {
        let (url, server) = serve_once(Reply::Canned(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".into(),
        ))
        .await;

        let err = client(&url, Duration::from_secs(5))
            .search_schools("Lincoln", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "school lookup failed: HTTP 503 Service Unavailable");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let (url, server) = serve_once(Reply::Stall).await;

        let err = client(&url, Duration::from_millis(200))
            .search_districts("Springfield")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "district lookup failed: request timed out");
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_host_becomes_lookup_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/query", listener.local_addr().unwrap());
        drop(listener);

        let err = client(&url, Duration::from_secs(5))
            .search_districts("Springfield")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Failed { domain: SearchDomain::District, .. }));
    }

    #[test]
    fn where_clause_escapes_quotes() {
        assert_eq!(
            district_where("O'Neill"),
            "UPPER(NAME) LIKE UPPER('%O''Neill%')"
        );
    }

    #[test]
    fn school_where_scopes_to_district() {
        assert_eq!(
            school_where("Lincoln", Some("0100005")),
            "UPPER(NAME) LIKE UPPER('%Lincoln%') AND LEAID = '0100005'"
        );
        assert_eq!(school_where("Lincoln", None), "UPPER(NAME) LIKE UPPER('%Lincoln%')");
    }

    #[test]
    fn parses_feature_attributes_in_order() {
        let body = json!({
            "features": [
                {"attributes": {"NCESSCH": "2", "NAME": "B", "STREET": "s", "CITY": "c", "STATE": "st", "ZIP": "z", "LEAID": "9"}},
                {"attributes": {"NCESSCH": "1", "NAME": "A", "STREET": "s", "CITY": "c", "STATE": "st", "ZIP": "z", "LEAID": null}}
            ]
        });
        let schools: Vec<SchoolRecord> = parse_features(SearchDomain::School, body).unwrap();
        let ids: Vec<_> = schools.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(schools[0].district_id.as_deref(), Some("9"));
        assert_eq!(schools[1].district_id, None);
    }

    #[test]
    fn empty_feature_list_is_not_an_error() {
        let districts: Vec<DistrictRecord> =
            parse_features(SearchDomain::District, json!({"features": []})).unwrap();
        assert!(districts.is_empty());
    }

    #[test]
    fn error_body_becomes_lookup_failure() {
        let body = json!({"error": {"code": 400, "message": "Unable to complete operation."}});
        let err = parse_features::<DistrictRecord>(SearchDomain::District, body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "district lookup failed: service error 400: Unable to complete operation."
        );
    }

    #[test]
    fn malformed_body_becomes_lookup_failure() {
        let err = parse_features::<SchoolRecord>(SearchDomain::School, json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, LookupError::Failed { domain: SearchDomain::School, .. }));
    }
}
