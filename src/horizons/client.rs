//! Blocking client for the JPL Horizons API

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use super::parse::parse_response;
use super::{EphemerisQuery, EphemerisSource, VectorRow};
use crate::{OrreryError, Result};

/// Horizons API endpoint
pub const HORIZONS_API_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Heliocentric origin (geometric center of the Sun)
const SUN_CENTER: &str = "500@10";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches state vectors from Horizons, one HTTP request per query
///
/// The underlying HTTP client is built once and reused for every query.
#[derive(Debug, Clone)]
pub struct HorizonsClient {
    http: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

fn build_http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().timeout(timeout).build()?)
}

impl HorizonsClient {
    /// Client for the public endpoint with a 30 second timeout and no retries
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: build_http_client(DEFAULT_TIMEOUT)?,
            base_url: HORIZONS_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            backoff: Duration::from_secs(1),
        })
    }

    /// Point the client at a mirror or a local test server
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Rebuild the HTTP client with a different request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry failed transfers up to `retries` times, doubling the delay each time
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    /// Query-string parameters for a vector table request
    pub fn query_params(query: &EphemerisQuery) -> Vec<(&'static str, String)> {
        vec![
            ("format", "json".to_string()),
            ("COMMAND", format!("'{}'", query.body.id())),
            ("OBJ_DATA", "'NO'".to_string()),
            ("MAKE_EPHEM", "'YES'".to_string()),
            ("EPHEM_TYPE", "'VECTORS'".to_string()),
            ("CENTER", format!("'{}'", SUN_CENTER)),
            ("REF_PLANE", "'ECLIPTIC'".to_string()),
            ("VEC_TABLE", "'1'".to_string()),
            ("OUT_UNITS", "'AU-D'".to_string()),
            ("CSV_FORMAT", "'YES'".to_string()),
            ("START_TIME", format!("'{}'", query.start.format("%Y-%m-%d"))),
            ("STOP_TIME", format!("'{}'", query.stop.format("%Y-%m-%d"))),
            ("STEP_SIZE", format!("'{} d'", query.step_days)),
        ]
    }

    /// Perform one request, returning the raw response body
    fn fetch_once(&self, query: &EphemerisQuery) -> std::result::Result<String, String> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&Self::query_params(query))
            .send()
            .map_err(|e| format!("request failed: {}", e))?;

        debug!("GET {} -> {}", response.url(), response.status());

        // Horizons answers bad queries with 400 and a JSON error body
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            return Err(format!("HTTP status {}", status));
        }

        response
            .text()
            .map_err(|e| format!("failed to read response: {}", e))
    }
}

impl EphemerisSource for HorizonsClient {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        info!(
            "Requesting {} vectors {} .. {} every {} d",
            query.body, query.start, query.stop, query.step_days
        );

        let mut attempt = 0;
        let text = loop {
            match self.fetch_once(query) {
                Ok(text) => break text,
                Err(reason) if attempt < self.retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    warn!(
                        "{} request failed ({}), retrying in {:?} ({}/{})",
                        query.body,
                        reason,
                        delay,
                        attempt + 1,
                        self.retries
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(reason) => {
                    return Err(OrreryError::DataSourceUnavailable {
                        body: query.body,
                        reason,
                    })
                }
            }
        };

        let rows = parse_response(query.body, &text)?;
        debug!("{}: received {} rows", query.body, rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Body;
    use chrono::NaiveDate;

    fn mercury_query() -> EphemerisQuery {
        EphemerisQuery {
            body: Body::Mercury,
            start: NaiveDate::from_ymd_opt(2023, 7, 14).unwrap(),
            stop: NaiveDate::from_ymd_opt(2023, 10, 10).unwrap(),
            step_days: 1,
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing parameter {}", key))
    }

    #[test]
    fn test_query_params() {
        let params = HorizonsClient::query_params(&mercury_query());
        assert_eq!(param(&params, "format"), "json");
        assert_eq!(param(&params, "COMMAND"), "'1'");
        assert_eq!(param(&params, "EPHEM_TYPE"), "'VECTORS'");
        assert_eq!(param(&params, "CENTER"), "'500@10'");
        assert_eq!(param(&params, "START_TIME"), "'2023-07-14'");
        assert_eq!(param(&params, "STOP_TIME"), "'2023-10-10'");
        assert_eq!(param(&params, "STEP_SIZE"), "'1 d'");
    }

    #[test]
    fn test_outer_planet_params() {
        let query = EphemerisQuery {
            body: Body::Neptune,
            step_days: 30,
            ..mercury_query()
        };
        let params = HorizonsClient::query_params(&query);
        assert_eq!(param(&params, "COMMAND"), "'8'");
        assert_eq!(param(&params, "STEP_SIZE"), "'30 d'");
    }

    #[test]
    fn test_unreachable_host_is_unavailable() {
        // Nothing listens on the discard port
        let client = HorizonsClient::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:9/api/horizons.api")
            .with_timeout(Duration::from_secs(2))
            .unwrap();

        match client.vectors(&mercury_query()) {
            Err(OrreryError::DataSourceUnavailable { body, .. }) => {
                assert_eq!(body, Body::Mercury)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_rebuilds_client() {
        let client = HorizonsClient::new().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let client = client.with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_one_client_serves_every_query() {
        let client = HorizonsClient::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:9/api/horizons.api")
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let shared = client.clone();

        for body in [Body::Mercury, Body::Saturn] {
            let query = EphemerisQuery {
                body,
                ..mercury_query()
            };
            assert!(matches!(
                shared.vectors(&query),
                Err(OrreryError::DataSourceUnavailable { body: failed, .. }) if failed == body
            ));
        }
        assert!(client.vectors(&mercury_query()).is_err());
    }

    // Skip this test in CI as it requires network access
    #[test]
    #[ignore]
    fn test_live_mercury_vectors() {
        let rows = HorizonsClient::new().unwrap().vectors(&mercury_query()).unwrap();
        assert_eq!(rows.len(), 89);
        let r = (rows[0].x.powi(2) + rows[0].y.powi(2) + rows[0].z.powi(2)).sqrt();
        assert!(r > 0.30 && r < 0.47, "Mercury at {} AU", r);
    }
}
