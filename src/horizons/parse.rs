//! Decoding of Horizons API responses
//!
//! The API wraps a plain-text report in a JSON envelope. With
//! `CSV_FORMAT='YES'` and `VEC_TABLE='1'` every data line between the `$$SOE`
//! and `$$EOE` markers reads `JDTDB, Calendar Date (TDB), X, Y, Z,`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::VectorRow;
use crate::bodies::Body;
use crate::{OrreryError, Result};

lazy_static! {
    /// Captures everything between the start- and end-of-ephemeris markers
    static ref VECTOR_TABLE: Regex =
        Regex::new(r"(?s)\$\$SOE(.*?)\$\$EOE").expect("vector table pattern is valid");
}

/// JSON envelope returned by the Horizons API
#[derive(Debug, Deserialize)]
struct HorizonsResponse {
    result: Option<String>,
    error: Option<String>,
}

/// Decode a Horizons JSON response into vector rows for `body`
pub fn parse_response(body: Body, json: &str) -> Result<Vec<VectorRow>> {
    let response: HorizonsResponse = serde_json::from_str(json).map_err(|e| {
        OrreryError::MalformedResponse(format!("{} response is not JSON: {}", body, e))
    })?;

    if let Some(error) = response.error {
        return Err(OrreryError::DataSourceUnavailable {
            body,
            reason: error.trim().to_string(),
        });
    }

    let result = response.result.ok_or_else(|| {
        OrreryError::MalformedResponse(format!("{} response has no result field", body))
    })?;

    parse_vector_table(&result)
}

/// Extract rows from the text report, oldest first
pub fn parse_vector_table(text: &str) -> Result<Vec<VectorRow>> {
    let table = VECTOR_TABLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            // Horizons reports query problems as free text with no table
            let hint = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
                .unwrap_or("empty report");
            OrreryError::MalformedResponse(format!("no $$SOE/$$EOE vector table ({})", hint))
        })?;

    table
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| parse_row(line).ok_or_else(|| {
            OrreryError::MalformedResponse(format!("bad vector row {}: {:?}", i + 1, line))
        }))
        .collect()
}

fn parse_row(line: &str) -> Option<VectorRow> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 5 {
        return None;
    }

    let number = |s: &str| s.parse::<f64>().ok();
    Some(VectorRow {
        jd_tdb: number(fields[0])?,
        x: number(fields[2])?,
        y: number(fields[3])?,
        z: number(fields[4])?,
    })
}
