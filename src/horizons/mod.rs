//! Ephemeris sources
//!
//! This module defines the seam between orbit assembly and wherever position
//! vectors come from. [`HorizonsClient`] talks to the JPL Horizons API,
//! [`CachedSource`] keeps responses on disk, and [`StaticSource`] serves
//! precomputed rows from memory.
//!
//! # Main Components
//!
//! - `client`: blocking HTTP client for the Horizons API
//! - `parse`: decoding of the Horizons JSON envelope and vector table
//! - `cache`: on-disk cache wrapping any other source

mod cache;
mod client;
pub mod parse;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bodies::Body;
use crate::{OrreryError, Result};

pub use cache::{get_cache_dir, CachedSource};
pub use client::{HorizonsClient, HORIZONS_API_URL};

/// One request for position vectors of a body over a date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemerisQuery {
    pub body: Body,
    /// First date of the window
    pub start: NaiveDate,
    /// Last date of the window, inclusive
    pub stop: NaiveDate,
    /// Days between samples
    pub step_days: u32,
}

/// A heliocentric position sample in AU
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorRow {
    /// Julian date (TDB) of the sample
    pub jd_tdb: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Anything that can answer an [`EphemerisQuery`] with time-ordered rows
///
/// Implementations return rows oldest first. They are not required to return
/// exactly the number of rows the window implies; callers truncate or reject.
pub trait EphemerisSource {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>>;
}

impl<S: EphemerisSource + ?Sized> EphemerisSource for &S {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        (**self).vectors(query)
    }
}

impl<S: EphemerisSource + ?Sized> EphemerisSource for Box<S> {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        (**self).vectors(query)
    }
}

/// In-memory source holding precomputed rows per body
///
/// The query window is not applied; every stored row for the body is returned.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: HashMap<Body, Vec<VectorRow>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rows served for a body
    pub fn with_rows(mut self, body: Body, rows: Vec<VectorRow>) -> Self {
        self.rows.insert(body, rows);
        self
    }

    pub fn insert(&mut self, body: Body, rows: Vec<VectorRow>) {
        self.rows.insert(body, rows);
    }
}

impl EphemerisSource for StaticSource {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        self.rows
            .get(&query.body)
            .cloned()
            .ok_or_else(|| OrreryError::DataSourceUnavailable {
                body: query.body,
                reason: "no rows loaded for this body".to_string(),
            })
    }
}
