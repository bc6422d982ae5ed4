//! Closed orbital paths assembled from ephemeris rows
//!
//! An [`OrbitDataset`] holds one [`OrbitPath`] per planet, each covering the
//! planet's most recent full period up to a reference date. Every path ends
//! with a copy of its first sample so it can be drawn as a closed curve.

use std::io::Write;

use chrono::{Days, NaiveDate};
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;

use crate::bodies::Body;
use crate::horizons::{EphemerisQuery, EphemerisSource, VectorRow};
use crate::{OrreryError, Result};

/// Parse a `YYYY-MM-DD` reference date
pub fn parse_reference_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| OrreryError::InvalidDate(format!("{:?} is not YYYY-MM-DD: {}", date, e)))
}

/// First day of the window covering one full period of `body` up to `reference`
pub fn window_start(body: Body, reference: NaiveDate) -> Result<NaiveDate> {
    let period = u64::from(body.params().period_days);
    reference.checked_sub_days(Days::new(period)).ok_or_else(|| {
        OrreryError::InvalidDate(format!(
            "{} minus {} days is outside the supported calendar",
            reference, period
        ))
    })
}

/// The single request needed to build the path of `body`
pub fn orbit_query(body: Body, reference: NaiveDate) -> Result<EphemerisQuery> {
    Ok(EphemerisQuery {
        body,
        start: window_start(body, reference)?,
        stop: reference,
        step_days: body.params().step_days,
    })
}

/// Heliocentric x, y, z samples of one closed orbit, in AU
///
/// The three sequences always have the same length (at least two) and the
/// last sample repeats the first.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitPath {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl OrbitPath {
    /// Wrap already-closed coordinate sequences, checking the shape
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(OrreryError::InvalidPath {
                expected: "equal length x, y, z".to_string(),
                got: format!("lengths {}, {}, {}", x.len(), y.len(), z.len()),
            });
        }
        if x.len() < 2 {
            return Err(OrreryError::InvalidPath {
                expected: "at least two samples".to_string(),
                got: format!("{} samples", x.len()),
            });
        }

        let closed = [&x, &y, &z].iter().all(|axis| axis.first() == axis.last());
        if !closed {
            return Err(OrreryError::InvalidPath {
                expected: "last sample equal to the first".to_string(),
                got: format!(
                    "first ({}, {}, {}), last ({}, {}, {})",
                    x[0],
                    y[0],
                    z[0],
                    x[x.len() - 1],
                    y[y.len() - 1],
                    z[z.len() - 1]
                ),
            });
        }

        Ok(Self { x, y, z })
    }

    /// Build the closed path for `body` from time-ordered source rows
    ///
    /// Exactly `body.sample_count()` rows are used; extra rows are dropped and
    /// a shortfall is an [`OrreryError::InsufficientData`].
    pub fn from_rows(body: Body, rows: &[VectorRow]) -> Result<Self> {
        let expected = body.sample_count();
        let samples = rows
            .get(..expected)
            .ok_or(OrreryError::InsufficientData {
                body,
                expected,
                received: rows.len(),
            })?;

        if rows.len() > expected {
            debug!("{}: ignoring {} trailing rows", body, rows.len() - expected);
        }

        let mut x = Vec::with_capacity(expected + 1);
        let mut y = Vec::with_capacity(expected + 1);
        let mut z = Vec::with_capacity(expected + 1);
        for row in samples {
            x.push(row.x);
            y.push(row.y);
            z.push(row.z);
        }

        // Close the loop
        if let Some(first) = samples.first() {
            x.push(first.x);
            y.push(first.y);
            z.push(first.z);
        }

        Self::new(x, y, z)
    }

    /// Number of samples including the closing one
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; a path holds at least two samples
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn point(&self, index: usize) -> Option<Vector3<f64>> {
        Some(Vector3::new(
            *self.x.get(index)?,
            *self.y.get(index)?,
            *self.z.get(index)?,
        ))
    }

    /// All samples in order, closing sample included
    pub fn points(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| Vector3::new(x, y, z))
    }

    /// Position shown as "now" on the reference date
    ///
    /// This is the closing sample. The window spans one period, so the body is
    /// back at this point on the reference date up to the rounding of the
    /// period to whole days.
    pub fn current_position(&self) -> Vector3<f64> {
        let last = self.len() - 1;
        Vector3::new(self.x[last], self.y[last], self.z[last])
    }

    /// The `count` most recent samples before the closing one, oldest first
    pub fn recent_trace(&self, count: usize) -> impl Iterator<Item = Vector3<f64>> + '_ {
        let end = self.len() - 1;
        let start = end.saturating_sub(count);
        self.points().skip(start).take(end - start)
    }
}

/// Closed orbital paths of all eight planets for one reference date
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitDataset {
    reference_date: NaiveDate,
    /// Indexed by body id - 1
    paths: Vec<OrbitPath>,
}

impl OrbitDataset {
    /// Fetch and assemble every body's path, in body order
    ///
    /// Issues exactly one request per body. The first failure aborts the
    /// build and no partial dataset is returned.
    pub fn build<S: EphemerisSource + ?Sized>(
        reference_date: NaiveDate,
        source: &S,
    ) -> Result<Self> {
        info!("Building orbit dataset for {}", reference_date);

        let mut paths = Vec::with_capacity(Body::ALL.len());
        for body in Body::ALL {
            let query = orbit_query(body, reference_date)?;
            let rows = source.vectors(&query)?;
            debug!(
                "{}: {} rows for {} .. {}",
                body,
                rows.len(),
                query.start,
                query.stop
            );
            paths.push(OrbitPath::from_rows(body, &rows)?);
        }

        Ok(Self {
            reference_date,
            paths,
        })
    }

    /// Like [`OrbitDataset::build`], parsing the date first
    ///
    /// A malformed date fails before any request is made.
    pub fn from_iso_date<S: EphemerisSource + ?Sized>(date: &str, source: &S) -> Result<Self> {
        let reference_date = parse_reference_date(date)?;
        Self::build(reference_date, source)
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn path(&self, body: Body) -> &OrbitPath {
        &self.paths[usize::from(body.id() - 1)]
    }

    /// Bodies and their paths, Mercury first
    pub fn iter(&self) -> impl Iterator<Item = (Body, &OrbitPath)> {
        Body::ALL.into_iter().zip(self.paths.iter())
    }

    /// Write the dataset as JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let export = DatasetExport {
            reference_date: self.reference_date,
            bodies: self
                .iter()
                .map(|(body, path)| BodyExport {
                    id: body.id(),
                    name: body.name(),
                    x: path.x(),
                    y: path.y(),
                    z: path.z(),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(writer, &export)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct DatasetExport<'a> {
    reference_date: NaiveDate,
    bodies: Vec<BodyExport<'a>>,
}

#[derive(Serialize)]
struct BodyExport<'a> {
    id: u8,
    name: &'static str,
    x: &'a [f64],
    y: &'a [f64],
    z: &'a [f64],
}
