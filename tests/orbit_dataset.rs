//! End-to-end checks of dataset assembly against scripted ephemeris sources

use std::cell::RefCell;

use chrono::NaiveDate;
use orrery::horizons::{EphemerisQuery, EphemerisSource, VectorRow};
use orrery::{Body, OrbitDataset, OrreryError, Result};
use rstest::rstest;

/// Answers every query with `sample_count + extra` synthetic rows and records it
struct ScriptedSource {
    extra: i64,
    short_body: Option<Body>,
    fail_body: Option<Body>,
    queries: RefCell<Vec<EphemerisQuery>>,
}

impl ScriptedSource {
    fn with_extra(extra: i64) -> Self {
        Self {
            extra,
            short_body: None,
            fail_body: None,
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl EphemerisSource for ScriptedSource {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        self.queries.borrow_mut().push(*query);

        if self.fail_body == Some(query.body) {
            return Err(OrreryError::DataSourceUnavailable {
                body: query.body,
                reason: "connection reset".to_string(),
            });
        }

        let mut count = query.body.sample_count() as i64 + self.extra;
        if self.short_body == Some(query.body) {
            count = query.body.sample_count() as i64 - 1;
        }

        let a = query.body.params().semi_major_axis_au;
        Ok((0..count.max(0))
            .map(|i| {
                let theta = 0.0137 * i as f64 * f64::from(query.body.id());
                VectorRow {
                    jd_tdb: 2460000.5 + (i * i64::from(query.step_days)) as f64,
                    x: a * theta.cos(),
                    y: a * theta.sin(),
                    z: 0.02 * a * theta.sin(),
                }
            })
            .collect())
    }
}

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, 10).unwrap()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
fn test_lengths_and_closure(#[case] extra: i64) {
    let source = ScriptedSource::with_extra(extra);
    let dataset = OrbitDataset::build(reference(), &source).unwrap();

    for (body, path) in dataset.iter() {
        let n = body.sample_count();
        assert_eq!(path.x().len(), n + 1, "{}", body);
        assert_eq!(path.y().len(), n + 1, "{}", body);
        assert_eq!(path.z().len(), n + 1, "{}", body);
        assert_eq!(path.x()[0], path.x()[n], "{}", body);
        assert_eq!(path.y()[0], path.y()[n], "{}", body);
        assert_eq!(path.z()[0], path.z()[n], "{}", body);
    }
}

#[test]
fn test_extra_rows_are_ignored() {
    let exact = OrbitDataset::build(reference(), &ScriptedSource::with_extra(0)).unwrap();
    let padded = OrbitDataset::build(reference(), &ScriptedSource::with_extra(5)).unwrap();
    assert_eq!(exact, padded);
}

#[test]
fn test_one_request_per_body_in_order() {
    let source = ScriptedSource::with_extra(1);
    OrbitDataset::build(reference(), &source).unwrap();

    let queries = source.queries.borrow();
    assert_eq!(queries.len(), 8);
    for (query, body) in queries.iter().zip(Body::ALL) {
        assert_eq!(query.body, body);
        assert_eq!(query.stop, reference());
        assert_eq!(query.step_days, body.params().step_days);
        assert_eq!(
            (query.stop - query.start).num_days(),
            i64::from(body.params().period_days)
        );
    }
    assert_eq!(queries[0].start, NaiveDate::from_ymd_opt(2023, 7, 14).unwrap());
}

#[rstest]
#[case(Body::Mercury)]
#[case(Body::Saturn)]
#[case(Body::Neptune)]
fn test_shortfall_names_body(#[case] body: Body) {
    let source = ScriptedSource {
        short_body: Some(body),
        ..ScriptedSource::with_extra(1)
    };

    match OrbitDataset::build(reference(), &source) {
        Err(err @ OrreryError::InsufficientData { .. }) => {
            let msg = err.to_string();
            assert!(msg.contains(&format!("body {}", body.id())), "{}", msg);
            if let OrreryError::InsufficientData {
                body: reported,
                expected,
                received,
            } = err
            {
                assert_eq!(reported, body);
                assert_eq!(expected, body.sample_count());
                assert_eq!(received, body.sample_count() - 1);
            }
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_source_failure_aborts_build() {
    let source = ScriptedSource {
        fail_body: Some(Body::Mars),
        ..ScriptedSource::with_extra(1)
    };

    assert!(matches!(
        OrbitDataset::build(reference(), &source),
        Err(OrreryError::DataSourceUnavailable { body: Body::Mars, .. })
    ));
    // Nothing after the failing body is requested
    assert_eq!(source.queries.borrow().len(), 4);
}

#[test]
fn test_invalid_date_makes_no_requests() {
    let source = ScriptedSource::with_extra(1);
    assert!(matches!(
        OrbitDataset::from_iso_date("2023-10-32", &source),
        Err(OrreryError::InvalidDate(_))
    ));
    assert!(source.queries.borrow().is_empty());
}

#[test]
fn test_repeated_builds_are_bit_identical() {
    let first = OrbitDataset::build(reference(), &ScriptedSource::with_extra(1)).unwrap();
    let second = OrbitDataset::build(reference(), &ScriptedSource::with_extra(1)).unwrap();

    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        for (lhs, rhs) in [(a.x(), b.x()), (a.y(), b.y()), (a.z(), b.z())] {
            let lhs: Vec<u64> = lhs.iter().map(|v| v.to_bits()).collect();
            let rhs: Vec<u64> = rhs.iter().map(|v| v.to_bits()).collect();
            assert_eq!(lhs, rhs);
        }
    }
}
