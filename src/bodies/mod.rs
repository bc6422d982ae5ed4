//! The eight planets and their fixed orbital constants
//!
//! Constants live in a single immutable table indexed by body id, so fetch and
//! projection code never carries planet literals of its own.

use std::fmt;

/// Orbital constants for one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyParams {
    /// Semi-major axis in AU
    pub semi_major_axis_au: f64,
    /// Orbital period in whole days
    pub period_days: u32,
    /// Days between consecutive ephemeris samples
    pub step_days: u32,
}

impl BodyParams {
    /// Number of samples covering one orbit, `floor(period / step)`
    pub const fn sample_count(&self) -> usize {
        (self.period_days / self.step_days) as usize
    }
}

/// Constants for Mercury..Neptune, in body id order.
///
/// Inner planets are sampled daily; outer planets every 5 to 30 days so each
/// orbit stays under two thousand samples.
#[rustfmt::skip]
pub const BODY_TABLE: [BodyParams; 8] = [
    BodyParams { semi_major_axis_au: 0.3870321, period_days: 88, step_days: 1 },
    BodyParams { semi_major_axis_au: 0.72326203, period_days: 225, step_days: 1 },
    BodyParams { semi_major_axis_au: 1.0, period_days: 366, step_days: 1 },
    BodyParams { semi_major_axis_au: 1.52406417, period_days: 687, step_days: 1 },
    BodyParams { semi_major_axis_au: 5.2038770, period_days: 4331, step_days: 5 },
    BodyParams { semi_major_axis_au: 9.57219251, period_days: 10747, step_days: 10 },
    BodyParams { semi_major_axis_au: 19.1644385, period_days: 30589, step_days: 20 },
    BodyParams { semi_major_axis_au: 30.18048128, period_days: 59800, step_days: 30 },
];

/// The major planets, ordered by heliocentric distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Body {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Body {
    /// All bodies in id order
    pub const ALL: [Body; 8] = [
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
    ];

    /// Look up a body by its distance rank (1 = Mercury, 8 = Neptune)
    pub fn from_id(id: u8) -> Option<Body> {
        match id {
            1..=8 => Some(Self::ALL[usize::from(id - 1)]),
            _ => None,
        }
    }

    /// Distance rank, also the Horizons command id
    pub fn id(&self) -> u8 {
        *self as u8 + 1
    }

    /// Get the body's name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
        }
    }

    pub fn params(&self) -> &'static BodyParams {
        &BODY_TABLE[*self as usize]
    }

    pub fn sample_count(&self) -> usize {
        self.params().sample_count()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
