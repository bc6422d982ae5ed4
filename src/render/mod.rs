//! Figure rendering for an [`OrbitDataset`]
//!
//! Orbits are drawn in an inclined projection: the ecliptic plane is tilted
//! away from the viewer by the configured inclination, so a point
//! `(x, y, z)` lands at `u = x`, `v = y cos(i) + z sin(i)`. Each orbit is
//! divided by `a^k` (semi-major axis to the scale power) so the inner planets
//! stay visible next to Neptune.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use log::info;
use nalgebra::{Matrix2x3, Vector2, Vector3};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::bodies::Body;
use crate::orbit::OrbitDataset;
use crate::{OrreryError, Result};

/// Longest recent-trace highlight, in samples
const MAX_TRACE: usize = 50;

/// Numeric settings of the figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotConfig {
    /// Tilt of the ecliptic away from the viewer, 0 (face on) to 90 (edge on)
    pub inclination_deg: f64,
    /// Exponent `k` of the radius scaling `a^k`; 1 keeps distances linear
    pub scale_power: f64,
    /// Figure width in inches; the height is two thirds of it
    pub fig_width_in: f64,
    pub dpi: u32,
    /// Half-width of the view in AU before scaling
    pub extent_au: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            inclination_deg: 55.0,
            scale_power: 0.2,
            fig_width_in: 9.0,
            dpi: 100,
            extent_au: 31.0,
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=90.0).contains(&self.inclination_deg) {
            return Err(OrreryError::InvalidConfig(format!(
                "inclination must be within [0, 90] degrees, got {}",
                self.inclination_deg
            )));
        }
        if !(self.scale_power.is_finite() && self.scale_power > 0.0) {
            return Err(OrreryError::InvalidConfig(format!(
                "scale power must be positive, got {}",
                self.scale_power
            )));
        }
        if !(self.extent_au.is_finite() && self.extent_au > 0.0) {
            return Err(OrreryError::InvalidConfig(format!(
                "extent must be positive, got {}",
                self.extent_au
            )));
        }
        let (width, height) = self.pixel_size();
        if width == 0 || height == 0 || !self.fig_width_in.is_finite() {
            return Err(OrreryError::InvalidConfig(format!(
                "figure of {} in at {} dpi has no pixels",
                self.fig_width_in, self.dpi
            )));
        }
        Ok(())
    }

    /// Figure size in pixels, width by height
    pub fn pixel_size(&self) -> (u32, u32) {
        let width = (self.fig_width_in * f64::from(self.dpi)).round().max(0.0) as u32;
        let height = (f64::from(width) * 2.0 / 3.0).round() as u32;
        (width, height)
    }

    /// Visible `u` and `v` ranges, widened on one axis so both use one scale
    pub fn view_bounds(&self) -> ((f64, f64), (f64, f64)) {
        let outer = radius_scale(Body::Neptune, self.scale_power);
        let mut half_u = self.extent_au / outer;
        let mut half_v = half_u * self.inclination_deg.to_radians().cos();

        let (width, height) = self.pixel_size();
        let aspect = f64::from(height) / f64::from(width);
        if half_v < half_u * aspect {
            half_v = half_u * aspect;
        } else {
            half_u = half_v / aspect;
        }

        ((-half_u, half_u), (-half_v, half_v))
    }
}

/// Image formats the renderer can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!("unsupported output format {:?} (expected svg or png)", other)),
        }
    }
}

/// `a^k` for the body's semi-major axis `a`
pub fn radius_scale(body: Body, scale_power: f64) -> f64 {
    body.params().semi_major_axis_au.powf(scale_power)
}

/// Inclined orthographic projection onto the figure plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    matrix: Matrix2x3<f64>,
}

impl Projection {
    pub fn new(inclination_deg: f64) -> Self {
        let (sin, cos) = inclination_deg.to_radians().sin_cos();
        Self {
            matrix: Matrix2x3::new(1.0, 0.0, 0.0, 0.0, cos, sin),
        }
    }

    /// Project a position and divide it by the radius scale
    pub fn project(&self, position: &Vector3<f64>, scale: f64) -> (f64, f64) {
        let uv: Vector2<f64> = self.matrix * position / scale;
        (uv.x, uv.y)
    }
}

/// Deterministic file name for a reference date
pub fn output_file_name(reference_date: NaiveDate, format: OutputFormat) -> String {
    format!(
        "SolarSystem_{}.{}",
        reference_date.format("%Y-%m-%d"),
        format.extension()
    )
}

fn render_err<E: fmt::Display>(e: E) -> OrreryError {
    OrreryError::Render(e.to_string())
}

/// Draw orbits, recent traces and current positions onto `root`
pub fn draw<DB: DrawingBackend>(
    dataset: &OrbitDataset,
    config: &PlotConfig,
    root: &DrawingArea<DB, Shift>,
) -> Result<()> {
    config.validate()?;
    root.fill(&WHITE).map_err(render_err)?;

    let ((u_min, u_max), (v_min, v_max)) = config.view_bounds();
    let mut chart = ChartBuilder::on(root)
        .build_cartesian_2d(u_min..u_max, v_min..v_max)
        .map_err(render_err)?;

    let projection = Projection::new(config.inclination_deg);
    let projected = |body: Body, p: Vector3<f64>| {
        projection.project(&p, radius_scale(body, config.scale_power))
    };

    // Full orbits
    for (body, path) in dataset.iter() {
        chart
            .draw_series(LineSeries::new(
                path.points().map(|p| projected(body, p)),
                BLACK.mix(0.2).stroke_width(1),
            ))
            .map_err(render_err)?;
    }

    // Recent traces
    for (body, path) in dataset.iter() {
        let count = (path.len() / 10).min(MAX_TRACE);
        let trace: Vec<(f64, f64)> = path
            .recent_trace(count)
            .map(|p| projected(body, p))
            .collect();
        chart
            .draw_series(DashedLineSeries::new(
                trace,
                4,
                3,
                BLACK.mix(0.7).stroke_width(1),
            ))
            .map_err(render_err)?;
    }

    // Positions on the reference date
    for (body, path) in dataset.iter() {
        let current = projected(body, path.current_position());
        chart
            .draw_series(std::iter::once(Circle::new(current, 3, BLACK.filled())))
            .map_err(render_err)?;
    }

    Ok(())
}

/// Render the dataset into `dir`, returning the written file's path
pub fn render_to_file<P: AsRef<Path>>(
    dataset: &OrbitDataset,
    config: &PlotConfig,
    dir: P,
    format: OutputFormat,
) -> Result<PathBuf> {
    config.validate()?;
    fs::create_dir_all(dir.as_ref())?;

    let path = dir
        .as_ref()
        .join(output_file_name(dataset.reference_date(), format));
    let size = config.pixel_size();

    match format {
        OutputFormat::Svg => {
            let root = SVGBackend::new(&path, size).into_drawing_area();
            draw(dataset, config, &root)?;
            root.present().map_err(render_err)?;
        }
        OutputFormat::Png => {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            draw(dataset, config, &root)?;
            root.present().map_err(render_err)?;
        }
    }

    info!("Wrote {}", path.display());
    Ok(path)
}
