//! SVG path geometry for the charts. Pure and deterministic; degenerate inputs
//! (empty series, zero-sum slices, single points) fall back to defined
//! renderings instead of erroring.

use std::f64::consts::PI;

/// Fallback palette, cycled by slice index when a slice carries no color.
pub const DEFAULT_COLORS: [&str; 5] = ["#2563eb", "#10b981", "#f59e0b", "#ef4444", "#7c3aed"];

/// Default pie start angle. Angle 0 points at 12 o'clock, so the first slice
/// starts at 9 o'clock and sweeps clockwise across the top.
pub const PIE_START_ANGLE: f64 = -90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Chart input for one pie wedge.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub value: f64,
    pub color: Option<String>,
    pub label: Option<String>,
}

impl Slice {
    pub fn plain(value: f64, label: impl Into<String>) -> Self {
        Self { value, color: None, label: Some(label.into()) }
    }
}

/// A drawable wedge: closed path data plus its resolved color.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePath {
    pub d: String,
    pub color: String,
    pub label: Option<String>,
}

/// Point on the circle of `r` at `angle_deg` measured clockwise from the
/// 12-o'clock position. Consecutive slices computed with this convention tile
/// without gaps.
pub fn polar_point(cx: f64, cy: f64, r: f64, angle_deg: f64) -> Point {
    let a = (angle_deg - 90.0) * PI / 180.0;
    Point { x: cx + r * a.cos(), y: cy + r * a.sin() }
}

/// Closed pie wedges accumulated clockwise in input order starting at
/// `start_angle`. Input order is significant: it is the tie-break for visually
/// adjacent equal-value slices. Negative values clamp to 0, and a zero-sum
/// input yields zero-sweep slices rather than a division error.
pub fn pie_slices(slices: &[Slice], cx: f64, cy: f64, r: f64, start_angle: f64) -> Vec<SlicePath> {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    let total = if total == 0.0 { 1.0 } else { total };

    let mut angle = start_angle;
    slices
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let portion = s.value.max(0.0) / total;
            let sweep = portion * 360.0;
            let large = if sweep > 180.0 { 1 } else { 0 };
            let start = polar_point(cx, cy, r, angle);
            angle += sweep;
            let end = polar_point(cx, cy, r, angle);
            let d = format!(
                "M {cx} {cy} L {} {} A {r} {r} 0 {large} 1 {} {} Z",
                start.x, start.y, end.x, end.y
            );
            SlicePath {
                d,
                color: s
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLORS[i % DEFAULT_COLORS.len()].to_string()),
                label: s.label.clone(),
            }
        })
        .collect()
}

/// Evenly spaced polyline points for `series`, normalized vertically against
/// the series' own min/max. A flat series sits on the vertical center, a
/// single point lands at x = 0, and an empty series yields no points.
pub fn line_path(series: &[f64], width: f64, height: f64) -> Vec<Point> {
    if series.is_empty() {
        return Vec::new();
    }
    let max = series.iter().cloned().fold(f64::MIN, f64::max);
    let min = series.iter().cloned().fold(f64::MAX, f64::min);
    let step = if series.len() == 1 { 0.0 } else { width / (series.len() - 1) as f64 };

    series
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let y = if max == min {
                height / 2.0
            } else {
                height - ((v - min) / (max - min)) * height
            };
            Point { x: i as f64 * step, y }
        })
        .collect()
}

/// SVG `points` attribute for a polyline.
pub fn polyline_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The [line_path] polyline closed down to the baseline at both ends, forming
/// a fillable region. Reuses the exact polyline points so line and fill never
/// visually diverge.
pub fn area_path(series: &[f64], width: f64, height: f64) -> String {
    let points = line_path(series, width, height);
    if points.is_empty() {
        return String::new();
    }
    format!("M0,{height} L {} L {width},{height} Z", polyline_points(&points))
}
