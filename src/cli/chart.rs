//! Assembles the SVG documents the dashboard charts are made of and writes
//! them to disk. Markup mirrors what the charts look like in a browser: white
//! slice strokes, a donut hole at half radius, and a translucent fill under
//! the trend line.

use std::{fs, path::Path};

use anyhow::Result;

use crate::{
    aggregate::{Bucket, WEEKDAY_LABELS},
    geometry::{area_path, line_path, pie_slices, polyline_points, Slice, PIE_START_ANGLE},
    metrics::MetricsSnapshot,
    store::{kv::KvStore, session_store::SessionStore},
    utils::clock::{Clock, DefaultClock},
};

const TREND_WIDTH: f64 = 680.0;
const TREND_HEIGHT: f64 = 220.0;
const PIE_SIZE: f64 = 120.0;
const ACCENT_COLOR: &str = "#2563eb";

pub fn process_chart_command<S: KvStore>(store: &SessionStore<S>, out: &Path) -> Result<()> {
    let snapshot = MetricsSnapshot::from_store(store, DefaultClock.time())?;
    fs::create_dir_all(out)?;

    fs::write(
        out.join("trend.svg"),
        area_chart_svg(&snapshot.trend_hours, TREND_WIDTH, TREND_HEIGHT, ACCENT_COLOR),
    )?;
    fs::write(
        out.join("leaves.svg"),
        pie_chart_svg(&buckets_to_slices(&snapshot.leaves_by_status), PIE_SIZE),
    )?;
    fs::write(
        out.join("claims.svg"),
        pie_chart_svg(&buckets_to_slices(&snapshot.claims_by_status), PIE_SIZE),
    )?;

    let weekday_slices: Vec<Slice> = snapshot
        .weekday_counts
        .iter()
        .zip(WEEKDAY_LABELS)
        .map(|(count, label)| Slice::plain(*count as f64, label))
        .collect();
    fs::write(out.join("weekdays.svg"), pie_chart_svg(&weekday_slices, PIE_SIZE))?;

    println!("Wrote trend.svg, leaves.svg, claims.svg, weekdays.svg into {out:?}");
    Ok(())
}

fn buckets_to_slices(buckets: &[Bucket]) -> Vec<Slice> {
    buckets
        .iter()
        .map(|b| Slice::plain(b.value, b.label.clone()))
        .collect()
}

fn pie_chart_svg(slices: &[Slice], size: f64) -> String {
    let cx = size / 2.0;
    let cy = size / 2.0;
    let r = size / 2.0 - 6.0;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    for path in pie_slices(slices, cx, cy, r, PIE_START_ANGLE) {
        svg.push_str(&format!(
            r##"<path d="{}" fill="{}" stroke="#fff" stroke-width="1"/>"##,
            path.d, path.color
        ));
    }
    // donut hole
    svg.push_str(&format!(
        r##"<circle cx="{cx}" cy="{cy}" r="{}" fill="#fff"/></svg>"##,
        r * 0.5
    ));
    svg
}

fn area_chart_svg(series: &[f64], width: f64, height: f64, color: &str) -> String {
    let points = line_path(series, width, height);
    if points.is_empty() {
        return format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"></svg>"#
        );
    }

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" preserveAspectRatio="none">"#,
            r#"<path d="{area}" fill="{color}22" stroke="none"/>"#,
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{points}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            "</svg>"
        ),
        w = width,
        h = height,
        area = area_path(series, width, height),
        color = color,
        points = polyline_points(&points),
    )
}

#[cfg(test)]
mod tests {
    use crate::geometry::Slice;

    use super::{area_chart_svg, pie_chart_svg};

    #[test]
    fn pie_svg_has_donut_hole_and_stroked_slices() {
        let svg = pie_chart_svg(&[Slice::plain(1.0, "a"), Slice::plain(1.0, "b")], 120.0);

        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="120""#));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains(r##"stroke="#fff""##));
        assert!(svg.contains(r##"<circle cx="60" cy="60" r="27" fill="#fff"/>"##));
    }

    #[test]
    fn area_svg_fills_under_the_line() {
        let svg = area_chart_svg(&[1.0, 2.0, 1.0], 680.0, 220.0, "#2563eb");

        assert!(svg.contains(r#"preserveAspectRatio="none""#));
        assert!(svg.contains(r##"fill="#2563eb22""##));
        assert!(svg.contains(r##"<polyline fill="none" stroke="#2563eb""##));
        assert!(svg.contains("M0,220 L "));
    }

    #[test]
    fn empty_series_renders_empty_canvas() {
        let svg = area_chart_svg(&[], 680.0, 220.0, "#2563eb");
        assert_eq!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="680" height="220"></svg>"#
        );
    }
}
