//! Rule graph rendering using Plotters

use crate::graph::RuleGraph;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;
use tracing::info;

const IMAGE_SIZE: (u32, u32) = (1200, 1000);
const CHART_TITLE: &str = "Association rules link graph (by confidence)";

const NODE_COLOR: RGBColor = RGBColor(135, 206, 235);
const NODE_LABEL_COLOR: RGBColor = RGBColor(128, 0, 128);
/// Ends of the edge colour ramp, low to high confidence
const EDGE_COLOR_LOW: RGBColor = RGBColor(198, 219, 239);
const EDGE_COLOR_HIGH: RGBColor = RGBColor(8, 48, 107);

/// Spring layout parameters
const LAYOUT_K: f64 = 0.3;
const LAYOUT_ITERATIONS: usize = 100;
const LAYOUT_SCALE: f64 = 20.0;

/// Render the rule graph to an image file
///
/// # Arguments
/// * `graph` - Rule graph with node size hints
/// * `output_path` - Destination; `.svg` writes SVG, anything else PNG
///
/// # Returns
/// * Result indicating success or failure
pub fn render_rule_graph(graph: &RuleGraph, output_path: &str) -> crate::Result<()> {
    let is_svg = Path::new(output_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        let root = SVGBackend::new(output_path, IMAGE_SIZE).into_drawing_area();
        draw_rule_graph(&root, graph)?;
    } else {
        let root = BitMapBackend::new(output_path, IMAGE_SIZE).into_drawing_area();
        draw_rule_graph(&root, graph)?;
    }

    info!(path = output_path, "rule graph saved");
    Ok(())
}

fn draw_rule_graph<DB>(root: &DrawingArea<DB, Shift>, graph: &RuleGraph) -> crate::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let labels: Vec<&str> = graph.labels().collect();
    let position_of: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| (label, i))
        .collect();
    let edges: Vec<(usize, usize, f64)> = graph
        .edges()
        .filter_map(|(source, target, edge)| {
            Some((*position_of.get(source)?, *position_of.get(target)?, edge.confidence))
        })
        .collect();
    let links: Vec<(usize, usize)> = edges.iter().map(|&(s, t, _)| (s, t)).collect();
    let positions = spring_layout(labels.len(), &links, LAYOUT_K, LAYOUT_ITERATIONS, LAYOUT_SCALE);

    let extent = LAYOUT_SCALE * 1.15;
    let mut chart = ChartBuilder::on(root)
        .caption(CHART_TITLE, ("sans-serif", 24))
        .margin(20)
        .build_cartesian_2d(-extent..extent, -extent..extent)?;

    // rough conversion from pixel radii to layout units for arrow placement
    let units_per_pixel = 2.0 * extent / (IMAGE_SIZE.1 as f64 * 0.85);

    for &(source, target, confidence) in &edges {
        let from = positions[source];
        let to = positions[target];
        let color = confidence_color(confidence);

        chart.draw_series(std::iter::once(PathElement::new(
            vec![from, to],
            color.stroke_width(2),
        )))?;

        let target_radius = graph
            .node_size(labels[target])
            .map(node_radius)
            .unwrap_or(0) as f64;
        if let Some(head) = arrow_head(from, to, target_radius * units_per_pixel, 0.6, 0.25) {
            chart.draw_series(std::iter::once(Polygon::new(head, color.filled())))?;
        }

        let middle = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        chart.draw_series(std::iter::once(Text::new(
            format!("{confidence:.2}"),
            middle,
            ("sans-serif", 11).into_font().color(&RED),
        )))?;
    }

    for (i, &label) in labels.iter().enumerate() {
        let radius = graph.node_size(label).map(node_radius).unwrap_or(4);
        chart.draw_series(std::iter::once(Circle::new(
            positions[i],
            radius,
            NODE_COLOR.filled(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            label.to_string(),
            positions[i],
            ("sans-serif", 13).into_font().color(&NODE_LABEL_COLOR),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Pixel radius of a node whose size hint is an area, as in scatter plots
fn node_radius(size: f64) -> i32 {
    (size.max(0.0) / PI).sqrt().round() as i32
}

/// Colour on a light-to-dark blue ramp for a confidence in [0, 1]
fn confidence_color(confidence: f64) -> RGBColor {
    let t = confidence.clamp(0.0, 1.0);
    let mix = |low: u8, high: u8| (low as f64 + (high as f64 - low as f64) * t).round() as u8;
    RGBColor(
        mix(EDGE_COLOR_LOW.0, EDGE_COLOR_HIGH.0),
        mix(EDGE_COLOR_LOW.1, EDGE_COLOR_HIGH.1),
        mix(EDGE_COLOR_LOW.2, EDGE_COLOR_HIGH.2),
    )
}

/// Triangle pointing from `from` to `to`, stopping `gap` short of `to`
fn arrow_head(
    from: (f64, f64),
    to: (f64, f64),
    gap: f64,
    length: f64,
    half_width: f64,
) -> Option<Vec<(f64, f64)>> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= gap + length {
        return None;
    }
    let (ux, uy) = (dx / distance, dy / distance);
    let tip = (to.0 - ux * gap, to.1 - uy * gap);
    let base = (tip.0 - ux * length, tip.1 - uy * length);
    Some(vec![
        tip,
        (base.0 - uy * half_width, base.1 + ux * half_width),
        (base.0 + uy * half_width, base.1 - ux * half_width),
    ])
}

/// Deterministic force-directed layout.
///
/// Nodes start evenly spaced on the unit circle; each iteration applies
/// repulsion `k²/d` between all pairs and attraction `d²/k` along links,
/// with a linearly cooling step. The result is centred and scaled so the
/// farthest node sits at distance `scale` on one axis.
pub fn spring_layout(
    n: usize,
    links: &[(usize, usize)],
    k: f64,
    iterations: usize,
    scale: f64,
) -> Vec<(f64, f64)> {
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        _ => {}
    }

    let mut adjacent = vec![vec![false; n]; n];
    for &(a, b) in links {
        if a < n && b < n && a != b {
            adjacent[a][b] = true;
            adjacent[b][a] = true;
        }
    }

    let mut positions: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect();

    let mut temperature = 0.2;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![(0.0f64, 0.0f64); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = positions[i].0 - positions[j].0;
                let dy = positions[i].1 - positions[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);
                let mut force = k * k / (distance * distance);
                if adjacent[i][j] {
                    force -= distance / k;
                }
                displacement[i].0 += dx * force;
                displacement[i].1 += dy * force;
            }
        }
        for (position, (dx, dy)) in positions.iter_mut().zip(displacement) {
            let length = (dx * dx + dy * dy).sqrt().max(0.01);
            position.0 += dx * temperature / length;
            position.1 += dy * temperature / length;
        }
        temperature -= cooling;
    }

    let (cx, cy) = positions
        .iter()
        .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    let (cx, cy) = (cx / n as f64, cy / n as f64);
    let limit = positions
        .iter()
        .map(|p| (p.0 - cx).abs().max((p.1 - cy).abs()))
        .fold(0.0, f64::max);
    let factor = if limit > 0.0 { scale / limit } else { 0.0 };

    positions
        .into_iter()
        .map(|(x, y)| ((x - cx) * factor, (y - cy) * factor))
        .collect()
}
