use anyhow::{anyhow, bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::fmt::Debug;
use std::ops::Range;

use crate::data::Cell;
use crate::dispatch::{RenderOutcome, NO_CHARTS_MESSAGE};
use crate::ir::{
    AxisSide, CartesianChart, ChartBody, ChartDescriptor, Dash, DualAxisChart, GroupedBarChart,
    HeatmapChart, Mark, PieChart, ScatterChart,
};
use crate::layout::GRID_COLUMNS;
use crate::{OutputFormat, RenderOptions};

const FONT: &str = "sans-serif";

/// Draw the whole board (two charts per row) and encode it.
pub fn render_board(outcome: &RenderOutcome, options: &RenderOptions) -> Result<Vec<u8>> {
    let (width, height, buffer_len) = board_size(options, outcome.rows)?;

    match options.format {
        OutputFormat::Png => {
            let mut buffer = vec![0u8; buffer_len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw_board(&root, outcome)?;
                root.present().map_err(draw_err).context("Failed to present drawing")?;
            }

            let mut png_bytes = Vec::new();
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
            Ok(png_bytes)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw_board(&root, outcome)?;
                root.present().map_err(draw_err).context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

/// Board pixel size and the RGB buffer length it needs. Sizes come from user
/// input, so every product is checked.
fn board_size(options: &RenderOptions, rows: usize) -> Result<(u32, u32, usize)> {
    let rows = u32::try_from(rows.max(1)).context("Too many grid rows")?;
    let height = match options.row_height.checked_mul(rows) {
        Some(height) => height,
        None => bail!("board height overflows: {} rows of {} px", rows, options.row_height),
    };
    let buffer_len = (options.width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3));
    match buffer_len {
        Some(len) => Ok((options.width, height, len)),
        None => bail!("board of {} x {} px is too large", options.width, height),
    }
}

fn draw_board<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, outcome: &RenderOutcome) -> Result<()> {
    root.fill(&WHITE).map_err(draw_err)?;

    if outcome.charts.is_empty() {
        let (w, h) = root.dim_in_pixel();
        let style = TextStyle::from((FONT, 20).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(NO_CHARTS_MESSAGE, (w as i32 / 2, h as i32 / 2), style))
            .map_err(draw_err)?;
        return Ok(());
    }

    let cells = root.split_evenly((outcome.rows, GRID_COLUMNS));
    for placed in &outcome.charts {
        let idx = placed.position.row * GRID_COLUMNS + placed.position.col;
        let area = cells
            .get(idx)
            .ok_or_else(|| anyhow!("grid cell {} is outside the board", idx))?;
        draw_chart(area, &placed.descriptor)
            .with_context(|| format!("Failed to draw chart '{}'", placed.descriptor.name))?;
    }
    Ok(())
}

/// Draw one descriptor into its grid cell
pub fn draw_chart<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &ChartDescriptor) -> Result<()> {
    let area = area.margin(8, 8, 8, 8);
    let area = area.titled(&chart.title, (FONT, 18)).map_err(draw_err)?;

    match &chart.body {
        ChartBody::Cartesian(c) => draw_cartesian(&area, c),
        ChartBody::Scatter(s) => draw_scatter(&area, s),
        ChartBody::Pie(p) => draw_pie(&area, p),
        ChartBody::GroupedBar(g) => draw_grouped_bar(&area, g),
        ChartBody::DualAxis(d) => draw_dual_axis(&area, d),
        ChartBody::Heatmap(h) => draw_heatmap(&area, h),
    }
}

// =============================================================================
// Series charts
// =============================================================================

fn draw_cartesian<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, c: &CartesianChart) -> Result<()> {
    let labels: Vec<String> = c.x.iter().map(Cell::label).collect();
    let n = labels.len().max(1);
    let include_zero = matches!(c.mark, Mark::Bar | Mark::Area);
    let y_range = value_range(c.series.iter().flat_map(|s| s.values.iter().flatten().copied()), include_zero);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_range)
        .map_err(draw_err)
        .context("Failed to build chart")?;

    let formatter = category_formatter(&labels);
    chart
        .configure_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&formatter)
        .x_desc(c.x_title.as_str())
        .draw()
        .map_err(draw_err)
        .context("Failed to draw mesh")?;

    let series_count = c.series.len().max(1) as f64;
    let bar_width = 0.8 / series_count;

    for (idx, series) in c.series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        match c.mark {
            Mark::Line => {
                for segment in segments(&series.values) {
                    chart
                        .draw_series(LineSeries::new(segment, color.stroke_width(2)))
                        .map_err(draw_err)?;
                }
            }
            Mark::Area => {
                for segment in segments(&series.values) {
                    chart
                        .draw_series(AreaSeries::new(segment, 0.0, color.mix(0.3)).border_style(color.stroke_width(2)))
                        .map_err(draw_err)?;
                }
            }
            Mark::Bar => {
                let offset = (idx as f64 - (series_count - 1.0) / 2.0) * bar_width;
                let bars = series.values.iter().enumerate().filter_map(|(i, v)| {
                    let x = i as f64 + offset;
                    v.map(|v| Rectangle::new([(x - bar_width / 2.0, 0.0), (x + bar_width / 2.0, v)], color.filled()))
                });
                chart.draw_series(bars).map_err(draw_err)?;
            }
        }
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
            .map_err(draw_err)?
            .label(series.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    Ok(())
}

fn draw_dual_axis<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, d: &DualAxisChart) -> Result<()> {
    let labels: Vec<String> = d.x.iter().map(Cell::label).collect();
    let n = labels.len().max(1);
    let x_range = -0.5..(n as f64 - 0.5);
    let side_range = |axis: AxisSide| value_range(d.side(axis).flat_map(|s| s.values.iter().flatten().copied()), false);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .right_y_label_area_size(55)
        .build_cartesian_2d(x_range.clone(), side_range(AxisSide::Left))
        .map_err(draw_err)
        .context("Failed to build chart")?
        .set_secondary_coord(x_range, side_range(AxisSide::Right));

    let formatter = category_formatter(&labels);
    chart
        .configure_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&formatter)
        .x_desc(d.x_title.as_str())
        .y_desc(d.left_title.as_str())
        .draw()
        .map_err(draw_err)?;
    chart
        .configure_secondary_axes()
        .y_desc(d.right_title.as_str())
        .draw()
        .map_err(draw_err)?;

    for (idx, series) in d.series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let style = color.stroke_width(series.stroke.width.round() as u32);
        for segment in segments(&series.values) {
            match (series.axis, series.stroke.dash) {
                (AxisSide::Left, _) => {
                    chart.draw_series(LineSeries::new(segment, style)).map_err(draw_err)?;
                }
                (AxisSide::Right, Dash::Dashed) => {
                    chart
                        .draw_secondary_series(DashedLineSeries::new(segment, 8, 4, style))
                        .map_err(draw_err)?;
                }
                (AxisSide::Right, Dash::Solid) => {
                    chart.draw_secondary_series(LineSeries::new(segment, style)).map_err(draw_err)?;
                }
            }
        }
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
            .map_err(draw_err)?
            .label(series.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    Ok(())
}

// =============================================================================
// Scatter
// =============================================================================

fn draw_scatter<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, s: &ScatterChart) -> Result<()> {
    // Numeric x values are plotted as-is; anything else falls back to row order
    let numeric_x = s.points.iter().all(|p| !matches!(p.x, Cell::Text(_)));
    let sources = s.sources();
    let rows = if sources.is_empty() { 0 } else { s.points.len() / sources.len() };

    let xy: Vec<(usize, f64, f64)> = s
        .points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let x = if numeric_x { p.x.as_number()? } else { (i % rows.max(1)) as f64 };
            let src = sources.iter().position(|name| *name == p.source)?;
            Some((src, x, p.y?))
        })
        .collect();

    let x_range = value_range(xy.iter().map(|p| p.1), false);
    let y_range = value_range(xy.iter().map(|p| p.2), false);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(s.x_title.as_str())
        .y_desc(s.y_title.as_str())
        .draw()
        .map_err(draw_err)?;

    for (idx, name) in sources.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(
                xy.iter()
                    .filter(|p| p.0 == idx)
                    .map(|p| Circle::new((p.1, p.2), 4, color.filled())),
            )
            .map_err(draw_err)?
            .label(*name)
            .legend(move |(x, y)| Circle::new((x + 6, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    Ok(())
}

// =============================================================================
// Pie
// =============================================================================

fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, p: &PieChart) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let pie_width = w as f64 * 0.6;
    let radius = (pie_width.min(h as f64) / 2.0) * 0.85;
    let center = (pie_width / 2.0, h as f64 / 2.0);

    let drawn: f64 = p.slices.iter().map(|s| s.value.max(0.0)).sum();
    if drawn > 0.0 {
        let mut start = -PI / 2.0;
        for (idx, slice) in p.slices.iter().enumerate() {
            if slice.value <= 0.0 {
                continue;
            }
            let sweep = slice.value / drawn * 2.0 * PI;
            let color = Palette99::pick(idx).to_rgba();
            area.draw(&Polygon::new(wedge(center, radius, start, sweep), color.filled()))
                .map_err(draw_err)?;
            start += sweep;
        }
    }

    let c = (center.0 as i32, center.1 as i32);
    area.draw(&Circle::new(c, (radius * p.hole) as i32, WHITE.filled()))
        .map_err(draw_err)?;
    let centered = TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(p.center_label.as_str(), c, centered))
        .map_err(draw_err)?;

    // Legend to the right of the pie
    let legend_x = pie_width as i32 + 10;
    for (idx, slice) in p.slices.iter().enumerate() {
        let y = 20 + idx as i32 * 20;
        let color = Palette99::pick(idx).to_rgba();
        area.draw(&Rectangle::new([(legend_x, y - 5), (legend_x + 10, y + 5)], color.filled()))
            .map_err(draw_err)?;
        let style = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
        area.draw(&Text::new(slice.label.as_str(), (legend_x + 16, y), style))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Pixel outline of one pie slice, starting and ending at the centre
fn wedge(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / 0.05).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0 as i32, center.1 as i32));
    for step in 0..=steps {
        let angle = start + sweep * step as f64 / steps as f64;
        points.push((
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        ));
    }
    points
}

// =============================================================================
// Grouped bar
// =============================================================================

fn draw_grouped_bar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, g: &GroupedBarChart) -> Result<()> {
    let k = g.categories.len().max(1);
    let y_range = value_range(g.groups.iter().flat_map(|grp| grp.values.iter().flatten().copied()), true);
    // Headroom for the value labels
    let y_range = y_range.start..(y_range.end + (y_range.end - y_range.start) * 0.08);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.5..(k as f64 - 0.5), y_range)
        .map_err(draw_err)
        .context("Failed to build chart")?;

    let formatter = category_formatter(&g.categories);
    chart
        .configure_mesh()
        .x_labels(k.min(12))
        .x_label_formatter(&formatter)
        .x_desc(g.x_title.as_str())
        .y_desc(g.y_title.as_str())
        .draw()
        .map_err(draw_err)?;

    let half = g.bar_width / 2.0;
    let label_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    for group in &g.groups {
        let color = parse_color(&group.color);
        let bars: Vec<(f64, f64)> = group
            .positions
            .iter()
            .zip(&group.values)
            .filter_map(|(&x, v)| v.map(|v| (x, v)))
            .collect();

        chart
            .draw_series(bars.iter().map(|&(x, v)| Rectangle::new([(x - half, 0.0), (x + half, v)], color.filled())))
            .map_err(draw_err)?
            .label(group.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled()));

        let labels = group
            .positions
            .iter()
            .zip(&group.values)
            .zip(&group.labels)
            .filter_map(|((&x, v), label)| v.map(|v| Text::new(label.clone(), (x, v), label_style.clone())));
        chart.draw_series(labels).map_err(draw_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    Ok(())
}

// =============================================================================
// Heatmap
// =============================================================================

fn draw_heatmap<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, h: &HeatmapChart) -> Result<()> {
    const LEFT: i32 = 130;
    const TOP: i32 = 5;
    const BOTTOM: i32 = 50;

    let k = h.labels.len().max(1) as i32;
    let (w, ht) = area.dim_in_pixel();
    let side = ((w as i32 - LEFT - 10).min(ht as i32 - TOP - BOTTOM)).max(k);
    let cell = side / k;

    let value_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    for (i, row) in h.matrix.iter().enumerate() {
        let y0 = TOP + i as i32 * cell;
        for (j, r) in row.iter().enumerate() {
            let x0 = LEFT + j as i32 * cell;
            let fill = match r {
                Some(r) => diverging_color(*r, h.color_range),
                None => RGBColor(220, 220, 220),
            };
            area.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], fill.filled()))
                .map_err(draw_err)?;
            let label = h.cell_labels.get(i).and_then(|row| row.get(j)).cloned().unwrap_or_default();
            area.draw(&Text::new(label, (x0 + cell / 2, y0 + cell / 2), value_style.clone()))
                .map_err(draw_err)?;
        }
    }

    // Row labels on the left, column labels underneath, row 0 at the top
    let row_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Right, VPos::Center));
    let col_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for (idx, label) in h.labels.iter().enumerate() {
        let offset = idx as i32 * cell + cell / 2;
        area.draw(&Text::new(label.as_str(), (LEFT - 6, TOP + offset), row_style.clone()))
            .map_err(draw_err)?;
        area.draw(&Text::new(label.as_str(), (LEFT + offset, TOP + k * cell + 6), col_style.clone()))
            .map_err(draw_err)?;
    }
    let title_style = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(h.axis_title.as_str(), (LEFT + k * cell / 2, TOP + k * cell + 26), title_style))
        .map_err(draw_err)?;
    Ok(())
}

/// RdBu diverging scale over a fixed range: low end red, midpoint near
/// white, high end blue. Values outside the range are clamped.
pub fn diverging_color(value: f64, range: (f64, f64)) -> RGBColor {
    const RED: (f64, f64, f64) = (178.0, 24.0, 43.0);
    const MID: (f64, f64, f64) = (247.0, 247.0, 247.0);
    const BLUE: (f64, f64, f64) = (33.0, 102.0, 172.0);

    let (lo, hi) = range;
    let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 };
    let (from, to, f) = if t < 0.5 { (RED, MID, t * 2.0) } else { (MID, BLUE, (t - 0.5) * 2.0) };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

// =============================================================================
// Helpers
// =============================================================================

fn draw_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow!("drawing failed: {:?}", e)
}

/// Axis range over the finite values with 5% padding; a flat series gets ±1.
fn value_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Split a gappy series into runs of consecutive (row index, value) points
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Tick label for a category index; ticks between categories stay blank
fn category_formatter(labels: &[String]) -> impl Fn(&f64) -> String + '_ {
    move |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// Parse a named colour or `#rrggbb`
fn parse_color(color: &str) -> RGBColor {
    match color {
        "red" => RED,
        "green" => GREEN,
        "blue" => BLUE,
        "black" => BLACK,
        "orange" => RGBColor(255, 165, 0),
        hex if hex.len() == 7 && hex.starts_with('#') => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            match (channel(1), channel(3), channel(5)) {
                (Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
                _ => BLUE,
            }
        }
        _ => BLUE,
    }
}
