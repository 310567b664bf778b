#![cfg(feature = "web")]
use crate::error::{LedgerError, Result};
use crate::ledger::{BalancePoint, Breakdown, Ledger};
use chrono::{Duration, NaiveDate};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use plotters::prelude::*;

/// Charts the dashboard can draw from the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    /// Step area chart of the projected balance over time
    Balance,

    /// Expenses per category, as bars
    Categories,

    /// Expenses per responsible party, as bars
    Payers,
}

impl ChartKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_end_matches(".png") {
            "balance" => Some(ChartKind::Balance),
            "categories" => Some(ChartKind::Categories),
            "payers" => Some(ChartKind::Payers),
            _ => None,
        }
    }
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Saldo proyectado".to_string(),
            x_label: "Fecha".to_string(),
            y_label: "Monto".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl GraphOptions {
    pub fn for_kind(kind: ChartKind) -> Self {
        let (title, x_label) = match kind {
            ChartKind::Balance => ("Saldo proyectado", "Fecha"),
            ChartKind::Categories => ("Gasto por categoría", "Categoría"),
            ChartKind::Payers => ("Gasto por responsable", "Responsable"),
        };
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            ..Self::default()
        }
    }
}

/// Renders one of the dashboard charts as PNG bytes
///
/// # Arguments
/// * `ledger` - Entries to chart
/// * `base_balance` - Starting funds for the balance trajectory
/// * `kind` - Which chart to draw
/// * `options` - Size and labels
///
/// # Errors
/// * `LedgerError::Chart` when there is nothing to draw or plotting fails
pub fn render_chart(
    ledger: &Ledger,
    base_balance: f64,
    kind: ChartKind,
    options: &GraphOptions,
) -> Result<Vec<u8>> {
    match kind {
        ChartKind::Balance => balance_chart(&ledger.projected_balance(base_balance), options),
        ChartKind::Categories => breakdown_chart(&ledger.category_breakdown(), options),
        ChartKind::Payers => breakdown_chart(&ledger.payer_breakdown(), options),
    }
}

/// Step ("hv") area chart of the projected balance, one marker per day.
pub fn balance_chart(points: &[BalancePoint], options: &GraphOptions) -> Result<Vec<u8>> {
    let first = points
        .first()
        .map(|p| p.date)
        .ok_or_else(|| LedgerError::Chart("no data".to_string()))?;

    let data: Vec<(f64, f64)> = points
        .iter()
        .map(|p| ((p.date - first).num_days() as f64, p.balance))
        .collect();

    render_png(options, |root| draw_balance(root, &data, first, options))
}

/// Bar chart of a category or payer breakdown.
pub fn breakdown_chart(items: &[Breakdown], options: &GraphOptions) -> Result<Vec<u8>> {
    if items.is_empty() {
        return Err(LedgerError::Chart("no data".to_string()));
    }
    render_png(options, |root| draw_breakdown(root, items, options))
}

/// Points of a horizontal-then-vertical step line through `data`
///
/// Each value holds until the next x, where the line jumps. Expects `data`
/// sorted by x.
pub fn step_points(data: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut steps = Vec::with_capacity(data.len() * 2);
    for (i, &(x, y)) in data.iter().enumerate() {
        if i > 0 {
            steps.push((x, data[i - 1].1));
        }
        steps.push((x, y));
    }
    steps
}

type Root<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

// Draws into an in-memory RGB buffer and encodes it as PNG.
fn render_png<F>(options: &GraphOptions, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&Root<'_>) -> std::result::Result<(), Box<dyn std::error::Error>>,
{
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw(&root).map_err(|e| LedgerError::Chart(e.to_string()))?;
        root.present()
            .map_err(|e| LedgerError::Chart(e.to_string()))?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, image::ColorType::Rgb8)
        .map_err(|e| LedgerError::Chart(e.to_string()))?;
    Ok(png)
}

fn draw_balance(
    root: &Root<'_>,
    data: &[(f64, f64)],
    first: NaiveDate,
    options: &GraphOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    root.fill(&WHITE)?;

    let max_x = data.iter().map(|(x, _)| *x).fold(0.0, f64::max);
    let min_y = data.iter().map(|(_, y)| *y).fold(0.0, f64::min); // Ensure we include 0
    let max_y = data.iter().map(|(_, y)| *y).fold(f64::MIN, f64::max);
    let pad = ((max_y - min_y).abs() * 0.05).max(1.0);

    let x_range = -0.5..max_x + 0.5;
    let y_range = min_y..max_y + pad;

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    let day_label = |x: &f64| {
        (first + Duration::days(x.round() as i64))
            .format("%d/%m")
            .to_string()
    };
    chart
        .configure_mesh()
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .x_label_formatter(&day_label)
        .y_label_formatter(&|y: &f64| format!("${:.0}", y))
        .draw()?;

    let line = RGBColor(255, 87, 51);
    chart.draw_series(
        AreaSeries::new(step_points(data), min_y, line.mix(0.2)).border_style(line),
    )?;
    chart.draw_series(
        data.iter()
            .map(|&(x, y)| Circle::new((x, y), 4, line.filled())),
    )?;

    Ok(())
}

fn draw_breakdown(
    root: &Root<'_>,
    items: &[Breakdown],
    options: &GraphOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    root.fill(&WHITE)?;

    let n = items.len() as i32;
    let max_y = items.iter().map(|b| b.amount).fold(0.0, f64::max);
    let min_y = items.iter().map(|b| b.amount).fold(0.0, f64::min);
    let pad = ((max_y - min_y).abs() * 0.1).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), min_y..max_y + pad)?;

    let label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => items
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(items.len())
        .x_label_formatter(&label)
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .y_label_formatter(&|y: &f64| format!("${:.0}", y))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(RGBColor(30, 144, 255).filled())
            .margin(10)
            .data(items.iter().enumerate().map(|(i, b)| (i as i32, b.amount))),
    )?;

    Ok(())
}
