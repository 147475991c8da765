//! Text rendering of the dashboard: metric cards with a 24-hour area chart.

use std::collections::HashSet;

use crossterm::style::{Color, Stylize};
use dashboard_core::{ForecastBundle, HourlySample, LocationCandidate, Metric, Theme};

/// Terminal columns per hourly sample.
const COLUMN_WIDTH: usize = 2;
/// Chart rows.
const CHART_HEIGHT: usize = 5;
/// An hour label is drawn every this many samples.
const LABEL_EVERY: usize = 6;

const EIGHTHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Which cards are expanded. Each card is an independent last-write-wins toggle.
#[derive(Debug, Clone, Default)]
pub struct Cards {
    open: HashSet<Metric>,
}

impl Cards {
    pub fn is_open(&self, metric: Metric) -> bool {
        self.open.contains(&metric)
    }

    /// Flip a card and return whether it is now open.
    pub fn toggle(&mut self, metric: Metric) -> bool {
        if !self.open.remove(&metric) {
            self.open.insert(metric);
        }
        self.is_open(metric)
    }

    pub fn open(&mut self, metric: Metric) {
        self.open.insert(metric);
    }
}

/// Value with the unit suffix, the way each card header shows it.
pub fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        // Probabilities come as whole percentages.
        Metric::Precipitation => format!("{value}{}", metric.unit()),
        _ => format!("{value:.1}{}", metric.unit()),
    }
}

fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

fn paint(text: String, hex: &str) -> String {
    match hex_color(hex) {
        Some(color) => text.with(color).to_string(),
        None => text,
    }
}

/// Rows of a filled area chart, top row first.
///
/// Values are scaled between the series minimum and maximum; a flat series
/// sits at half height.
pub fn area_chart(values: &[f64], height: usize) -> Vec<String> {
    if values.is_empty() || height == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let full = (height * 8) as f64;

    let levels: Vec<usize> = values
        .iter()
        .map(|v| {
            let ratio = if span > 0.0 { (v - min) / span } else { 0.5 };
            // Keep at least a sliver so the lowest hour is still visible.
            ((ratio * full).round() as usize).clamp(1, height * 8)
        })
        .collect();

    (0..height)
        .rev()
        .map(|row| {
            levels
                .iter()
                .map(|level| {
                    let filled = level.saturating_sub(row * 8).min(8);
                    EIGHTHS[filled].to_string().repeat(COLUMN_WIDTH)
                })
                .collect::<String>()
        })
        .collect()
}

/// Hour labels under the chart; labels that would overlap are skipped.
pub fn hour_axis(samples: &[HourlySample]) -> String {
    let width = samples.len() * COLUMN_WIDTH;
    let mut line = vec![' '; width];
    let mut next_free = 0;

    for (i, sample) in samples.iter().enumerate().step_by(LABEL_EVERY) {
        let start = i * COLUMN_WIDTH;
        let label: Vec<char> = sample.label.chars().collect();
        if start < next_free || start + label.len() > width {
            continue;
        }
        line[start..start + label.len()].copy_from_slice(&label);
        next_free = start + label.len() + 1;
    }

    line.into_iter().collect::<String>().trim_end().to_string()
}

/// One card: a header line, plus the chart when the card is open.
pub fn render_card(metric: Metric, samples: &[HourlySample], open: bool, theme: Theme) -> String {
    let chevron = if open { '▾' } else { '▸' };
    let value = samples
        .first()
        .map(|s| format_value(metric, s.value))
        .unwrap_or_else(|| "--".to_string());

    let mut out = format!("{chevron} {:<16}{value:>12}", metric.title());
    if !open || samples.is_empty() {
        return out;
    }

    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let color = metric.color(theme);
    for row in area_chart(&values, CHART_HEIGHT) {
        out.push_str("\n  ");
        out.push_str(&paint(row, color));
    }
    out.push_str("\n  ");
    out.push_str(&hour_axis(samples));

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    out.push_str(&format!(
        "\n  min {}  max {}",
        format_value(metric, min),
        format_value(metric, max)
    ));
    out
}

/// Whole dashboard as printed between prompts.
pub fn render_dashboard(
    location: Option<&LocationCandidate>,
    bundle: Option<&ForecastBundle>,
    cards: &Cards,
    theme: Theme,
) -> String {
    let mut out = format!("Weather Dashboard [{theme}]\n");

    if let Some(location) = location {
        out.push_str(&format!("Showing weather for {}\n", location.short_name()));
    }

    match bundle {
        Some(bundle) => {
            if let Some(start) = bundle.starts_at() {
                out.push_str(&format!("Forecast from {}\n", start.format("%Y-%m-%d %H:%M")));
            }
            for (metric, samples) in bundle.iter() {
                out.push('\n');
                out.push_str(&render_card(metric, samples, cards.is_open(metric), theme));
            }
            out.push('\n');
        }
        None => out.push_str("\nNo data available.\n"),
    }

    out
}
