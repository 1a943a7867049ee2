use crate::market::types::{ChartTimeframe, SeriesPoint};
use chrono::DateTime;
use serde::Serialize;

pub const CHART_PICK_RADIUS_PX: f64 = 30.0;
pub const SPARKLINE_PICK_RADIUS_PX: f64 = 10.0;
pub const PRICE_BANDS: usize = 5;
pub const TIME_GRIDLINE_DIVISIONS: usize = 6;

pub const PRICE_CHART_HEIGHT: f64 = 400.0;
pub const PRICE_CHART_PADDING: Padding = Padding {
    top: 30.0,
    right: 20.0,
    bottom: 30.0,
    left: 60.0,
};
pub const SPARKLINE_WIDTH: f64 = 100.0;
pub const SPARKLINE_HEIGHT: f64 = 40.0;
pub const SPARKLINE_PADDING: f64 = 2.0;

const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartRect {
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
}

impl ChartRect {
    pub fn price_chart(width: f64) -> Self {
        Self {
            width,
            height: PRICE_CHART_HEIGHT,
            padding: PRICE_CHART_PADDING,
        }
    }

    pub fn sparkline() -> Self {
        Self {
            width: SPARKLINE_WIDTH,
            height: SPARKLINE_HEIGHT,
            padding: Padding::uniform(SPARKLINE_PADDING),
        }
    }

    pub fn plot_width(&self) -> f64 {
        self.width - self.padding.left - self.padding.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.padding.top - self.padding.bottom
    }

    pub fn x_for_index(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.padding.left;
        }
        self.padding.left + self.plot_width() * index as f64 / (count - 1) as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ValueScale {
    pub min: f64,
    pub max: f64,
}

impl ValueScale {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let (low, high) = values
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .fold(None, |bounds: Option<(f64, f64)>, value| match bounds {
                Some((low, high)) => Some((low.min(value), high.max(value))),
                None => Some((value, value)),
            })?;

        Some(Self {
            min: low * 0.99,
            max: high * 1.01,
        })
    }

    pub fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    pub fn y_for(&self, value: f64, rect: &ChartRect) -> f64 {
        let plot_height = rect.plot_height();
        rect.padding.top + plot_height - plot_height * (value - self.min) / self.range()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlotGeometry {
    pub scale: ValueScale,
    pub points: Vec<PlotPoint>,
}

pub fn plot_values(values: &[f64], rect: &ChartRect) -> Option<PlotGeometry> {
    let scale = ValueScale::from_values(values)?;
    let count = values.len();
    let points = values
        .iter()
        .enumerate()
        .map(|(index, &value)| PlotPoint {
            index,
            x: rect.x_for_index(index, count),
            y: scale.y_for(value, rect),
            value,
        })
        .collect();

    Some(PlotGeometry { scale, points })
}

pub fn plot_series(series: &[SeriesPoint], rect: &ChartRect) -> Option<PlotGeometry> {
    let values: Vec<f64> = series.iter().map(|point| point.value).collect();
    plot_values(&values, rect)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMetric {
    Euclidean,
    Horizontal,
}

/// Index of the point nearest to the pointer, if strictly within `radius`.
/// Ties keep the lowest index.
pub fn hit_test(
    points: &[PlotPoint],
    pointer_x: f64,
    pointer_y: f64,
    metric: HitMetric,
    radius: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for point in points {
        let distance = match metric {
            HitMetric::Euclidean => (point.x - pointer_x).hypot(point.y - pointer_y),
            HitMetric::Horizontal => (point.x - pointer_x).abs(),
        };
        if distance >= radius {
            continue;
        }
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((point.index, distance));
        }
    }
    best.map(|(index, _)| index)
}

pub fn hit_test_chart(points: &[PlotPoint], pointer_x: f64, pointer_y: f64) -> Option<usize> {
    hit_test(
        points,
        pointer_x,
        pointer_y,
        HitMetric::Euclidean,
        CHART_PICK_RADIUS_PX,
    )
}

pub fn hit_test_sparkline(points: &[PlotPoint], pointer_x: f64) -> Option<usize> {
    hit_test(
        points,
        pointer_x,
        0.0,
        HitMetric::Horizontal,
        SPARKLINE_PICK_RADIUS_PX,
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceGridline {
    pub y: f64,
    pub value: f64,
    pub label: String,
}

pub fn price_gridlines(scale: &ValueScale, rect: &ChartRect) -> Vec<PriceGridline> {
    let step = scale.range() / PRICE_BANDS as f64;
    (0..=PRICE_BANDS)
        .map(|band| {
            let value = scale.min + step * band as f64;
            PriceGridline {
                y: scale.y_for(value, rect),
                value,
                label: format!("${}", format_price(value)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeGridline {
    pub index: usize,
    pub x: f64,
    pub timestamp_ms: i64,
    pub label: String,
}

pub fn time_gridlines(
    series: &[SeriesPoint],
    rect: &ChartRect,
    timeframe: ChartTimeframe,
) -> Vec<TimeGridline> {
    let count = series.len();
    let stride = (count / TIME_GRIDLINE_DIVISIONS).max(1);
    let pattern = match timeframe {
        ChartTimeframe::H24 => "%H:%M",
        ChartTimeframe::D7 | ChartTimeframe::D30 => "%b %-d",
        ChartTimeframe::Y1 => "%b %y",
    };

    series
        .iter()
        .enumerate()
        .step_by(stride)
        .map(|(index, point)| TimeGridline {
            index,
            x: rect.x_for_index(index, count),
            timestamp_ms: point.timestamp_ms,
            label: format_timestamp(point.timestamp_ms, pattern),
        })
        .collect()
}

fn format_timestamp(timestamp_ms: i64, pattern: &str) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(moment) => moment.format(pattern).to_string(),
        None => timestamp_ms.to_string(),
    }
}

pub fn format_tooltip_time(timestamp_ms: i64) -> String {
    format_timestamp(timestamp_ms, "%b %-d, %Y %H:%M")
}

pub fn format_price(value: f64) -> String {
    if value.abs() < 1.0 {
        return format!("{value:.6}");
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if value < 0.0 {
        grouped.push('-');
    }
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}

pub fn sparkline_age_label(index: usize, total: usize) -> String {
    let hours_back = total.saturating_sub(1).saturating_sub(index);
    let days = hours_back / HOURS_PER_DAY;
    let hours = hours_back % HOURS_PER_DAY;

    match (days, hours) {
        (0, 0) => "Now".to_string(),
        (0, hours) => format!("{hours}h ago"),
        (1, 0) => "1 day ago".to_string(),
        (days, hours) => format!("{days}d {hours}h ago"),
    }
}
