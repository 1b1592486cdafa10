// src/chart/assembler.rs

//! Pure assembly of the chart series list from a raw forecast payload.
//!
//! The forecast line is stitched onto the last observed point and the
//! confidence band is decomposed into a stacked lower/delta pair so an
//! area-between-bounds renderer shades exactly the band.

use crate::chart::placeholder::{
    PLACEHOLDER_CHART_TITLE, PLACEHOLDER_DATES, PLACEHOLDER_SERIES_NAME, PLACEHOLDER_VALUES,
};
use crate::models::RawForecastPayload;

pub const OBSERVED_SERIES_NAME: &str = "Initial data";
pub const FORECAST_SERIES_NAME: &str = "Forecast";
const CONFIDENCE_STACK: &str = "confidence";

/// One data point of a render series. The band tooltip series carries
/// preformatted interval strings, every other series carries numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Null,
    Number(f64),
    Text(String),
}

impl SeriesValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SeriesValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SeriesValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
}

/// A named line series plus the style hints the renderer understands.
/// Built fresh on every assembly call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSeries {
    pub name: String,
    pub data: Vec<SeriesValue>,
    pub color: Option<String>,
    pub width: f64,
    pub dash: LineDash,
    pub opacity: f64,
    pub smooth: bool,
    pub stack: Option<String>,
    pub area_opacity: Option<f64>,
    pub tooltip: bool,
    pub in_legend: bool,
    /// (min, max) markers over the non-null values, when enabled.
    pub extremes: Option<(f64, f64)>,
    /// Dashed horizontal mean line over the non-null values, when enabled.
    pub average: Option<f64>,
}

impl RenderSeries {
    fn line(name: &str, data: Vec<SeriesValue>) -> RenderSeries {
        RenderSeries {
            name: name.to_string(),
            data,
            color: None,
            width: 2.0,
            dash: LineDash::Solid,
            opacity: 1.0,
            smooth: false,
            stack: None,
            area_opacity: None,
            tooltip: true,
            in_legend: true,
            extremes: None,
            average: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridType {
    Regular,
    Vertical,
    Horizontal,
    Missing,
}

/// Chart display options from the advanced-settings panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub show_endog_extremes: bool,
    pub show_forecast_extremes: bool,
    pub show_endog_average: bool,
    pub show_forecast_average: bool,
    pub smooth: bool,
    pub show_legend: bool,
    pub data_color: String,
    pub forecast_color: String,
    pub title: String,
    pub grid: GridType,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            show_endog_extremes: false,
            show_forecast_extremes: false,
            show_endog_average: false,
            show_forecast_average: false,
            smooth: false,
            show_legend: true,
            data_color: "#3582FF".to_string(),
            forecast_color: "#F54242".to_string(),
            title: "Forecast chart".to_string(),
            grid: GridType::Horizontal,
        }
    }
}

/// What the charting component consumes: axis labels, legend entries and the
/// ordered series list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub title: String,
    pub x_labels: Vec<String>,
    pub show_legend: bool,
    pub legend: Vec<String>,
    pub vertical_grid: bool,
    pub horizontal_grid: bool,
    pub series: Vec<RenderSeries>,
}

/// Mean of the non-null values; `None` when there are none. Nulls are
/// excluded from the count, not treated as zero.
fn average(data: &[SeriesValue]) -> Option<f64> {
    let values: Vec<f64> = data.iter().filter_map(SeriesValue::as_number).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// (min, max) over the non-null values; `None` when there are none.
fn extremes(data: &[SeriesValue]) -> Option<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = None;
    for v in data.iter().filter_map(SeriesValue::as_number) {
        bounds = Some(match bounds {
            None => (v, v),
            Some((min, max)) => (min.min(v), max.max(v)),
        });
    }
    bounds
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn format_interval(lower: f64, upper: f64) -> String {
    format!("[{:.3}, {:.3}]", lower, upper)
}

fn band_series_name(confidence_level: f64) -> String {
    format!(
        "Confidence interval ({}%)",
        (confidence_level * 100.0).trunc() as i64
    )
}

/// Forecast values left-padded to the full date range, with the last
/// observed value duplicated as an anchor at index `endog.len() - 1` so the
/// observed and forecast lines join without a gap.
fn stitch_prediction(endog: &[f64], prediction: &[f64]) -> Vec<Option<f64>> {
    let mut stitched: Vec<Option<f64>> = Vec::with_capacity(endog.len() + prediction.len());
    if let Some(&anchor) = endog.last() {
        stitched.resize(endog.len() - 1, None);
        stitched.push(Some(anchor));
    }
    stitched.extend(prediction.iter().map(|&v| Some(v)));
    stitched
}

/// Build the ordered series list for one render pass.
///
/// `None` payload yields the single placeholder series shown before any
/// request has succeeded. Never fails: the worst a degenerate payload gets
/// is empty series.
pub fn assemble(payload: Option<&RawForecastPayload>, settings: &DisplaySettings) -> ChartView {
    let (vertical_grid, horizontal_grid) = match settings.grid {
        GridType::Regular => (true, true),
        GridType::Vertical => (true, false),
        GridType::Horizontal => (false, true),
        GridType::Missing => (false, false),
    };

    let Some(payload) = payload else {
        let series = RenderSeries {
            color: Some("gray".to_string()),
            dash: LineDash::Dotted,
            opacity: 0.65,
            smooth: settings.smooth,
            ..RenderSeries::line(
                PLACEHOLDER_SERIES_NAME,
                PLACEHOLDER_VALUES.iter().map(|&v| SeriesValue::Number(v)).collect(),
            )
        };
        return ChartView {
            title: PLACEHOLDER_CHART_TITLE.to_string(),
            x_labels: PLACEHOLDER_DATES.iter().map(|d| d.to_string()).collect(),
            show_legend: settings.show_legend,
            legend: vec![PLACEHOLDER_SERIES_NAME.to_string()],
            vertical_grid,
            horizontal_grid,
            series: vec![series],
        };
    };

    let endog = &payload.endog;
    let stitched = stitch_prediction(endog, &payload.prediction);
    let total_len = payload.full_dates.len();

    let mut series = Vec::with_capacity(6);

    // Invisible series spanning observed and forecast values so the axis
    // scale covers both; not interactive, not listed anywhere.
    let scaling_data: Vec<SeriesValue> = (0..total_len)
        .map(|i| {
            endog
                .get(i)
                .copied()
                .or_else(|| stitched.get(i).copied().flatten())
                .map(SeriesValue::Number)
                .unwrap_or(SeriesValue::Null)
        })
        .collect();
    series.push(RenderSeries {
        opacity: 0.0,
        tooltip: false,
        in_legend: false,
        ..RenderSeries::line("", scaling_data)
    });

    // Forecast continuation, display precision fixed at 3 decimals
    let forecast_data: Vec<SeriesValue> = stitched
        .iter()
        .map(|v| match v {
            Some(v) => SeriesValue::Number(round3(*v)),
            None => SeriesValue::Null,
        })
        .collect();
    series.push(RenderSeries {
        color: Some(settings.forecast_color.clone()),
        dash: LineDash::Dashed,
        smooth: settings.smooth,
        extremes: settings.show_forecast_extremes.then(|| extremes(&forecast_data)).flatten(),
        average: settings.show_forecast_average.then(|| average(&forecast_data)).flatten(),
        ..RenderSeries::line(FORECAST_SERIES_NAME, forecast_data)
    });

    let mut band_name = None;
    if let (Some(intervals), Some(level)) = (
        payload.confidence_intervals.intervals.as_ref(),
        payload.confidence_intervals.confidence_level,
    ) {
        let name = band_series_name(level);
        let pad = endog.len().saturating_sub(1);
        let anchor = endog.last().copied();

        // Zero-width series carrying the formatted bounds for the tooltip;
        // the anchor shows a zero-width band at the junction.
        let mut label_data: Vec<SeriesValue> = vec![SeriesValue::Null; pad];
        if let Some(anchor) = anchor {
            label_data.push(SeriesValue::Text(format_interval(anchor, anchor)));
        }
        label_data.extend(
            intervals
                .iter()
                .map(|&(lower, upper)| SeriesValue::Text(format_interval(lower, upper))),
        );
        series.push(RenderSeries {
            color: Some(settings.forecast_color.clone()),
            width: 0.0,
            ..RenderSeries::line(&name, label_data)
        });

        // Lower bound, stacked first
        let mut lower_data: Vec<SeriesValue> = vec![SeriesValue::Null; pad];
        if let Some(anchor) = anchor {
            lower_data.push(SeriesValue::Number(anchor));
        }
        lower_data.extend(intervals.iter().map(|&(lower, _)| SeriesValue::Number(lower)));
        series.push(RenderSeries {
            color: Some(settings.forecast_color.clone()),
            width: 0.0,
            smooth: settings.smooth,
            stack: Some(CONFIDENCE_STACK.to_string()),
            tooltip: false,
            in_legend: false,
            ..RenderSeries::line(&name, lower_data)
        });

        // Filled delta on top of the lower bound; stacking the difference
        // (not the raw upper bound) is what shades exactly the band
        let mut delta_data: Vec<SeriesValue> = vec![SeriesValue::Null; pad];
        if anchor.is_some() {
            delta_data.push(SeriesValue::Number(0.0));
        }
        delta_data.extend(
            intervals
                .iter()
                .map(|&(lower, upper)| SeriesValue::Number(upper - lower)),
        );
        series.push(RenderSeries {
            color: Some(settings.forecast_color.clone()),
            width: 0.0,
            smooth: settings.smooth,
            stack: Some(CONFIDENCE_STACK.to_string()),
            area_opacity: Some(0.2),
            tooltip: false,
            in_legend: false,
            ..RenderSeries::line(&name, delta_data)
        });

        band_name = Some(name);
    }

    let observed_data: Vec<SeriesValue> =
        endog.iter().map(|&v| SeriesValue::Number(v)).collect();
    series.push(RenderSeries {
        color: Some(settings.data_color.clone()),
        smooth: settings.smooth,
        extremes: settings.show_endog_extremes.then(|| extremes(&observed_data)).flatten(),
        average: settings.show_endog_average.then(|| average(&observed_data)).flatten(),
        ..RenderSeries::line(OBSERVED_SERIES_NAME, observed_data)
    });

    let mut legend = vec![
        OBSERVED_SERIES_NAME.to_string(),
        FORECAST_SERIES_NAME.to_string(),
    ];
    if let Some(name) = band_name {
        legend.push(name);
    }

    ChartView {
        title: settings.title.clone(),
        x_labels: payload.full_dates.clone(),
        show_legend: settings.show_legend,
        legend,
        vertical_grid,
        horizontal_grid,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceIntervals;

    fn payload(
        endog: Vec<f64>,
        prediction: Vec<f64>,
        intervals: Option<Vec<(f64, f64)>>,
        confidence_level: Option<f64>,
    ) -> RawForecastPayload {
        let total = endog.len() + prediction.len();
        RawForecastPayload {
            summary: "summary".to_string(),
            full_dates: (1..=total).map(|i| format!("2024-{:02}", i)).collect(),
            endog,
            prediction,
            confidence_intervals: ConfidenceIntervals {
                intervals,
                confidence_level,
            },
        }
    }

    fn sample() -> RawForecastPayload {
        payload(
            vec![10.0, 12.0, 11.0],
            vec![13.0, 14.0],
            Some(vec![(12.0, 14.0), (12.5, 15.5)]),
            Some(0.9),
        )
    }

    fn find<'a>(view: &'a ChartView, name: &str) -> &'a RenderSeries {
        view.series
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no series named '{}'", name))
    }

    #[test]
    fn null_payload_yields_single_placeholder_series() {
        let view = assemble(None, &DisplaySettings::default());
        assert_eq!(view.series.len(), 1);
        let series = &view.series[0];
        assert_eq!(series.name, PLACEHOLDER_SERIES_NAME);
        assert_eq!(series.dash, LineDash::Dotted);
        assert!(view.series.iter().all(|s| s.stack.is_none()));
        assert_eq!(view.x_labels.len(), PLACEHOLDER_VALUES.len());
    }

    #[test]
    fn forecast_is_stitched_onto_last_observed_point() {
        let view = assemble(Some(&sample()), &DisplaySettings::default());
        let forecast = find(&view, FORECAST_SERIES_NAME);
        assert_eq!(
            forecast.data,
            vec![
                SeriesValue::Null,
                SeriesValue::Null,
                SeriesValue::Number(11.0),
                SeriesValue::Number(13.0),
                SeriesValue::Number(14.0),
            ]
        );
        assert_eq!(forecast.dash, LineDash::Dashed);
    }

    #[test]
    fn scaling_series_covers_full_range_invisibly() {
        let view = assemble(Some(&sample()), &DisplaySettings::default());
        let scaling = &view.series[0];
        assert_eq!(scaling.name, "");
        assert_eq!(scaling.opacity, 0.0);
        assert!(!scaling.tooltip);
        assert!(!scaling.in_legend);
        assert_eq!(scaling.data.len(), 5);
        assert!(scaling.data.iter().all(|v| !v.is_null()));
        // observed values win where both are defined
        assert_eq!(scaling.data[2], SeriesValue::Number(11.0));
        assert_eq!(scaling.data[3], SeriesValue::Number(13.0));
    }

    #[test]
    fn band_label_formats_intervals_with_anchor_junction() {
        let view = assemble(Some(&sample()), &DisplaySettings::default());
        let label = &view.series[2];
        assert_eq!(label.name, "Confidence interval (90%)");
        assert!(label.in_legend);
        assert_eq!(label.data[0], SeriesValue::Null);
        assert_eq!(label.data[1], SeriesValue::Null);
        assert_eq!(label.data[2], SeriesValue::Text("[11.000, 11.000]".to_string()));
        assert_eq!(label.data[3], SeriesValue::Text("[12.000, 14.000]".to_string()));
        assert_eq!(label.data[4], SeriesValue::Text("[12.500, 15.500]".to_string()));
    }

    #[test]
    fn band_decomposition_stacks_back_to_upper_bound() {
        let view = assemble(Some(&sample()), &DisplaySettings::default());
        let lower = &view.series[3];
        let delta = &view.series[4];
        assert_eq!(lower.stack.as_deref(), Some("confidence"));
        assert_eq!(delta.stack.as_deref(), Some("confidence"));
        assert_eq!(delta.area_opacity, Some(0.2));
        assert!(!lower.in_legend && !delta.in_legend);

        // anchor: zero-width band at the junction
        assert_eq!(lower.data[2], SeriesValue::Number(11.0));
        assert_eq!(delta.data[2], SeriesValue::Number(0.0));

        let uppers = [14.0, 15.5];
        for (i, upper) in (3..5).zip(uppers) {
            let l = lower.data[i].as_number().unwrap();
            let d = delta.data[i].as_number().unwrap();
            assert!((l + d - upper).abs() < 1e-9);
        }
    }

    #[test]
    fn absent_intervals_omit_the_band_entirely() {
        let p = payload(vec![1.0, 2.0], vec![3.0], None, None);
        let view = assemble(Some(&p), &DisplaySettings::default());
        assert_eq!(view.series.len(), 3);
        assert!(view.series.iter().all(|s| s.stack.is_none()));
        assert_eq!(view.legend, vec![OBSERVED_SERIES_NAME, FORECAST_SERIES_NAME]);
    }

    #[test]
    fn average_excludes_nulls() {
        let data = vec![
            SeriesValue::Null,
            SeriesValue::Number(2.0),
            SeriesValue::Null,
            SeriesValue::Number(4.0),
        ];
        assert_eq!(average(&data), Some(3.0));
    }

    #[test]
    fn average_and_extremes_are_undefined_without_values() {
        assert_eq!(average(&[SeriesValue::Null, SeriesValue::Null]), None);
        assert_eq!(extremes(&[]), None);

        let p = payload(vec![], vec![1.0], None, None);
        let settings = DisplaySettings {
            show_endog_average: true,
            show_endog_extremes: true,
            ..DisplaySettings::default()
        };
        let view = assemble(Some(&p), &settings);
        let observed = find(&view, OBSERVED_SERIES_NAME);
        assert_eq!(observed.average, None);
        assert_eq!(observed.extremes, None);
    }

    #[test]
    fn decorations_appear_only_when_enabled() {
        let settings = DisplaySettings {
            show_endog_extremes: true,
            show_endog_average: true,
            show_forecast_extremes: true,
            show_forecast_average: true,
            ..DisplaySettings::default()
        };
        let view = assemble(Some(&sample()), &settings);

        let observed = find(&view, OBSERVED_SERIES_NAME);
        assert_eq!(observed.extremes, Some((10.0, 12.0)));
        assert_eq!(observed.average, Some(11.0));

        let forecast = find(&view, FORECAST_SERIES_NAME);
        assert_eq!(forecast.extremes, Some((11.0, 14.0)));
        // anchor participates in the forecast average
        let expected = (11.0 + 13.0 + 14.0) / 3.0;
        assert!((forecast.average.unwrap() - expected).abs() < 1e-9);

        let defaults = assemble(Some(&sample()), &DisplaySettings::default());
        assert_eq!(find(&defaults, OBSERVED_SERIES_NAME).extremes, None);
        assert_eq!(find(&defaults, FORECAST_SERIES_NAME).average, None);
    }

    #[test]
    fn display_values_are_rounded_to_three_decimals() {
        let p = payload(vec![1.23456], vec![2.71828], None, None);
        let view = assemble(Some(&p), &DisplaySettings::default());
        let forecast = find(&view, FORECAST_SERIES_NAME);
        assert_eq!(forecast.data[0], SeriesValue::Number(1.235));
        assert_eq!(forecast.data[1], SeriesValue::Number(2.718));
    }

    #[test]
    fn confidence_level_is_truncated_to_integer_percent() {
        assert_eq!(band_series_name(0.9), "Confidence interval (90%)");
        assert_eq!(band_series_name(0.955), "Confidence interval (95%)");
        assert_eq!(band_series_name(0.999), "Confidence interval (99%)");
    }

    #[test]
    fn grid_type_maps_to_axis_split_lines() {
        let mut settings = DisplaySettings::default();
        let view = assemble(None, &settings);
        assert!(!view.vertical_grid && view.horizontal_grid);

        settings.grid = GridType::Regular;
        let view = assemble(None, &settings);
        assert!(view.vertical_grid && view.horizontal_grid);

        settings.grid = GridType::Missing;
        let view = assemble(None, &settings);
        assert!(!view.vertical_grid && !view.horizontal_grid);
    }
}
