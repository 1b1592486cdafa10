// src/chart/placeholder.rs

//! Example data shown on the chart before the first forecast arrives.

pub const PLACEHOLDER_SERIES_NAME: &str = "Example data";
pub const PLACEHOLDER_CHART_TITLE: &str = "Example chart";

pub const PLACEHOLDER_DATES: [&str; 12] = [
    "2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06", "2024-07", "2024-08",
    "2024-09", "2024-10", "2024-11", "2024-12",
];

pub const PLACEHOLDER_VALUES: [f64; 12] = [
    112.0, 130.0, 165.0, 148.0, 170.0, 210.0, 193.0, 228.0, 205.0, 242.0, 230.0, 261.0,
];
