// src/chart/mod.rs
pub mod assembler;
pub mod placeholder;

pub use assembler::{
    assemble, ChartView, DisplaySettings, GridType, LineDash, RenderSeries, SeriesValue,
};
