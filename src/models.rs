// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::upload::UploadedFile;

/// Closed set of model identifiers the forecasting service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastModel {
    #[serde(rename = "AR")]
    Ar,
    #[serde(rename = "MA")]
    Ma,
    #[serde(rename = "ARMA")]
    Arma,
    #[serde(rename = "ARIMA")]
    Arima,
    #[serde(rename = "SARIMA")]
    Sarima,
    #[serde(rename = "SES")]
    Ses,
    #[serde(rename = "HES")]
    Hes,
    #[serde(rename = "HWES")]
    Hwes,
}

impl ForecastModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastModel::Ar => "AR",
            ForecastModel::Ma => "MA",
            ForecastModel::Arma => "ARMA",
            ForecastModel::Arima => "ARIMA",
            ForecastModel::Sarima => "SARIMA",
            ForecastModel::Ses => "SES",
            ForecastModel::Hes => "HES",
            ForecastModel::Hwes => "HWES",
        }
    }
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ForecastModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AR" => Ok(ForecastModel::Ar),
            "MA" => Ok(ForecastModel::Ma),
            "ARMA" => Ok(ForecastModel::Arma),
            "ARIMA" => Ok(ForecastModel::Arima),
            "SARIMA" => Ok(ForecastModel::Sarima),
            "SES" => Ok(ForecastModel::Ses),
            "HES" => Ok(ForecastModel::Hes),
            "HWES" => Ok(ForecastModel::Hwes),
            other => Err(format!("Unknown forecasting model: {}", other)),
        }
    }
}

/// Trend component of the SARIMAX family ('n', 'c', 't', 'ct').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "n")]
    None,
    #[serde(rename = "c")]
    Constant,
    #[serde(rename = "t")]
    Time,
    #[serde(rename = "ct")]
    ConstantTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitializationMethod {
    Estimated,
    Heuristic,
    Known,
}

/// Trend/seasonal component type of the exponential-smoothing family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmoothingComponent {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "add")]
    Additive,
    #[serde(rename = "mul")]
    Multiplicative,
}

/// Per-model parameter set, one variant per supported model, each carrying
/// only the fields that model understands. Serializes to the flat camelCase
/// object the service expects in the `modelSettings` multipart field; the
/// model identifier itself travels separately as `selectedModel`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModelSettings {
    #[serde(rename_all = "camelCase")]
    Ar {
        steps: u32,
        p: u32,
        trend: Trend,
        significance_level: f64,
        enforce_stationarity: bool,
        enforce_invertibility: bool,
    },
    #[serde(rename_all = "camelCase")]
    Ma {
        steps: u32,
        q: u32,
        trend: Trend,
        significance_level: f64,
        enforce_stationarity: bool,
        enforce_invertibility: bool,
    },
    #[serde(rename_all = "camelCase")]
    Arma {
        steps: u32,
        p: u32,
        q: u32,
        trend: Trend,
        significance_level: f64,
        enforce_stationarity: bool,
        enforce_invertibility: bool,
    },
    #[serde(rename_all = "camelCase")]
    Arima {
        steps: u32,
        p: u32,
        d: u32,
        q: u32,
        trend: Trend,
        significance_level: f64,
        enforce_stationarity: bool,
        enforce_invertibility: bool,
    },
    #[serde(rename_all = "camelCase")]
    Sarima {
        steps: u32,
        p: u32,
        d: u32,
        q: u32,
        #[serde(rename = "P")]
        seasonal_p: u32,
        #[serde(rename = "D")]
        seasonal_d: u32,
        #[serde(rename = "Q")]
        seasonal_q: u32,
        #[serde(rename = "s")]
        seasonal_periods: u32,
        trend: Trend,
        significance_level: f64,
        enforce_stationarity: bool,
        enforce_invertibility: bool,
    },
    #[serde(rename_all = "camelCase")]
    Ses {
        steps: u32,
        initialization_method: InitializationMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_level: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Hes {
        steps: u32,
        initialization_method: InitializationMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_level: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_trend: Option<f64>,
        exponential: bool,
        damped_trend: bool,
    },
    #[serde(rename_all = "camelCase")]
    Hwes {
        steps: u32,
        initialization_method: InitializationMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_level: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_trend: Option<f64>,
        trend: SmoothingComponent,
        seasonal: SmoothingComponent,
        seasonal_periods: u32,
        damped_trend: bool,
    },
}

impl ModelSettings {
    pub fn model(&self) -> ForecastModel {
        match self {
            ModelSettings::Ar { .. } => ForecastModel::Ar,
            ModelSettings::Ma { .. } => ForecastModel::Ma,
            ModelSettings::Arma { .. } => ForecastModel::Arma,
            ModelSettings::Arima { .. } => ForecastModel::Arima,
            ModelSettings::Sarima { .. } => ForecastModel::Sarima,
            ModelSettings::Ses { .. } => ForecastModel::Ses,
            ModelSettings::Hes { .. } => ForecastModel::Hes,
            ModelSettings::Hwes { .. } => ForecastModel::Hwes,
        }
    }

    /// Form defaults for each model, as the settings panels preset them.
    pub fn defaults_for(model: ForecastModel) -> ModelSettings {
        match model {
            ForecastModel::Ar => ModelSettings::Ar {
                steps: 10,
                p: 1,
                trend: Trend::Constant,
                significance_level: 0.05,
                enforce_stationarity: true,
                enforce_invertibility: true,
            },
            ForecastModel::Ma => ModelSettings::Ma {
                steps: 10,
                q: 1,
                trend: Trend::Constant,
                significance_level: 0.05,
                enforce_stationarity: true,
                enforce_invertibility: true,
            },
            ForecastModel::Arma => ModelSettings::Arma {
                steps: 10,
                p: 1,
                q: 1,
                trend: Trend::Constant,
                significance_level: 0.05,
                enforce_stationarity: true,
                enforce_invertibility: true,
            },
            ForecastModel::Arima => ModelSettings::Arima {
                steps: 10,
                p: 1,
                d: 0,
                q: 0,
                trend: Trend::Constant,
                significance_level: 0.05,
                enforce_stationarity: true,
                enforce_invertibility: true,
            },
            ForecastModel::Sarima => ModelSettings::Sarima {
                steps: 10,
                p: 1,
                d: 1,
                q: 1,
                seasonal_p: 1,
                seasonal_d: 1,
                seasonal_q: 1,
                seasonal_periods: 12,
                trend: Trend::Constant,
                significance_level: 0.05,
                enforce_stationarity: true,
                enforce_invertibility: true,
            },
            ForecastModel::Ses => ModelSettings::Ses {
                steps: 10,
                initialization_method: InitializationMethod::Estimated,
                initial_level: None,
            },
            ForecastModel::Hes => ModelSettings::Hes {
                steps: 10,
                initialization_method: InitializationMethod::Estimated,
                initial_level: None,
                initial_trend: None,
                exponential: false,
                damped_trend: false,
            },
            ForecastModel::Hwes => ModelSettings::Hwes {
                steps: 10,
                initialization_method: InitializationMethod::Estimated,
                initial_level: None,
                initial_trend: None,
                trend: SmoothingComponent::Additive,
                seasonal: SmoothingComponent::Additive,
                seasonal_periods: 12,
                damped_trend: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CsvDelimiter {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = ";")]
    Semicolon,
    #[serde(rename = " ")]
    Space,
    #[serde(rename = "\t")]
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFormat {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "YYYY-MM-DD")]
    IsoDashed,
    #[serde(rename = "DD.MM.YYYY")]
    DottedDmy,
    #[serde(rename = "MM/DD/YYYY")]
    SlashedMdy,
    #[serde(rename = "DD/MM/YYYY")]
    SlashedDmy,
}

impl DateFormat {
    /// strftime pattern for the concrete formats; `Auto` has none.
    pub fn strftime(&self) -> Option<&'static str> {
        match self {
            DateFormat::Auto => None,
            DateFormat::IsoDashed => Some("%Y-%m-%d"),
            DateFormat::DottedDmy => Some("%d.%m.%Y"),
            DateFormat::SlashedMdy => Some("%m/%d/%Y"),
            DateFormat::SlashedDmy => Some("%d/%m/%Y"),
        }
    }
}

/// File-parsing hints passed through to the service; the server resolves
/// `auto` itself, the client only sniffs for its own preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSettings {
    pub csv_delimiter: CsvDelimiter,
    pub date_format: DateFormat,
}

impl Default for FileSettings {
    fn default() -> Self {
        FileSettings {
            csv_delimiter: CsvDelimiter::Auto,
            date_format: DateFormat::Auto,
        }
    }
}

/// Everything a submission needs. A request is submittable only when model,
/// settings and file are all present.
#[derive(Debug, Clone, Default)]
pub struct ForecastInputs {
    pub selected_model: Option<ForecastModel>,
    pub model_settings: Option<ModelSettings>,
    pub uploaded_file: Option<UploadedFile>,
    pub file_settings: FileSettings,
}

impl ForecastInputs {
    pub fn is_complete(&self) -> bool {
        self.selected_model.is_some()
            && self.model_settings.is_some()
            && self.uploaded_file.is_some()
    }
}

/// Success body of the forecast endpoint.
///
/// `full_dates` covers history plus horizon; `prediction` holds only the
/// horizon values — the service never repeats the last observed point, the
/// chart assembler inserts that anchor itself.
#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastPayload {
    pub summary: String,
    pub full_dates: Vec<String>,
    pub endog: Vec<f64>,
    pub prediction: Vec<f64>,
    pub confidence_intervals: ConfidenceIntervals,
}

/// Smoothing models come back with both fields null.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceIntervals {
    pub intervals: Option<Vec<(f64, f64)>>,
    pub confidence_level: Option<f64>,
}
