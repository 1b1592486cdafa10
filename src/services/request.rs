// src/services/request.rs
use log::{error, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ApiConfig;
use crate::models::{ForecastInputs, RawForecastPayload};

/// Locally detected problems that stop a submission before any network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Model, settings or file missing from the inputs.
    MissingInputs,
    /// A previous submission from this controller has not settled yet.
    RequestInFlight,
}

/// Classified result of one submission. Exactly one of these is produced
/// per `submit` call and it is never retried automatically.
#[derive(Debug)]
pub enum RequestOutcome {
    Success(RawForecastPayload),
    ValidationFailure(ValidationFailure),
    Timeout { elapsed_ms: u64 },
    ServerRejection { detail: String },
    NetworkFailure,
}

/// What the error-display component shows: a title and optional detail text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub title: String,
    pub detail: Option<String>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

impl RequestOutcome {
    /// Error-display mapping; `None` for a successful outcome.
    pub fn user_message(&self) -> Option<UserMessage> {
        match self {
            RequestOutcome::Success(_) => None,
            RequestOutcome::ValidationFailure(ValidationFailure::RequestInFlight) => {
                Some(UserMessage {
                    title: "Please wait for the results of the current forecast.".to_string(),
                    detail: None,
                })
            }
            RequestOutcome::ValidationFailure(ValidationFailure::MissingInputs) => {
                Some(UserMessage {
                    title: "Fill in all the forms: model, settings and data file.".to_string(),
                    detail: None,
                })
            }
            RequestOutcome::Timeout { elapsed_ms } => Some(UserMessage {
                title: format!(
                    "The waiting time has been exceeded. The server did not respond for {} seconds. Please try again later.",
                    elapsed_ms / 1000
                ),
                detail: None,
            }),
            RequestOutcome::ServerRejection { detail } => Some(UserMessage {
                title: "Input data error.".to_string(),
                detail: Some(detail.clone()),
            }),
            RequestOutcome::NetworkFailure => Some(UserMessage {
                title: "Failed to send the request. Please try again later.".to_string(),
                detail: None,
            }),
        }
    }
}

/// Clears the in-flight flag when the submission settles, whichever way it
/// settles.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the lifecycle of forecast submissions against one service endpoint:
/// at most one request in flight, bounded wait, classified settlement.
pub struct RequestController {
    client: Client,
    config: ApiConfig,
    in_flight: AtomicBool,
}

impl RequestController {
    pub fn new(config: ApiConfig) -> Self {
        RequestController {
            client: Client::new(),
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Whether a submission is currently pending.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Local presence check; never touches the network.
    pub fn validate(inputs: &ForecastInputs) -> Result<(), ValidationFailure> {
        if inputs.is_complete() {
            Ok(())
        } else {
            Err(ValidationFailure::MissingInputs)
        }
    }

    /// Submit one forecast request and classify its settlement.
    ///
    /// The in-flight flag is taken with a compare-exchange so concurrent
    /// callers cannot both observe "not in flight"; the loser gets the busy
    /// failure without any dispatch. The configured window bounds the whole
    /// exchange, from dispatch through body decode; when it fires the
    /// transport future is dropped, so a late server response can never
    /// surface as a success.
    pub async fn submit(&self, inputs: &ForecastInputs) -> RequestOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Forecast request rejected: a previous request is still in flight");
            return RequestOutcome::ValidationFailure(ValidationFailure::RequestInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        if let Err(reason) = Self::validate(inputs) {
            warn!("Forecast request rejected: incomplete inputs");
            return RequestOutcome::ValidationFailure(reason);
        }

        let form = match build_form(inputs) {
            Ok(form) => form,
            Err(e) => {
                error!("Failed to build multipart payload: {}", e);
                return RequestOutcome::NetworkFailure;
            }
        };

        let url = self.config.forecast_url();
        let model = inputs.selected_model.map(|m| m.as_str()).unwrap_or("?");
        info!("Submitting {} forecast request to {}", model, url);

        // One window bounds the whole exchange, response body included: a
        // server that sends headers and then stalls the body must still
        // settle as a timeout
        let exchange = self.exchange(&url, form);
        match tokio::time::timeout(self.config.timeout, exchange).await {
            Err(_) => {
                let elapsed_ms = self.config.timeout.as_millis() as u64;
                error!("Forecast request timed out after {} ms", elapsed_ms);
                RequestOutcome::Timeout { elapsed_ms }
            }
            Ok(outcome) => outcome,
        }
    }

    /// Dispatch and classify, without the bounded wait (`submit` adds it).
    async fn exchange(&self, url: &str, form: Form) -> RequestOutcome {
        let response = match self.client.post(url).multipart(form).send().await {
            Err(e) if e.is_timeout() => {
                let elapsed_ms = self.config.timeout.as_millis() as u64;
                error!("Forecast request timed out in transport: {}", e);
                return RequestOutcome::Timeout { elapsed_ms };
            }
            Err(e) => {
                error!("Forecast request failed to send: {}", e);
                return RequestOutcome::NetworkFailure;
            }
            Ok(response) => response,
        };

        let status = response.status();
        if status.is_client_error() {
            let detail = response
                .json::<ErrorDetail>()
                .await
                .map(|e| e.detail)
                .unwrap_or_else(|_| "Unknown error.".to_string());
            error!("Forecast request rejected by the service ({}): {}", status, detail);
            return RequestOutcome::ServerRejection { detail };
        }
        if !status.is_success() {
            error!("Forecast request failed with status {}", status);
            return RequestOutcome::NetworkFailure;
        }

        match response.json::<RawForecastPayload>().await {
            Ok(payload) => {
                info!(
                    "Forecast received: {} observed points, {} forecast steps",
                    payload.endog.len(),
                    payload.prediction.len()
                );
                RequestOutcome::Success(payload)
            }
            Err(e) => {
                error!("Failed to decode forecast response: {}", e);
                RequestOutcome::NetworkFailure
            }
        }
    }
}

fn build_form(inputs: &ForecastInputs) -> anyhow::Result<Form> {
    let model = inputs
        .selected_model
        .ok_or_else(|| anyhow::anyhow!("selected model missing"))?;
    let settings = inputs
        .model_settings
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("model settings missing"))?;
    let file = inputs
        .uploaded_file
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("uploaded file missing"))?;

    let file_part = Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(file.kind.mime())?;

    Ok(Form::new()
        .text("selectedModel", model.as_str())
        .text("modelSettings", serde_json::to_string(settings)?)
        .part("uploadedData", file_part)
        .text("fileSettings", serde_json::to_string(&inputs.file_settings)?))
}
