use dotenv::dotenv;
use env_logger;
use log::{error, info};
use std::env;

use forecast_panel::chart::{assemble, DisplaySettings};
use forecast_panel::config::ApiConfig;
use forecast_panel::models::{FileSettings, ForecastInputs, ForecastModel, ModelSettings};
use forecast_panel::services::request::{RequestController, RequestOutcome};
use forecast_panel::services::upload::{self, UploadedFile};

#[tokio::main]
async fn main() -> Result<(), forecast_panel::BoxError> {
    dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let (model_arg, path) = match (args.next(), args.next()) {
        (Some(model), Some(path)) => (model, path),
        _ => {
            eprintln!("Usage: forecast_panel <MODEL> <FILE.csv|.xls|.xlsx>");
            eprintln!("Models: AR MA ARMA ARIMA SARIMA SES HES HWES");
            std::process::exit(2);
        }
    };

    let model: ForecastModel = model_arg.parse()?;
    let file = UploadedFile::from_path(&path)?;

    match upload::preview(&file, 5) {
        Ok(preview) => {
            info!(
                "Upload '{}': columns {:?}, detected delimiter {:?}, date format {:?}",
                file.file_name, preview.headers, preview.delimiter, preview.date_format
            );
        }
        Err(e) => info!("No preview for '{}': {}", file.file_name, e),
    }

    let inputs = ForecastInputs {
        selected_model: Some(model),
        model_settings: Some(ModelSettings::defaults_for(model)),
        uploaded_file: Some(file),
        file_settings: FileSettings::default(),
    };

    let config = ApiConfig::from_env();
    info!("Forecast endpoint: {}", config.forecast_url());
    let controller = RequestController::new(config);

    match controller.submit(&inputs).await {
        RequestOutcome::Success(payload) => {
            info!("Forecast summary:\n{}", payload.summary);
            let view = assemble(Some(&payload), &DisplaySettings::default());
            info!(
                "Chart '{}': {} dates, {} series",
                view.title,
                view.x_labels.len(),
                view.series.len()
            );
            for series in &view.series {
                let points = series.data.iter().filter(|v| !v.is_null()).count();
                let name = if series.name.is_empty() {
                    "(scaling)"
                } else {
                    series.name.as_str()
                };
                info!("  {}: {} points", name, points);
            }
            Ok(())
        }
        outcome => {
            if let Some(message) = outcome.user_message() {
                match &message.detail {
                    Some(detail) => error!("{} {}", message.title, detail),
                    None => error!("{}", message.title),
                }
            }
            Err("forecast request failed".into())
        }
    }
}
