use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skycast_core::{AppError, Config};
use skycast_weather::{ForecastSnapshot, ServiceOptions, WeatherCache, WeatherPayload};

#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Cached met.no forecasts with sunrise and sunset")]
struct Cli {
    /// Config file (default: <config dir>/skycast/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the forecast for a coordinate pair
    #[command(allow_negative_numbers = true)]
    Get {
        latitude: f64,
        longitude: f64,
        /// Bypass both cache tiers
        #[arg(long)]
        refresh: bool,
        /// Print the merged XML document
        #[arg(long)]
        raw: bool,
    },
    /// Delete all cached forecasts
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = skycast_core::init() {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{}", AppError::classify(e).user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (config, _) = Config::load_validated(cli.config.as_deref())?;
    let cache = WeatherCache::from_options(ServiceOptions::from(&config.weather))?;

    match cli.command {
        Command::Get {
            latitude,
            longitude,
            refresh,
            raw,
        } => {
            let payload = cache.get_weather_data(latitude, longitude, refresh).await?;
            if raw {
                println!("{}", payload.to_xml_string()?);
            } else {
                print_snapshot(&payload)?;
            }
        }
        Command::Clear => {
            cache.clear_cache().await;
            println!("Weather cache cleared ({})", cache.store().dir().display());
        }
    }

    Ok(())
}

fn print_snapshot(payload: &WeatherPayload) -> Result<()> {
    let snap = ForecastSnapshot::from_payload(payload)?;

    fn show<T: std::fmt::Display>(label: &str, value: Option<T>, unit: &str) {
        match value {
            Some(v) => println!("{:<14}{}{}", label, v, unit),
            None => println!("{:<14}--", label),
        }
    }

    show("Forecast for", snap.from.as_deref(), "");
    show("Temperature", snap.temperature, " °C");
    let range = snap
        .min_temperature
        .zip(snap.max_temperature)
        .map(|(lo, hi)| format!("{lo} / {hi}"));
    show("Min / max", range, " °C");
    show("Conditions", snap.symbol_code.as_deref(), "");
    show("Wind", snap.wind_speed, " m/s");
    show("Direction", snap.wind_direction.as_deref(), "");
    show("Humidity", snap.humidity, " %");
    show("Pressure", snap.pressure, " hPa");
    show("Cloudiness", snap.cloudiness, " %");
    show("Dew point", snap.dew_point, " °C");
    show("Precipitation", snap.precipitation, " mm");
    show("Sunrise", snap.sunrise.map(|t| t.format("%H:%M")), "");
    show("Sunset", snap.sunset.map(|t| t.format("%H:%M")), "");
    Ok(())
}
