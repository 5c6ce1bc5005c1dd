use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use congestion_forecast::utils::{format_timestamp, local_now, parse_timestamp};
use congestion_forecast::{
    Cli, Command, ENGINE, ForecastItem, Location, OpenWeatherProvider, RouteSummary,
    SharedEngine, TimeseriesItem, WeatherProvider,
};

#[derive(Tabled)]
struct TimeseriesRow {
    #[tabled(rename = "+h")]
    hours_ahead: u32,
    time: String,
    score: String,
    risk: String,
}

#[derive(Tabled)]
struct WaypointRow {
    #[tabled(rename = "#")]
    index: usize,
    latitude: String,
    longitude: String,
    #[tabled(rename = "eta (min)")]
    eta_minutes: u32,
    score: String,
    risk: String,
}

fn timestamp_or_now(text: Option<&str>) -> Result<NaiveDateTime> {
    text.map(parse_timestamp).transpose().map(|t| t.unwrap_or_else(local_now))
}

fn parse_point(text: &str) -> Result<Location> {
    let (lat, lon) = text
        .split_once(',')
        .with_context(|| format!("expected 'lat,lon', got '{}'", text))?;
    Ok(Location {
        latitude: lat.trim().parse().context("latitude")?,
        longitude: lon.trim().parse().context("longitude")?,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_timeseries_table(items: &[TimeseriesItem]) {
    let rows: Vec<TimeseriesRow> = items
        .iter()
        .map(|i| match &i.item {
            ForecastItem::Predicted(p) => TimeseriesRow {
                hours_ahead: i.hours_ahead,
                time: format_timestamp(p.timestamp),
                score: format!("{:.3}", p.congestion_score),
                risk: p.risk_level.to_string(),
            },
            ForecastItem::Failed(f) => TimeseriesRow {
                hours_ahead: i.hours_ahead,
                time: "-".into(),
                score: "-".into(),
                risk: f.error.clone(),
            },
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_route_table(summary: &RouteSummary) {
    let rows: Vec<WaypointRow> = summary
        .waypoints
        .iter()
        .enumerate()
        .map(|(index, w)| WaypointRow {
            index,
            latitude: format!("{:.4}", w.location.latitude),
            longitude: format!("{:.4}", w.location.longitude),
            eta_minutes: w.eta_minutes,
            score: w
                .congestion_score()
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "-".into()),
            risk: w
                .risk_level()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "failed".into()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!(
        "Average {:.3} | Max {:.3} | Overall {}",
        summary.risk.average_congestion, summary.risk.max_congestion, summary.risk.overall_risk
    );
    println!(
        "Depart {} instead of {} ({})",
        format_timestamp(summary.optimization.optimal_departure),
        format_timestamp(summary.optimization.requested_departure),
        summary.optimization.potential_savings
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Error)
    };

    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("congestion_forecast"), my_code_level)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    let provider: Option<Arc<dyn WeatherProvider>> = args
        .weather_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(|k| Arc::new(OpenWeatherProvider::new(k)) as Arc<dyn WeatherProvider>);
    if provider.is_none() {
        log::info!("No weather API key; forecasts assume neutral weather");
    }

    let config = ENGINE.clone().with_batch_mode(args.batch_mode);
    let shared = SharedEngine::from_artifact_path(&args.artifact, config, provider);

    if let Command::Health = args.command {
        if let Err(e) = shared.get() {
            log::warn!("{}", e);
        }
        return print_json(&shared.status());
    }

    let engine = shared.get()?;

    match args.command {
        Command::Forecast { lat, lon, at } => {
            let at = timestamp_or_now(at.as_deref())?;
            let result = engine
                .predict_single(Location::new(lat, lon)?, at, None)
                .await?;
            print_json(&result)
        }
        Command::Batch { points, at } => {
            let at = timestamp_or_now(at.as_deref())?;
            let locations = points
                .iter()
                .map(|p| parse_point(p))
                .collect::<Result<Vec<_>>>()?;
            print_json(&engine.predict_batch(&locations, at))
        }
        Command::Timeseries {
            lat,
            lon,
            hours_ahead,
            start,
        } => {
            let start = timestamp_or_now(start.as_deref())?;
            let items = engine
                .predict_timeseries(Location::new(lat, lon)?, start, hours_ahead)
                .await?;
            if args.table {
                print_timeseries_table(&items);
                Ok(())
            } else {
                print_json(&items)
            }
        }
        Command::Route {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            departure,
        } => {
            let departure = timestamp_or_now(departure.as_deref())?;
            let summary = engine
                .simulate_route(
                    Location::new(start_lat, start_lon)?,
                    Location::new(end_lat, end_lon)?,
                    departure,
                )
                .await?;
            if args.table {
                print_route_table(&summary);
                Ok(())
            } else {
                print_json(&summary)
            }
        }
        Command::Insights => print_json(&engine.insights(local_now()).await?),
        Command::Health => print_json(&shared.status()),
    }
}
