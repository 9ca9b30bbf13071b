use clap::{Parser, Subcommand, ValueEnum};
use reqwest::blocking::Client;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use sos_dashboard::config::{load_config, Config};
use sos_dashboard::display;
use sos_dashboard::ingest::http::build_client;
use sos_dashboard::logging::{self, init_logger, LogLevel, Operation};
use sos_dashboard::model::TimeRange;
use sos_dashboard::sensors::NO_SENSORS_IN_BBOX;
use sos_dashboard::state::AppState;
use sos_dashboard::time_codec::TimeCodec;

#[derive(Parser)]
#[command(
    name = "sos_dashboard",
    about = "Browse the sensors and readings of a Sensor Observation Service",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (default: ./sos_dashboard.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SOS server base URL, overrides config and environment
    #[arg(short, long)]
    server: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List every sensor with its details and the overall extent
    Sensors,

    /// List sensors located inside a bounding box
    Filter {
        #[arg(long, allow_negative_numbers = true)]
        min_lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        min_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        max_lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        max_lat: f64,
    },

    /// Fetch the readings of one sensor
    ///
    /// Omitted date/time fields default to the sensor's available data interval.
    Observe {
        /// Full procedure id or bare name
        sensor: String,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        start_time: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        end_time: Option<String>,
    },

    /// Show the local date/time fields of a time interval string
    Interval {
        /// Two timestamps separated by whitespace
        text: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.url = server;
    }

    let level = if cli.verbose { LogLevel::Debug } else { config.log_level() };
    init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    let codec = config.codec();
    let client = build_client(config.server.timeout_secs)?;

    match cli.command {
        Commands::Interval { text } => {
            let range = codec.parse_time_interval(Some(&text));
            print(cli.format, json!(range), || {
                format!(
                    "Start: {} {}\nEnd:   {} {}",
                    range.start_date, range.start_time, range.end_date, range.end_time
                )
            })
        }
        Commands::Sensors => {
            let state = refresh(&client, &config)?;
            print(
                cli.format,
                json!({
                    "sensors": state.sensors(),
                    "features": state.features(),
                    "bbox": state.view_fit(),
                }),
                || {
                    let mut out: Vec<String> =
                        state.sensors().iter().map(display::sensor_summary).collect();
                    match state.view_fit() {
                        Some(bbox) => out.push(format!("Extent: {}", display::format_bbox(&bbox))),
                        None => out.push("Extent: no sensor reported coordinates".to_string()),
                    }
                    out.join("\n\n")
                },
            )
        }
        Commands::Filter { min_lon, min_lat, max_lon, max_lat } => {
            let state = refresh(&client, &config)?;
            let inside = state.filter(min_lon, min_lat, max_lon, max_lat)?;
            print(cli.format, json!(inside), || {
                if inside.is_empty() {
                    NO_SENSORS_IN_BBOX.to_string()
                } else {
                    inside
                        .iter()
                        .map(|s| {
                            format!(
                                "{}  ({})",
                                display::sensor_label(s),
                                display::format_location(s.coordinates)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })
        }
        Commands::Observe { sensor, start_date, start_time, end_date, end_time } => {
            let mut state = refresh(&client, &config)?;
            state.select(&sensor)?;

            let mut range = state.default_range(&codec);
            range.start_date = start_date.unwrap_or(range.start_date);
            range.start_time = start_time.unwrap_or(range.start_time);
            range.end_date = end_date.unwrap_or(range.end_date);
            range.end_time = end_time.unwrap_or(range.end_time);

            observe(&client, &config, &codec, &state, &range, cli.format)
        }
    }
}

fn refresh(client: &Client, config: &Config) -> Result<AppState, Box<dyn Error>> {
    let mut state = AppState::new();
    state.refresh(client, &config.endpoint())?;
    Ok(state)
}

fn observe(
    client: &Client,
    config: &Config,
    codec: &TimeCodec,
    state: &AppState,
    range: &TimeRange,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let readings = state.observe(client, &config.endpoint(), codec, range)?;
    let sensor = state.selected().ok_or("no sensor selected")?;

    logging::debug(
        Operation::System,
        Some(&sensor.id),
        &format!(
            "range {} {} .. {} {}",
            range.start_date, range.start_time, range.end_date, range.end_time
        ),
    );

    print(format, json!({ "sensor": sensor, "readings": readings }), || {
        display::readings_table(sensor, &readings)
    })
}

fn print(
    format: OutputFormat,
    value: serde_json::Value,
    table: impl FnOnce() -> String,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Table => println!("{}", table()),
    }
    Ok(())
}
