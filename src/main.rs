//! Command-line entry point.
//!
//! Without a subcommand the calendar is polled until Ctrl-C is pressed. The
//! other subcommands help with setting up the bridge and checking the
//! configuration.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use hue_calendar_rs::{
    CalendarSource, Color, Config, ConnectionManager, IcsCalendar, LightDriver, Scheduler,
    active_colors,
};
use log::info;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "hue-calendar")]
#[command(about = "Signal calendar events with a Philips Hue light", long_about = None)]
struct Cli {
    /// Config file (default: hue-calendar.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// File with environment variables (default: .env)
    #[arg(short, long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the calendar and drive the light (default)
    Run,

    /// Pair with the bridge again and store the new credential
    Pair,

    /// List the lights known to the bridge
    Lights,

    /// Set the configured light to an RGB color (0-255 for each component)
    Color {
        /// Red component (0-255)
        red: u8,
        /// Green component (0-255)
        green: u8,
        /// Blue component (0-255)
        blue: u8,
    },

    /// Turn the configured light off
    Off,

    /// Show the upcoming events and the colors active right now
    Events,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref(), cli.env_file.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_filter()?)
        .parse_default_env()
        .init();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping after the current operation");
            trigger.cancel();
        }
    });

    let connection = ConnectionManager::from_config(&config, cancel.clone())?;
    let mut driver = LightDriver::new(connection, config.transition_timing());
    let light = config.bridge.light_name.as_str();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let calendar = IcsCalendar::from_config(&config)?;
            Scheduler::new(&config, calendar, driver).run(&cancel).await;
        }

        Commands::Pair => {
            println!(
                "Pairing with bridge {}, press its link button...",
                config.bridge.address
            );
            let handle = driver.connection_mut().repair().await?;
            println!(
                "Paired with bridge {}; credential saved to {}",
                handle.bridge_address(),
                config.bridge.credential_path.display()
            );
        }

        Commands::Lights => {
            let lights = driver.connection_mut().session().await?.lights().await?;
            if lights.is_empty() {
                println!("The bridge reports no lights.");
            } else {
                println!("\nFound {} light(s):", lights.len());
                for found in lights {
                    let marker = if found.name() == light { "*" } else { " " };
                    println!("{marker} ID: {:4}  Name: {}", found.id(), found.name());
                }
            }
        }

        Commands::Color { red, green, blue } => {
            let color = Color::rgb(red, green, blue);
            driver
                .set_steady(light, Some(color), &config.brightness())
                .await?;
            println!("Set '{light}' to RGB({red}, {green}, {blue})");
        }

        Commands::Off => {
            driver.set_steady(light, None, &config.brightness()).await?;
            println!("Turned '{light}' off");
        }

        Commands::Events => {
            let calendar = IcsCalendar::from_config(&config)?;
            let time_zone = config.time_zone()?;
            let now = Utc::now();
            let events = calendar.fetch_events(now).await?;

            println!("{} event(s) from {}:", events.len(), calendar.url());
            for event in &events {
                println!(
                    "  {:24} {} - {}",
                    event.title,
                    local_time(event.start, time_zone),
                    local_time(event.end, time_zone)
                );
            }

            let colors = active_colors(&events, now, config.pre_activation(), &config.colors);
            if colors.is_empty() {
                println!("No active events; the light would be off.");
            } else {
                let colors: Vec<String> = colors.iter().map(|c| format!("RGB({c})")).collect();
                println!("Active colors: {}", colors.join(", "));
            }
        }
    }

    Ok(())
}

fn local_time(time: Option<DateTime<Utc>>, time_zone: Tz) -> String {
    time.map_or_else(
        || "?".to_string(),
        |t| t.with_timezone(&time_zone).format("%Y-%m-%d %H:%M").to_string(),
    )
}
