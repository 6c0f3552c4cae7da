use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use cityweather_core::{Config, FetchState, ValidationError, WeatherFetchController};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and defaults.
    Configure,

    /// Show current weather for a city once.
    Show {
        /// City name; defaults to the configured default city.
        city: Option<String>,

        /// Print the snapshot as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show the default city, then keep asking for cities until Esc/Ctrl-C.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure().await,
            Command::Show { city, json } => {
                let config = Config::load()?;
                let city = city.unwrap_or_else(|| config.default_city().to_string());
                show(&config, &city, json).await
            }
            Command::Interactive => interactive(&Config::load()?).await,
        }
    }
}

fn controller(config: &Config) -> anyhow::Result<WeatherFetchController> {
    let client = config.client()?;
    Ok(WeatherFetchController::new(Arc::new(client)))
}

async fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let answers = tokio::task::spawn_blocking(move || -> Result<Config, InquireError> {
        let api_key = Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?;
        config.set_api_key(api_key.trim().to_string());

        let city = Text::new("Default city:")
            .with_default(config.default_city())
            .prompt()?;
        config.default_city = Some(city.trim().to_string());

        let lang = Text::new("Language code:")
            .with_default(config.lang())
            .prompt()?;
        config.lang = Some(lang.trim().to_string());

        Ok(config)
    })
    .await
    .context("Configuration prompt panicked")?;

    let config = answers.context("Configuration cancelled")?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config, city: &str, json: bool) -> anyhow::Result<()> {
    let controller = controller(config)?;

    if let Err(ValidationError::EmptyCityName) = controller.submit_query(city) {
        bail!(render::EMPTY_CITY);
    }

    match controller.wait_settled().await {
        FetchState::Ready(model) if json => {
            println!("{}", serde_json::to_string_pretty(&model)?);
            Ok(())
        }
        FetchState::Ready(model) => {
            println!("{}", render::snapshot(&model, &Local));
            Ok(())
        }
        FetchState::Failed(err) => {
            tracing::error!(city, reason = %err.reason(), "lookup failed");
            bail!(render::GENERIC_ERROR)
        }
        FetchState::Idle | FetchState::Loading => bail!(render::GENERIC_ERROR),
    }
}

async fn interactive(config: &Config) -> anyhow::Result<()> {
    let controller = controller(config)?;
    let mut city = config.default_city().to_string();

    loop {
        match controller.submit_query(&city) {
            Ok(_) => {
                println!("{}", render::LOADING);
                print_state(&controller.wait_settled().await);
            }
            Err(ValidationError::EmptyCityName) => println!("{}", render::EMPTY_CITY),
        }

        let answer = tokio::task::spawn_blocking(|| Text::new("City:").prompt())
            .await
            .context("City prompt panicked")?;

        city = match answer {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to read city name"),
        };
    }
}

fn print_state(state: &FetchState) {
    match state {
        FetchState::Ready(model) => println!("{}\n", render::snapshot(model, &Local)),
        FetchState::Failed(err) => {
            tracing::error!(reason = %err.reason(), "lookup failed");
            println!("{}\n", render::GENERIC_ERROR);
        }
        FetchState::Idle | FetchState::Loading => {}
    }
}
