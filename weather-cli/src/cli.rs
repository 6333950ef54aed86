use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{
    BucketZone, ClientError, Config, Coordinates, ForecastOptions, Language, Location,
    OpenWeatherClient, SavedCity, Theme, Units,
    transform::{forecast_city, normalize_forecast},
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and pick default preferences.
    Configure,

    /// Show current conditions.
    Current {
        #[command(flatten)]
        location: LocationArgs,

        /// Print the normalized record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the daily forecast.
    Forecast {
        #[command(flatten)]
        location: LocationArgs,

        /// Maximum number of days to show.
        #[arg(long, default_value_t = weather_core::DEFAULT_MAX_DAYS)]
        days: usize,

        /// Calendar used to group 3-hour samples into days.
        #[arg(long, value_enum, default_value_t = Bucket::Utc)]
        bucket: Bucket,

        #[arg(long)]
        json: bool,
    },

    /// Show or change stored preferences.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Manage saved cities.
    Cities {
        #[command(subcommand)]
        action: CitiesAction,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City name to search for, e.g. "London" or "London,GB".
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    /// Explicit location if one was given, else the last one used.
    fn resolve(&self, config: &Config) -> Location {
        match (&self.city, self.lat, self.lon) {
            (Some(city), _, _) => Location::City(city.clone()),
            (None, Some(lat), Some(lon)) => Location::Coords(Coordinates { lat, lon }),
            _ => Location::Coords(config.last_location),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bucket {
    /// UTC calendar day.
    Utc,
    /// This machine's timezone.
    Local,
    /// The forecast city's own UTC offset.
    City,
}

#[derive(Debug, Subcommand)]
pub enum PrefsAction {
    Show,
    Set {
        #[arg(long)]
        units: Option<Units>,
        #[arg(long)]
        lang: Option<Language>,
        #[arg(long)]
        theme: Option<Theme>,
        /// Extra attempts for transient network failures.
        #[arg(long)]
        retries: Option<u32>,
    },
    ToggleUnits,
    ToggleTheme,
}

#[derive(Debug, Subcommand)]
pub enum CitiesAction {
    List,
    /// Look a city up and save it.
    Add { city: String },
    Remove { id: u64 },
    /// Show current conditions for a saved city and make it the current location.
    Show {
        id: u64,
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Current { location, json } => {
                let location = location.resolve(&config);
                show_current(&mut config, &location, json).await?;
            }
            Command::Forecast { location, days, bucket, json } => {
                let location = location.resolve(&config);
                show_forecast(&config, &location, days, bucket, json).await?;
            }
            Command::Prefs { action } => prefs(&mut config, action)?,
            Command::Cities { action } => cities(&mut config, action).await?,
        }

        Ok(())
    }
}

fn client(config: &Config) -> Result<OpenWeatherClient> {
    Ok(OpenWeatherClient::new(config.api_key()?)
        .context("Failed to build HTTP client")?
        .with_retry(config.retry_policy()))
}

/// Details go to the log, the user gets the short message.
fn user_facing(err: ClientError) -> anyhow::Error {
    tracing::debug!(error = ?err, "Weather request failed");
    anyhow!(err.user_message())
}

fn configure(config: &mut Config) -> Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key prompt cancelled")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let units = Select::new("Units:", vec![Units::Metric, Units::Imperial])
        .with_starting_cursor(usize::from(config.units == Units::Imperial))
        .prompt()
        .context("Units prompt cancelled")?;

    let language = Select::new("Language:", vec![Language::En, Language::Es])
        .with_starting_cursor(usize::from(config.language == Language::Es))
        .prompt()
        .context("Language prompt cancelled")?;

    config.set_api_key(api_key.trim().to_string());
    config.units = units;
    config.language = language;
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show_current(config: &mut Config, location: &Location, json: bool) -> Result<()> {
    let current = client(config)?
        .current(location, config.units, config.language)
        .await
        .map_err(user_facing)?;

    if config.last_location != current.coordinates {
        config.last_location = current.coordinates;
        config.save()?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&current)?);
    } else {
        output::print_current(&current, config.units, config.language);
    }
    Ok(())
}

async fn show_forecast(
    config: &Config,
    location: &Location,
    days: usize,
    bucket: Bucket,
    json: bool,
) -> Result<()> {
    let payload = client(config)?
        .forecast_payload(location, config.units, config.language)
        .await
        .map_err(user_facing)?;

    let city = forecast_city(&payload).map_err(|e| user_facing(e.into()))?;

    let zone = match bucket {
        Bucket::Utc => BucketZone::Utc,
        Bucket::Local => BucketZone::Local,
        Bucket::City => city.as_ref().and_then(|c| c.zone).unwrap_or_else(|| {
            tracing::warn!("Forecast has no city offset, grouping by UTC day");
            BucketZone::Utc
        }),
    };

    let options = ForecastOptions { max_days: days, zone };
    let daily = normalize_forecast(&payload, &options).map_err(|e| user_facing(e.into()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&daily)?);
    } else {
        let title = city
            .and_then(|c| c.name.map(|name| output::place(&name, c.country.as_deref())))
            .unwrap_or_else(|| location.to_string());
        output::print_forecast(&title, &daily, config.units, config.language, zone);
    }
    Ok(())
}

fn prefs(config: &mut Config, action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show => {}
        PrefsAction::Set { units, lang, theme, retries } => {
            if let Some(units) = units {
                config.units = units;
            }
            if let Some(lang) = lang {
                config.language = lang;
            }
            if let Some(theme) = theme {
                config.theme = theme;
            }
            if let Some(retries) = retries {
                config.retries = retries;
            }
            config.save()?;
        }
        PrefsAction::ToggleUnits => {
            config.toggle_units();
            config.save()?;
        }
        PrefsAction::ToggleTheme => {
            config.toggle_theme();
            config.save()?;
        }
    }

    output::print_prefs(config);
    Ok(())
}

async fn cities(config: &mut Config, action: CitiesAction) -> Result<()> {
    match action {
        CitiesAction::List => output::print_cities(&config.saved_cities, config.language),
        CitiesAction::Add { city } => {
            let current = client(config)?
                .current(&Location::City(city), config.units, config.language)
                .await
                .map_err(user_facing)?;

            let saved = SavedCity::from_current(&current, config.units);
            let label = output::place(&saved.name, Some(saved.country.as_str()));
            if config.add_saved_city(saved) {
                config.save()?;
                println!("Saved {label} (id {})", current.id);
            } else {
                println!("{label} is already saved");
            }
        }
        CitiesAction::Remove { id } => {
            if !config.remove_saved_city(id) {
                bail!("No saved city with id {id}");
            }
            config.save()?;
            println!("Removed city {id}");
        }
        CitiesAction::Show { id, json } => {
            let city = config
                .saved_city(id)
                .ok_or_else(|| anyhow!("No saved city with id {id}"))?;
            let location = Location::Coords(city.coordinates);
            show_current(config, &location, json).await?;
        }
    }

    Ok(())
}
