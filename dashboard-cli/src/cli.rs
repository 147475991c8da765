use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, ForecastOutcome, ForecastView, LocationCandidate, LocationResolver, Metric,
    SharedTheme, Theme,
    resolver::MIN_QUERY_LEN,
};
use inquire::{CustomType, Select, Text};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Hourly weather dashboard")]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard: search, pick a place, browse metric cards.
    Dashboard,

    /// List places matching a name.
    Search {
        /// Place name, at least 3 characters.
        query: String,
    },

    /// Show the next 24 hours for a place.
    Show {
        /// Place name, at least 3 characters.
        query: String,

        /// Which search result to use (1-based).
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        pick: u64,

        /// Expand a metric card (temperature, windSpeed, precipitation, visibility).
        #[arg(long, value_parser = parse_metric)]
        expand: Vec<Metric>,

        /// Expand every card.
        #[arg(long)]
        all: bool,

        /// Print the forecast bundle as JSON instead of cards.
        #[arg(long)]
        json: bool,
    },

    /// Print or change the theme: light, dark or toggle.
    Theme {
        value: Option<String>,
    },

    /// Edit the configuration interactively.
    Configure,
}

fn parse_metric(value: &str) -> anyhow::Result<Metric> {
    Metric::try_from(value)
}

impl Cli {
    pub async fn run(self, mut config: Config) -> anyhow::Result<()> {
        let theme = SharedTheme::new(config.theme);

        match self.command.unwrap_or(Command::Dashboard) {
            Command::Dashboard => {
                interactive::run(&config, &theme).await?;
                if theme.get() != config.theme {
                    config.theme = theme.get();
                    config.save()?;
                }
            }
            Command::Search { query } => {
                let resolver = LocationResolver::from_config(&config)?;
                let candidates = resolver.search(&require_searchable(&query)?).await;

                if candidates.is_empty() {
                    println!("No locations found.");
                }
                for (i, c) in candidates.iter().enumerate() {
                    println!("{}. {}  [{:.4}, {:.4}]", i + 1, c, c.latitude, c.longitude);
                }
            }
            Command::Show {
                query,
                pick,
                expand,
                all,
                json,
            } => {
                let resolver = LocationResolver::from_config(&config)?;
                let candidates = resolver.search(&require_searchable(&query)?).await;

                if candidates.is_empty() {
                    println!("No locations found.");
                    return Ok(());
                }
                let Some(location) = pick_candidate(&candidates, pick) else {
                    return Err(anyhow!(
                        "--pick {pick} is out of range: only {} locations matched '{}'",
                        candidates.len(),
                        query.trim()
                    ));
                };

                let view = ForecastView::from_config(&config)?;
                if let ForecastOutcome::Failed(err) = view.select(location).await {
                    tracing::debug!(error = ?err, "Showing empty dashboard");
                }

                if json {
                    match view.bundle() {
                        Some(bundle) => println!("{}", serde_json::to_string_pretty(&bundle)?),
                        None => println!("null"),
                    }
                    return Ok(());
                }

                let mut cards = render::Cards::default();
                for metric in Metric::all() {
                    if all || expand.contains(metric) {
                        cards.open(*metric);
                    }
                }
                print!(
                    "{}",
                    render::render_dashboard(
                        view.bundle_location().as_ref(),
                        view.bundle().as_ref(),
                        &cards,
                        theme.get(),
                    )
                );
            }
            Command::Theme { value } => match value.as_deref() {
                None => println!("{}", config.theme),
                Some(value) => {
                    let next = if value.eq_ignore_ascii_case("toggle") {
                        theme.toggle()
                    } else {
                        Theme::try_from(value)?
                    };
                    config.theme = next;
                    config.save()?;
                    println!("Theme set to {next}");
                }
            },
            Command::Configure => {
                configure(&mut config)?;
                config.save()?;
                println!("Saved configuration to {}", Config::config_file_path()?.display());
            }
        }

        Ok(())
    }
}

/// The `pick`-th candidate, counting from 1.
fn pick_candidate(candidates: &[LocationCandidate], pick: u64) -> Option<LocationCandidate> {
    let index = usize::try_from(pick.checked_sub(1)?).ok()?;
    candidates.get(index).cloned()
}

fn require_searchable(query: &str) -> anyhow::Result<String> {
    let query = query.trim();
    if !dashboard_core::resolver::is_searchable(query) {
        return Err(anyhow!("Search needs at least {MIN_QUERY_LEN} characters, got '{query}'"));
    }
    Ok(query.to_string())
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    config.geocoding_url = Text::new("Geocoding API base URL:")
        .with_default(&config.geocoding_url)
        .prompt()
        .context("Failed to read geocoding URL")?;

    config.forecast_url = Text::new("Forecast API base URL:")
        .with_default(&config.forecast_url)
        .prompt()
        .context("Failed to read forecast URL")?;

    config.language = Text::new("Language for place names:")
        .with_default(&config.language)
        .prompt()
        .context("Failed to read language")?;

    config.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .with_error_message("Please type a whole number of seconds")
        .prompt()
        .context("Failed to read timeout")?;

    config.retry.max_retries = CustomType::<u32>::new("Retries after a failed request:")
        .with_default(config.retry.max_retries)
        .with_error_message("Please type a whole number")
        .prompt()
        .context("Failed to read retry count")?;

    config.search_debounce_ms = CustomType::<u64>::new("Search debounce (ms):")
        .with_default(config.search_debounce_ms)
        .with_error_message("Please type a whole number of milliseconds")
        .prompt()
        .context("Failed to read debounce")?;

    let themes = vec![Theme::Light, Theme::Dark];
    let start = themes.iter().position(|t| *t == config.theme).unwrap_or(0);
    config.theme = Select::new("Theme:", themes)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read theme")?;

    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_dashboard() {
        let cli = Cli::try_parse_from(["weather-dashboard"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn show_accepts_repeated_expand() {
        let cli = Cli::try_parse_from([
            "weather-dashboard",
            "show",
            "Paris",
            "--expand",
            "temperature",
            "--expand",
            "wind",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Show {
                query,
                pick,
                expand,
                all,
                json,
            }) => {
                assert_eq!(query, "Paris");
                assert_eq!(pick, 1);
                assert_eq!(expand, vec![Metric::Temperature, Metric::WindSpeed]);
                assert!(!all && !json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = Cli::try_parse_from([
            "weather-dashboard",
            "show",
            "Paris",
            "--expand",
            "humidity",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Unknown metric"));
    }

    #[test]
    fn pick_zero_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["weather-dashboard", "show", "Paris", "--pick", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn pick_counts_from_one() {
        let candidates: Vec<LocationCandidate> = ["Paris", "Paris, TX"]
            .into_iter()
            .map(|name| LocationCandidate {
                name: name.to_string(),
                country: "Somewhere".to_string(),
                admin1: None,
                latitude: 0.0,
                longitude: 0.0,
            })
            .collect();

        assert_eq!(pick_candidate(&candidates, 1).unwrap().name, "Paris");
        assert_eq!(pick_candidate(&candidates, 2).unwrap().name, "Paris, TX");
        assert!(pick_candidate(&candidates, 3).is_none());
        assert!(pick_candidate(&candidates, 0).is_none());
    }

    #[test]
    fn verbosity_counts_flags() {
        let cli = Cli::try_parse_from(["weather-dashboard", "-vv", "search", "Paris"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn short_queries_are_refused_before_any_request() {
        let err = require_searchable(" Pa ").unwrap_err();
        assert!(err.to_string().contains("at least 3 characters"));
        assert_eq!(require_searchable(" Paris ").unwrap(), "Paris");
    }
}
