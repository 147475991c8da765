//! Prompt-driven dashboard: search box, location picker and card menu.

use std::fmt;

use anyhow::Result;
use dashboard_core::{
    Config, ForecastOutcome, ForecastView, LocationCandidate, Metric, SearchOutcome,
    SearchSession, SharedTheme, Theme,
    resolver::{MIN_QUERY_LEN, is_searchable},
};
use inquire::{InquireError, Select, Text, validator::Validation};

use crate::render::{self, Cards, format_value};

enum MenuItem {
    Card {
        metric: Metric,
        open: bool,
        current: Option<f64>,
    },
    ToggleTheme(Theme),
    NewSearch,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Card {
                metric,
                open,
                current,
            } => {
                let action = if *open { "Collapse" } else { "Expand" };
                let value = current
                    .map(|v| format_value(*metric, v))
                    .unwrap_or_else(|| "--".into());
                write!(f, "{action} {} ({value})", metric.title())
            }
            MenuItem::ToggleTheme(theme) => write!(f, "Switch to {} theme", theme.toggled()),
            MenuItem::NewSearch => f.write_str("Search another location"),
            MenuItem::Quit => f.write_str("Quit"),
        }
    }
}

/// `Ok(None)` when the user cancelled the prompt (Esc / Ctrl-C).
fn cancellable<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn ask_query() -> Result<Option<String>> {
    cancellable(
        Text::new("Search for a city:")
            .with_validator(|input: &str| {
                if is_searchable(input) {
                    Ok(Validation::Valid)
                } else {
                    Ok(Validation::Invalid(
                        format!("Type at least {MIN_QUERY_LEN} characters").into(),
                    ))
                }
            })
            .prompt(),
    )
}

async fn pick_location(session: &SearchSession) -> Result<Option<LocationCandidate>> {
    loop {
        let Some(query) = ask_query()? else {
            return Ok(None);
        };

        match session.search(&query).await {
            Some(SearchOutcome::Applied(0)) | None => {
                println!("No locations found.");
                continue;
            }
            Some(SearchOutcome::Applied(_)) => {}
            // Only one search runs at a time here, so nothing can supersede it.
            Some(SearchOutcome::Superseded | SearchOutcome::Stale) => continue,
        }

        let picked = cancellable(Select::new("Select a location:", session.results()).prompt())?;
        session.clear();
        if picked.is_some() {
            return Ok(picked);
        }
    }
}

/// Run until the user quits. Theme changes are written to `theme`.
pub async fn run(config: &Config, theme: &SharedTheme) -> Result<()> {
    let session = SearchSession::from_config(config)?;
    let view = ForecastView::from_config(config)?;
    let mut cards = Cards::default();

    'search: loop {
        let Some(location) = pick_location(&session).await? else {
            return Ok(());
        };

        println!("Loading forecast for {}...", location.short_name());
        if let ForecastOutcome::Failed(_) = view.select(location).await {
            if view.bundle().is_some() {
                println!("Could not load the new forecast; keeping the previous one.");
            }
        }

        loop {
            let bundle = view.bundle();
            print!(
                "\n{}",
                render::render_dashboard(
                    view.bundle_location().as_ref(),
                    bundle.as_ref(),
                    &cards,
                    theme.get(),
                )
            );

            let mut items: Vec<MenuItem> = Vec::new();
            if let Some(bundle) = &bundle {
                items.extend(Metric::all().iter().map(|m| MenuItem::Card {
                    metric: *m,
                    open: cards.is_open(*m),
                    current: bundle.current(*m),
                }));
            }
            items.push(MenuItem::ToggleTheme(theme.get()));
            items.push(MenuItem::NewSearch);
            items.push(MenuItem::Quit);

            let Some(choice) = cancellable(Select::new("What next?", items).prompt())? else {
                return Ok(());
            };

            match choice {
                MenuItem::Card { metric, .. } => {
                    cards.toggle(metric);
                }
                MenuItem::ToggleTheme(_) => {
                    theme.toggle();
                }
                MenuItem::NewSearch => continue 'search,
                MenuItem::Quit => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_items_describe_the_toggle() {
        let closed = MenuItem::Card {
            metric: Metric::Temperature,
            open: false,
            current: Some(10.0),
        };
        let open = MenuItem::Card {
            metric: Metric::Visibility,
            open: true,
            current: None,
        };

        assert_eq!(closed.to_string(), "Expand Temperature (10.0°C)");
        assert_eq!(open.to_string(), "Collapse Visibility (--)");
    }

    #[test]
    fn theme_item_names_the_target_theme() {
        assert_eq!(MenuItem::ToggleTheme(Theme::Light).to_string(), "Switch to dark theme");
    }

    #[test]
    fn cancelled_prompt_is_not_an_error() {
        let result: Result<Option<()>> = cancellable(Err(InquireError::OperationCanceled));
        assert!(matches!(result, Ok(None)));
    }
}
