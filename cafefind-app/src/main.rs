mod replay;
mod search;
mod store;

use std::{path::PathBuf, str::FromStr};

use chrono::Utc;
use clap::{Parser, Subcommand};

use cafefind_logic::{
    Location, clear_history, grouped_by_day, load_favorites, load_history, prelude::*,
    remove_favorite, remove_visit, toggle_favorite,
};
use cafefind_places::{Category, DEFAULT_LIMIT, DEFAULT_RADIUS_M};

use crate::store::JsonStore;

/// "lat,long" pair on the command line
#[derive(Debug, Clone, Copy)]
struct LatLong(Location);

impl FromStr for LatLong {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, long) = s
            .split_once(',')
            .ok_or_else(|| "Expected lat,long".to_string())?;
        let lat = lat.trim().parse().map_err(|_| "Invalid latitude".to_string())?;
        let long = long
            .trim()
            .parse()
            .map_err(|_| "Invalid longitude".to_string())?;
        Ok(Self(Location::new(lat, long)))
    }
}

#[derive(Parser)]
#[command(name = "cafefind", about = "Find nearby cafés and restaurants")]
struct Cli {
    /// Path of the JSON store file holding favorites, history and session state
    #[arg(long, default_value = "cafefind-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded fix trace through the position tracker
    Replay {
        /// JSON file with a list of fixes ({offset_ms, lat, long, accuracy, speed?})
        trace: PathBuf,
    },
    /// Search for places by free text
    Search {
        query: String,
        /// Skip geocoding and free-text search for the query around this
        /// "lat,long" point
        #[arg(long, allow_hyphen_values = true)]
        near: Option<LatLong>,
        /// Search radius in meters
        #[arg(long, default_value_t = DEFAULT_RADIUS_M)]
        radius: u32,
        /// Place category (cafe, restaurant, fast_food, bar, pub, ice_cream, bakery)
        #[arg(long, default_value_t = Category::Cafe)]
        category: Category,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Show a place's details and record it in the history
    View {
        /// Provider place id
        id: String,
    },
    /// Manage favorite places
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommand,
    },
    /// Manage the viewed-places history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// List favorites, newest first
    List,
    /// Add a place to favorites, or remove it if already there
    Toggle { id: String, name: String },
    /// Remove a place from favorites
    Remove { id: String },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List viewed places grouped by day
    List,
    /// Remove one place from the history
    Remove { id: String },
    /// Clear the whole history
    Clear,
}

fn run_favorites(store: &JsonStore, command: FavoritesCommand) {
    match command {
        FavoritesCommand::List => {
            let favorites = load_favorites(store);
            if favorites.is_empty() {
                println!("No favorites yet");
                return;
            }
            for favorite in favorites {
                println!(
                    "{}  [{}]  added {}",
                    favorite.name,
                    favorite.id,
                    favorite.date.format("%Y-%m-%d")
                );
            }
        }
        FavoritesCommand::Toggle { id, name } => {
            if toggle_favorite(store, &id, &name, Utc::now()) {
                println!("\"{name}\" added to favorites");
            } else {
                println!("\"{name}\" removed from favorites");
            }
        }
        FavoritesCommand::Remove { id } => {
            remove_favorite(store, &id);
            println!("Removed {id}");
        }
    }
}

fn run_history(store: &JsonStore, command: HistoryCommand) {
    match command {
        HistoryCommand::List => {
            let history = load_history(store);
            if history.is_empty() {
                println!("No search history yet");
                return;
            }
            // Newest day first
            for (day, entries) in grouped_by_day(&history).iter().rev() {
                println!("{day}");
                for entry in entries {
                    println!(
                        "  {}  {}  [{}]",
                        entry.viewed_at.format("%H:%M"),
                        entry.name,
                        entry.id
                    );
                }
            }
        }
        HistoryCommand::Remove { id } => {
            remove_visit(store, &id);
            println!("Removed {id}");
        }
        HistoryCommand::Clear => {
            clear_history(store);
            println!("History cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lat_long_parses_and_rejects_garbage() {
        let parsed: LatLong = "-6.2088, 106.8456".parse().unwrap();
        assert_eq!(parsed.0, Location::new(-6.2088, 106.8456));

        assert!("106.8456".parse::<LatLong>().is_err());
        assert!("a,b".parse::<LatLong>().is_err());
    }

    #[test]
    fn search_keeps_the_query_alongside_an_explicit_center() {
        let cli = Cli::try_parse_from([
            "cafefind", "search", "kopi susu", "--near", "-6.2,106.8", "--limit", "5",
        ])
        .unwrap();

        let Commands::Search { query, near, limit, .. } = cli.command else {
            panic!("expected the search subcommand");
        };
        assert_eq!(query, "kopi susu");
        assert_eq!(near.unwrap().0, Location::new(-6.2, 106.8));
        assert_eq!(limit, 5);
    }
}

#[tokio::main]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();
    let store = JsonStore::open(&cli.store)?;

    match cli.command {
        Commands::Replay { trace } => replay::run_replay(&store, &trace).await?,
        Commands::Search {
            query,
            near,
            radius,
            category,
            limit,
        } => {
            search::run_search(&store, &query, near.map(|n| n.0), radius, category, limit).await?
        }
        Commands::View { id } => search::run_view(&store, &id).await?,
        Commands::Favorites { command } => run_favorites(&store, command),
        Commands::History { command } => run_history(&store, command),
    }

    Ok(())
}
