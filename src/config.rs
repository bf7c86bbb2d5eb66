use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, Subcommand, ValueEnum};
use crate::helpers::retry::RetryPolicy;
use crate::models::rating::ReviewTarget;
use crate::repositories::tomtom_repo::DEFAULT_TOMTOM_URL;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchProvider {
    Backend,
    Tomtom,
}

#[derive(Parser, Clone, Debug)]
#[clap(name = "eat-where", about = "Find somewhere to eat nearby")]
pub struct Config {
    #[clap(env, long)]
    pub api_base_url: String,
    #[clap(env, long, default_value = "")]
    pub tomtom_api_key: String,
    #[clap(env, long, default_value = DEFAULT_TOMTOM_URL)]
    pub tomtom_base_url: String,
    #[clap(env, long, default_value = ".eat-where/session.json")]
    pub session_file: PathBuf,
    #[clap(env, long, default_value_t = 15)]
    pub request_timeout_secs: u64,
    #[clap(env, long, default_value_t = 3)]
    pub retry_limit: usize,
    #[clap(env, long, default_value_t = 250)]
    pub retry_base_delay_ms: u64,
    #[clap(env, long, value_enum, default_value_t = SearchProvider::Backend)]
    pub search_provider: SearchProvider,
    #[clap(subcommand)]
    pub command: Command,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_limit,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Search around a province or the given coordinates
    Search {
        query: Option<String>,
        #[clap(long)]
        province: Option<String>,
        #[clap(long, requires = "lon")]
        lat: Option<f64>,
        #[clap(long, requires = "lat")]
        lon: Option<f64>,
        #[clap(long)]
        radius: Option<u32>,
    },
    /// Add or remove a restaurant from favorites
    Favorite { restaurant_id: String },
    Favorites,
    /// Dishes served by a restaurant
    Menu { restaurant_id: String },
    /// Rate a restaurant or dish from 1 to 5
    Review {
        #[clap(value_enum)]
        target: ReviewTarget,
        target_id: String,
        rating: u8,
        #[clap(default_value = "")]
        comment: String,
    },
    Reviews {
        #[clap(value_enum)]
        target: ReviewTarget,
        target_id: String,
    },
    /// Driving route between two points
    Route {
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    },
    Login {
        email: String,
        #[clap(env = "EAT_WHERE_PASSWORD", long)]
        password: String,
    },
    Logout,
    /// Ask the assistant something; `--route` plans a trip through the given restaurants
    Chat {
        message: Option<String>,
        #[clap(long, num_args = 1..)]
        route: Vec<String>,
    },
}
