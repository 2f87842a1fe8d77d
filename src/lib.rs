// Expose modules for integration testing
pub mod app_state;
pub mod cache;
pub mod config;
pub mod error;
pub mod fb2;
pub mod fetcher;
pub mod models;
pub mod paginate;
pub mod ranobe;
pub mod routes;
pub mod senkuro;

#[cfg(test)]
mod testing;

// Re-export important types for easier use in tests
pub use app_state::AppState;
pub use cache::CacheManager;
pub use config::Config;
pub use error::RelayError;
pub use fb2::Fb2Builder;
pub use fetcher::{Fetcher, HttpTransport, RetryPolicy};
pub use ranobe::{RanobeClient, RanobeSource};
pub use senkuro::SenkuroService;
