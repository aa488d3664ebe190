// Marketplace Moderation Core
//
// Backend core for the vendor draft review workflow: vendors propose changes
// to marketplace listings (services, vendor profiles), administrators approve,
// reject, or send them back. Architecture follows domain-driven design:
// models own records, the store owns atomicity, actions orchestrate.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;

/// Initializes the tracing subscriber from `RUST_LOG`. Call once at startup.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
