use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::common::MemberId;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Members holding the ADMIN claim, allowed to review drafts.
    pub admin_member_ids: Vec<MemberId>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let admin_member_ids = match env::var("ADMIN_MEMBER_IDS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    MemberId::parse(s)
                        .with_context(|| format!("invalid member id in ADMIN_MEMBER_IDS: {}", s))
                })
                .collect::<Result<Vec<_>>>()?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            admin_member_ids,
        })
    }
}
