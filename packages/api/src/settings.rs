//! # Client settings
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. built-in defaults,
//! 2. an optional `jobdesk.toml` in the working directory,
//! 3. environment variables prefixed `JOBDESK_` (a `.env` file is loaded first).
//!
//! ```toml
//! [api]
//! url = "https://admin.example.com/api"   # trailing /api optional
//! scheme = "bearer"                        # or "token"
//!
//! [upload]
//! chunk = 1048576     # bytes per chunk
//! retries = 0         # per-chunk retries
//! concurrency = 1     # chunks in flight
//! ceiling = 1.0       # progress reported after the last chunk
//!
//! [query]
//! stale = 300         # seconds a read stays fresh
//! retention = 600     # seconds a read stays cached
//! retries = 1         # automatic retries of a failed read
//! ```
//!
//! Every key maps to an environment variable, e.g. `JOBDESK_API_URL` or
//! `JOBDESK_UPLOAD_CHUNK`.

use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use store::CachePolicy;

use crate::auth::AuthScheme;
use crate::error::Result;
use crate::upload::UploadOptions;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiSettings {
    pub url: String,
    pub scheme: AuthScheme,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadSettings {
    pub chunk: usize,
    pub retries: u32,
    pub concurrency: usize,
    pub ceiling: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuerySettings {
    pub stale: u64,
    pub retention: u64,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub upload: UploadSettings,
    pub query: QuerySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                url: "http://localhost:4000/api".into(),
                scheme: AuthScheme::Bearer,
            },
            upload: UploadSettings {
                chunk: 1024 * 1024,
                retries: 0,
                concurrency: 1,
                ceiling: 1.0,
            },
            query: QuerySettings {
                stale: 300,
                retention: 600,
                retries: 1,
            },
        }
    }
}

impl Settings {
    /// Load from defaults, `jobdesk.toml` and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Self::defaults()?
                .add_source(
                    File::with_name("jobdesk.toml")
                        .format(FileFormat::Toml)
                        .required(false),
                )
                .add_source(
                    Environment::with_prefix("JOBDESK")
                        .separator("_")
                        .try_parsing(true),
                ),
        )
    }

    /// Load from defaults overlaid with a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        Self::from_builder(Self::defaults()?.add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let d = Settings::default();
        Ok(Config::builder()
            .set_default("api.url", d.api.url)?
            .set_default("api.scheme", d.api.scheme.as_str())?
            .set_default("upload.chunk", d.upload.chunk as i64)?
            .set_default("upload.retries", d.upload.retries as i64)?
            .set_default("upload.concurrency", d.upload.concurrency as i64)?
            .set_default("upload.ceiling", d.upload.ceiling)?
            .set_default("query.stale", d.query.stale as i64)?
            .set_default("query.retention", d.query.retention as i64)?
            .set_default("query.retries", d.query.retries as i64)?)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.upload_options()?;
        Ok(settings)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            stale_time: Duration::from_secs(self.query.stale),
            gc_time: Duration::from_secs(self.query.retention),
        }
    }

    pub fn upload_options(&self) -> Result<UploadOptions> {
        UploadOptions::new(self.upload.chunk)
            .with_retries(self.upload.retries)
            .with_concurrency(self.upload.concurrency)
            .with_progress_ceiling(self.upload.ceiling)
            .checked()
    }
}
