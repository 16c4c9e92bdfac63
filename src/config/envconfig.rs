use std::path::Path;

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub trait EnvConfig: Sized + DeserializeOwned {
    /// Variables are read unprefixed (`JWT_SECRET`, `API_KEY`, ...) unless set.
    const PREFIX: Option<&'static str> = None;

    fn load_dotenv() {
        // Load .env from crate root (falls back to current dir if missing)
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let _ = dotenvy::from_filename(manifest_dir.join(".env")).or_else(|_| dotenvy::dotenv());
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();

        let environment = match Self::PREFIX {
            Some(prefix) => config_rs::Environment::with_prefix(prefix).prefix_separator("_"),
            None => config_rs::Environment::default(),
        };

        let settings = config_rs::Config::builder()
            .add_source(environment.try_parsing(true).ignore_empty(true))
            .build()
            .context("failed to read environment variables for config")?;

        let cfg = settings
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}
