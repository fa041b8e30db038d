//! Engine settings, layered the usual way: compiled defaults, then an
//! optional TOML file, then `SCOPECFG_*` environment variables.

use std::path::Path as FsPath;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Maximum number of live change subscriptions.
    #[config(default = 1024, env = "SCOPECFG_MAX_SUBSCRIPTIONS")]
    pub max_subscriptions: usize,

    /// Queued change messages before writers block. 0 means unbounded.
    #[config(default = 256, env = "SCOPECFG_CHANNEL_CAPACITY")]
    pub channel_capacity: usize,
}

impl Settings {
    /// Load defaults, then `file` (missing files are skipped), then env vars.
    pub fn load(file: Option<&FsPath>) -> Result<Self> {
        let mut builder = Settings::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        builder.load().map_err(Error::from)
    }

    /// Parse settings from TOML text, filling defaults for missing keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let layer: <Settings as Config>::Layer =
            toml::from_str(content).map_err(|e| Error::ParseError {
                path: "<inline>".into(),
                source: e,
            })?;
        Settings::builder()
            .preloaded(layer)
            .load()
            .map_err(Error::from)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_subscriptions: 1024,
            channel_capacity: 256,
        }
    }
}
