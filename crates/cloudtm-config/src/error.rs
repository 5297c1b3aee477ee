use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Config file given by CLOUDTM_CONFIG_PATH does not exist: {0}\n\
        Unset the variable to use .cloudtm/config.json or ~/.config/cloudtm/config.json"
    )]
    ExplicitPathNotFound(PathBuf),

    #[error("Invalid config file: {path}\nReason: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
