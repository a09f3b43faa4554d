use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
