use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read client configuration: {0}")]
    LoadError(#[from] Box<figment::Error>),

    #[error("Client configuration file not found: {0}")]
    MissingConfig(String),

    #[error("Client configuration rejected: {0}")]
    InvalidConfig(String),
}
