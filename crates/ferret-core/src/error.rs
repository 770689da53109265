use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("prompt '{0}' cancelled")]
    PromptCancelled(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
