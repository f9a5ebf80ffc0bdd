pub type FrameshotResult<T> = Result<T, FrameshotError>;

#[derive(thiserror::Error, Debug)]
pub enum FrameshotError {
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("compose error: {0}")]
    Compose(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameshotError {
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
