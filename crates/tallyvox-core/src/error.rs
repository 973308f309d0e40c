use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("unsupported rate conversion: {source_rate} Hz -> {target_rate} Hz (source must be a whole multiple of target)")]
    UnsupportedRates { source_rate: u32, target_rate: u32 },
}

#[derive(Debug, Error)]
pub enum SttError {
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to open recognizer session: {0}")]
    SessionOpen(String),

    #[error("recognition failed: {0}")]
    ProcessingFailed(String),

    #[error("speech engine not found: {0}")]
    EngineNotFound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open count store: {0}")]
    Open(String),

    #[error("count store query failed: {0}")]
    Query(String),
}
