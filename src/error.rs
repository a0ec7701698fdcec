use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("State file parse error: {0}")]
    StateParse(#[from] serde_json::Error),
    #[error("Broadcast rejected with status {status}: {body}")]
    Notify { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;
