//! Error handling for the point-of-sale client

use std::fmt;
use thiserror::Error;

use mesa_auth::AuthError;
use mesa_postgrest::PostgrestError;

use crate::validation::ValidationErrors;

/// Unified error type
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Database query errors
    #[error("Database error: {0}")]
    Database(#[from] PostgrestError),

    /// A submitted form did not pass validation
    #[error("Invalid form: {0}")]
    Validation(#[from] ValidationErrors),

    /// Confirming a cart with no items
    #[error("The order has no items")]
    EmptyOrder,

    /// The requested row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    pub fn not_found<T: fmt::Display>(what: T) -> Self {
        Error::NotFound(what.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
