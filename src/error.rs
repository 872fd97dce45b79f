use thiserror::Error;

/// Client-side checks that stop a submission before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a title for the todo.")]
    BlankTitle,

    #[error("Couldn't read \"{0}\" as a date. Use YYYY-MM-DD HH:MM.")]
    InvalidDueDate(String),
}

/// Any failure talking to the todo server.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{method} {url} failed: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("malformed response from {method} {url}: {source}")]
    Decode {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
