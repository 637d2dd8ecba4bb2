//! Error types for the flight-search suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Driver bridge error: {0}")]
    Bridge(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("'{query}' NOT FOUND in dropdown after {attempts} attempt(s)")]
    LocationNotFound { query: String, attempts: usize },

    #[error("Dates were not loaded: calendar page has no selectable days")]
    EmptyCalendar,

    #[error("Day offset {offset} not reachable within {pages} calendar page(s)")]
    DayUnreachable { offset: usize, pages: usize },

    #[error("Calendar did not advance after {attempts} attempt(s)")]
    PaginationStalled { attempts: usize },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl E2eError {
    /// The UI never reached the awaited state.
    pub fn is_timeout(&self) -> bool {
        matches!(self, E2eError::Timeout(_))
    }

    /// The UI rendered, but the wanted content was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            E2eError::LocationNotFound { .. }
                | E2eError::EmptyCalendar
                | E2eError::DayUnreachable { .. }
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
