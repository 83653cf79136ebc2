use std::fmt::Display;

use thiserror::Error;

/// Everything that can go wrong between a search and the map. None of it is
/// fatal: each case ends up as a notice in front of the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExplorerError {
    #[error("Please enter a place name.")]
    EmptySearch,
    #[error("Could not find data for '{place}'.\nDetail: {detail}")]
    NotFound { place: String, detail: String },
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Please enter a custom tag.")]
    EmptyTag,
    #[error("'{0}' is not a valid OSM tag key.")]
    InvalidTag(String),
    #[error("The feature query failed.\nDetail: {0}")]
    Service(String),
    #[error("An error occurred while plotting the data.\n\nDetail: {0}")]
    Plot(String),
}

impl ExplorerError {
    pub fn not_found(place: &str, detail: impl Display) -> Self {
        ExplorerError::NotFound {
            place: place.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn service(detail: impl Display) -> Self {
        ExplorerError::Query(QueryError::Service(detail.to_string()))
    }

    /// Title of the dialog the error is shown in.
    pub fn title(&self) -> &'static str {
        match self {
            ExplorerError::Query(QueryError::Plot(_)) => "Plotting Error",
            _ => "Error",
        }
    }
}
