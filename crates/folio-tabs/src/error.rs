//! Tab error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Protected tab: {0}")]
    ProtectedTab(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0} is an invalid direction")]
    InvalidDirection(String),
}
