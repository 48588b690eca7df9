use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Internal,
}

/// Error body returned by the interpretation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown suit '{0}'")]
    UnknownSuit(String),
    #[error("unknown arcana '{0}'")]
    UnknownArcana(String),
    #[error("unknown spread '{0}'")]
    UnknownSpread(String),
    #[error("card {card} has an empty {field}")]
    EmptyField { card: CardId, field: &'static str },
}
