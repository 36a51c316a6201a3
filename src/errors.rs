use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::ErrorBody;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
  /// The message names every required field, never just the missing one.
  #[error("{0}")]
  MissingField(&'static str),
  #[error("internal failure: {0:#}")]
  Internal(#[from] anyhow::Error),
}

impl RelayError {
  pub fn status(&self) -> StatusCode {
    match self {
      RelayError::MissingField(_) => StatusCode::BAD_REQUEST,
      RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let status = self.status();
    let error = match self {
      RelayError::MissingField(message) => message.to_string(),
      RelayError::Internal(err) => {
        tracing::error!(error = %format!("{err:#}"), "chat relay failed");
        INTERNAL_ERROR_MESSAGE.to_string()
      }
    };
    (status, Json(ErrorBody { error })).into_response()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  #[error("unknown model: {0}")]
  UnknownModel(String),
  #[error("local store failed: {0:#}")]
  Store(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_field_is_a_client_error() {
    let err = RelayError::MissingField("Message and threadId are required!");
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Message and threadId are required!");
  }

  #[test]
  fn internal_failure_hides_cause_from_response() {
    let err = RelayError::from(anyhow::anyhow!("upstream exploded"));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
