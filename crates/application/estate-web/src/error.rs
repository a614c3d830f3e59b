//! Web error type

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use estate_config::ConfigError;
use estate_core::Error;

use crate::templates;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Dashboard(#[from] Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Dashboard(err) => match err {
                Error::UnknownView(_) | Error::UnknownCategory(_) => StatusCode::NOT_FOUND,
                Error::UnknownCity(_) | Error::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::StaleView(_) => StatusCode::CONFLICT,
                Error::Network(_) | Error::Load { .. } | Error::MalformedResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                Error::MissingElement(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            WebError::Config(_) | WebError::Io(_) | WebError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, Html(templates::error_html(&self.to_string()))).into_response()
    }
}
