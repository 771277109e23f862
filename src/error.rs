use std::io;

use axum::{http::StatusCode, response::IntoResponse};

use crate::github::StoreError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(&'static str),

    #[error("{0}")]
    InvalidForm(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not Found")]
    NotFound,

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Store(e) => {
                tracing::error!(%e, "file store error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
            .into_response(),
            Error::InvalidForm(s) => (StatusCode::BAD_REQUEST, s.to_string()).into_response(),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            Error::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
            Error::Config(e) => {
                tracing::error!(%e, "config error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Toml(e) => {
                tracing::error!(%e, "toml error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
        }
    }
}
