use crate::auth::LoginError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::dashboard::FilterError;
use crate::escalas::{DraftError, ExportError};
use crate::store::StoreError;
use crate::sync::SyncError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(StoreError),
    Catalog(CatalogError),
    Login(LoginError),
    Sync(SyncError),
    Drafts(DraftError),
    Export(ExportError),
    Filter(FilterError),
    Validation(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Filter(_)
            | AppError::Drafts(DraftError::Empty | DraftError::Invalid(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Drafts(DraftError::IndexOutOfRange { .. }) => StatusCode::NOT_FOUND,
            AppError::Login(_) => StatusCode::UNAUTHORIZED,
            AppError::Sync(
                SyncError::Transport(_) | SyncError::Upstream { .. } | SyncError::Decode(_),
            ) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Catalog(_)
            | AppError::Sync(_)
            | AppError::Drafts(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Store(err) => write!(f, "storage error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Login(err) => write!(f, "{}", err),
            AppError::Sync(err) => write!(f, "sync error: {}", err),
            AppError::Drafts(err) => write!(f, "drafts error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Filter(err) => write!(f, "{}", err),
            AppError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Login(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::Drafts(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Filter(err) => Some(err),
            AppError::Validation(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    ConfigError => Config,
    TelemetryError => Telemetry,
    std::io::Error => Io,
    axum::Error => Server,
    StoreError => Store,
    CatalogError => Catalog,
    LoginError => Login,
    SyncError => Sync,
    DraftError => Drafts,
    ExportError => Export,
    FilterError => Filter,
);
