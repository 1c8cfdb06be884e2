use actix_web::{HttpResponse, ResponseError};
use paywall::PaywallError;
use std::fmt;

#[derive(Debug)]
pub enum ServerError {
    /// Database error
    Database(rusqlite::Error),
    /// Failure from the paywall core
    Paywall(PaywallError),
    /// Identifier already stored
    AssetExists(String),
    /// Rejected upload or request input
    BadRequest(String),
    /// Unparseable payment proof
    Unauthorized(String),
    /// Internal error
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Database(e) => write!(f, "database error: {}", e),
            ServerError::Paywall(e) => write!(f, "{}", e),
            ServerError::AssetExists(id) => write!(f, "asset already exists: {}", id),
            ServerError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            ServerError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            ServerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, _) = e {
            // SQLITE_CONSTRAINT_PRIMARYKEY
            if err.extended_code == 1555 {
                return ServerError::AssetExists("identifier already taken".to_string());
            }
        }
        ServerError::Database(e)
    }
}

impl From<PaywallError> for ServerError {
    fn from(e: PaywallError) -> Self {
        ServerError::Paywall(e)
    }
}

fn internal() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "internal_error",
        "message": "An internal error occurred"
    }))
}

impl ResponseError for ServerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::Paywall(e) => paywall_error_response(e),
            ServerError::AssetExists(id) => HttpResponse::Conflict().json(serde_json::json!({
                "error": "asset_exists",
                "message": format!("Asset '{}' already exists", id)
            })),
            ServerError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "bad_request",
                "message": msg
            })),
            ServerError::Unauthorized(msg) => {
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "invalid_authorization",
                    "message": msg
                }))
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
            ServerError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
        }
    }
}

fn paywall_error_response(e: &PaywallError) -> HttpResponse {
    let body = serde_json::json!({
        "error": e.kind(),
        "message": e.to_string()
    });
    match e {
        PaywallError::NotFound(_) => HttpResponse::NotFound().json(body),
        PaywallError::InvalidAsset(_) => HttpResponse::BadRequest().json(body),
        PaywallError::ResolutionFailed(_)
        | PaywallError::AmountOutOfRange { .. }
        | PaywallError::InvoiceRequestFailed(_)
        | PaywallError::DecodeFailed(_) => {
            tracing::warn!(kind = e.kind(), "upstream payee error: {}", e);
            HttpResponse::BadGateway().json(body)
        }
        PaywallError::MaterializationFailed(_) => HttpResponse::UnprocessableEntity().json(body),
        PaywallError::Lookup(_) | PaywallError::Storage(_) => {
            tracing::error!(kind = e.kind(), "{}", e);
            internal()
        }
    }
}
