use actix_web::{web, HttpRequest, HttpResponse};
use paywall::{store_upload, NewAsset};
use serde::Deserialize;

use crate::error::ServerError;
use crate::metrics::UPLOADS;
use crate::routes::asset_url;
use crate::state::AppState;

const PRICE_REQUIRED: &str = "Price in sats needs to be specified";
const FIELDS_REQUIRED: &str = "ln address, price and file must be set";
const UPLOAD_OK: &str = "File succesfully uploaded. You can close this page.";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub ln_address: Option<String>,
    pub price: Option<String>,
    pub filename: Option<String>,
}

fn reject(msg: &str) -> ServerError {
    UPLOADS.with_label_values(&["rejected"]).inc();
    ServerError::BadRequest(msg.to_string())
}

/// POST /upload?ln_address=&price=&filename= with the file as the body
pub async fn upload(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<UploadParams>,
    body: web::Bytes,
) -> Result<HttpResponse, ServerError> {
    let params = params.into_inner();

    let price: i64 = params
        .price
        .as_deref()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| reject(PRICE_REQUIRED))?;
    let ln_address = params.ln_address.unwrap_or_default();
    let filename = params.filename.unwrap_or_default();
    if ln_address.trim().is_empty() || price <= 0 || filename.trim().is_empty() || body.is_empty()
    {
        return Err(reject(FIELDS_REQUIRED));
    }

    let record = NewAsset {
        original_name: filename,
        payment_address: ln_address,
        price,
    }
    .into_record(chrono::Utc::now().timestamp())
    .map_err(|e| {
        UPLOADS.with_label_values(&["rejected"]).inc();
        ServerError::Paywall(e)
    })?;

    let layout = state.layout.clone();
    let materializer = state.materializer.clone();
    let identifier = record.identifier.clone();
    let stored = web::block(move || store_upload(&layout, &materializer, &identifier, &body))
        .await
        .map_err(|e| ServerError::Internal(format!("upload worker failed: {e}")))?
        .map_err(|e| {
            UPLOADS.with_label_values(&["failed"]).inc();
            ServerError::Paywall(e)
        })?;

    if let Err(e) = state.db.create_asset(&record) {
        stored.rollback();
        UPLOADS.with_label_values(&["failed"]).inc();
        return Err(e);
    }

    UPLOADS.with_label_values(&["ok"]).inc();
    tracing::info!(
        identifier = %record.identifier,
        price = record.price,
        "asset uploaded"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": UPLOAD_OK,
        "url": asset_url(&req, &state, &record.identifier),
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload", web::post().to(upload));
}
