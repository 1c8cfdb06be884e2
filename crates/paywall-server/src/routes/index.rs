use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::ServerError;
use crate::routes::asset_url;
use crate::state::AppState;

/// One entry of the public asset listing.
#[derive(Debug, Serialize)]
pub struct AssetListing {
    pub url: String,
    pub name: String,
    pub ln_address: String,
    pub price: u64,
    pub currency: String,
}

/// GET / - every asset, newest first
pub async fn list_assets(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let listing: Vec<AssetListing> = state
        .db
        .list_assets()?
        .into_iter()
        .map(|record| AssetListing {
            url: asset_url(&req, &state, &record.identifier),
            name: record.original_name,
            ln_address: record.payment_address,
            price: record.price,
            currency: record.currency,
        })
        .collect();

    Ok(HttpResponse::Ok().json(listing))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(list_assets));
}
