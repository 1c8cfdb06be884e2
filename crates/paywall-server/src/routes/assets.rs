use actix_files::NamedFile;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use paywall::{tiers::validate_identifier, JsonFetcher, PaywallError, Tier};

use crate::error::ServerError;
use crate::metrics::ASSET_REQUESTS;
use crate::middleware::{check_payment, Gate};
use crate::state::{AppState, Minter};

fn missing(identifier: &str) -> ServerError {
    ServerError::Paywall(PaywallError::NotFound(identifier.to_string()))
}

/// GET /assets/{file}
///
/// Paid requests get the original. Everyone else gets 402 with a fresh
/// invoice in `WWW-Authenticate` and the blurred preview as the body.
pub async fn get_asset<F: JsonFetcher + Clone + 'static>(
    req: HttpRequest,
    state: web::Data<AppState>,
    minter: web::Data<Minter<F>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let identifier = path.into_inner();
    validate_identifier(&identifier)?;

    let gate = check_payment(&req, &state, &minter, &identifier).await?;
    ASSET_REQUESTS
        .with_label_values(&[gate.access().as_str()])
        .inc();

    match gate {
        Gate::Paid => {
            let original = state.layout.path_for(Tier::Protected, &identifier)?;
            let file = NamedFile::open_async(&original)
                .await
                .map_err(|_| missing(&identifier))?;
            Ok(file.into_response(&req))
        }
        Gate::Unpaid { challenge } => {
            let preview = state.layout.path_for(Tier::Public, &identifier)?;
            let bytes = tokio::fs::read(&preview)
                .await
                .map_err(|_| missing(&identifier))?;
            Ok(HttpResponse::PaymentRequired()
                .insert_header((header::WWW_AUTHENTICATE, challenge))
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .content_type("image/jpeg")
                .body(bytes))
        }
    }
}

pub fn configure<F: JsonFetcher + Clone + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/assets/{file}", web::get().to(get_asset::<F>));
}
