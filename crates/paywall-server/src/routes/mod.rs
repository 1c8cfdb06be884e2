pub mod assets;
pub mod health;
pub mod index;
pub mod upload;

use actix_web::HttpRequest;

use crate::state::AppState;

/// Absolute URL of an asset, rooted at `PUBLIC_BASE_URL` or the request host.
pub fn asset_url(req: &HttpRequest, state: &AppState, identifier: &str) -> String {
    let base = match state.config.public_base_url {
        Some(ref base) => base.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    };
    format!("{base}/assets/{identifier}")
}
