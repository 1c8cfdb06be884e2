use actix_web::http::header;
use actix_web::HttpRequest;
use paywall::{AccessState, JsonFetcher};

use crate::error::ServerError;
use crate::l402::{challenge_header, issue_token, parse_authorization, verify_proof, L402Error};
use crate::metrics::{INVOICES_MINTED, INVOICE_FAILURES};
use crate::state::{AppState, Minter};

/// Outcome of the payment gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Paid,
    /// Not paid; `challenge` is the `WWW-Authenticate` value to send.
    Unpaid { challenge: String },
}

impl Gate {
    pub fn access(&self) -> AccessState {
        match self {
            Gate::Paid => AccessState::Paid,
            Gate::Unpaid { .. } => AccessState::Unpaid,
        }
    }
}

/// Decide whether `req` has paid for `identifier`.
///
/// A valid proof grants access without touching the minter. Anything else
/// mints a fresh invoice and yields a challenge; a failed mint is an error
/// and nothing may be served.
pub async fn check_payment<F: JsonFetcher + Clone>(
    req: &HttpRequest,
    state: &AppState,
    minter: &Minter<F>,
    identifier: &str,
) -> Result<Gate, ServerError> {
    let resource = req.path();
    let secret = &state.config.l402_secret;

    let credentials = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| ServerError::Unauthorized("authorization header is not ASCII".to_string()))?;
            parse_authorization(value).map_err(|e| ServerError::Unauthorized(e.to_string()))?
        }
        None => None,
    };

    if let Some(credentials) = credentials {
        match verify_proof(secret, &credentials, resource) {
            Ok(_) => return Ok(Gate::Paid),
            Err(e @ L402Error::Malformed(_)) => {
                return Err(ServerError::Unauthorized(e.to_string()))
            }
            Err(e) => {
                tracing::debug!(%resource, error = %e, "payment proof rejected, re-challenging");
            }
        }
    }

    let invoice = minter.mint(identifier).await.map_err(|e| {
        INVOICE_FAILURES.with_label_values(&[e.kind()]).inc();
        ServerError::Paywall(e)
    })?;
    INVOICES_MINTED.inc();

    let token = issue_token(
        secret,
        &invoice.payment_hash,
        resource,
        chrono::Utc::now().timestamp(),
    );
    Ok(Gate::Unpaid {
        challenge: challenge_header(&token, &invoice.encoded),
    })
}
