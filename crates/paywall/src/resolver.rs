use crate::address::LightningAddress;
use crate::error::PaywallError;
use crate::fetch::{FetchError, JsonFetcher};
use crate::lnurl::PayResponse;
use crate::validation::validate_discovery_url;

/// Resolves lightning addresses embedded in free text to an LNURL-pay
/// callback.
///
/// Candidates are tried one at a time in order of appearance. A candidate
/// whose discovery document has no callback is skipped; any transport or
/// decode failure ends the resolution immediately without trying the rest.
/// Candidates on private or local hosts are skipped without a lookup unless
/// that check is turned off.
#[derive(Debug, Clone)]
pub struct AddressResolver<F> {
    fetcher: F,
    public_hosts_only: bool,
}

impl<F: JsonFetcher> AddressResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            public_hosts_only: true,
        }
    }

    pub fn with_public_hosts_only(mut self, enabled: bool) -> Self {
        self.public_hosts_only = enabled;
        self
    }

    pub async fn resolve(&self, input: &str) -> Result<PayResponse, PaywallError> {
        let candidates = LightningAddress::find_all(input);
        if candidates.is_empty() {
            return Err(PaywallError::ResolutionFailed(format!(
                "no lightning address in {input:?}"
            )));
        }

        for address in &candidates {
            let url = address.discovery_url().map_err(|e| {
                PaywallError::ResolutionFailed(format!("{address}: bad discovery url: {e}"))
            })?;

            if self.public_hosts_only {
                if let Err(e) = validate_discovery_url(&url) {
                    tracing::warn!(%address, error = %e, "skipping candidate");
                    continue;
                }
            }

            tracing::debug!(%address, %url, "fetching lnurlp discovery document");

            let body = self.fetcher.get_json(&url).await.map_err(|e| match e {
                FetchError::Decode { .. } => {
                    PaywallError::ResolutionFailed(format!("{address}: malformed response: {e}"))
                }
                _ => PaywallError::ResolutionFailed(format!("{address}: {e}")),
            })?;

            let response: PayResponse = serde_json::from_value(body).map_err(|e| {
                PaywallError::ResolutionFailed(format!("{address}: malformed pay response: {e}"))
            })?;

            if response.has_callback() {
                tracing::debug!(%address, callback = %response.callback, "lightning address resolved");
                return Ok(response);
            }

            tracing::debug!(%address, "discovery document has no callback, trying next candidate");
        }

        Err(PaywallError::ResolutionFailed(format!(
            "nothing found in {input:?} ({} candidate(s) tried)",
            candidates.len()
        )))
    }
}
