use serde::{Deserialize, Serialize};

use crate::error::PaywallError;

/// LNURL-pay discovery document served at `/.well-known/lnurlp/<user>`.
///
/// Fields a server omits decode to their defaults; an LNURL error document
/// (`{"status":"ERROR","reason":...}`) therefore decodes with an empty
/// `callback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    #[serde(default)]
    pub callback: String,
    /// Upper invoice bound in msat. `0` means the server did not say.
    #[serde(default)]
    pub max_sendable: u64,
    /// Lower invoice bound in msat.
    #[serde(default)]
    pub min_sendable: u64,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub tag: String,
}

impl PayResponse {
    pub fn has_callback(&self) -> bool {
        !self.callback.trim().is_empty()
    }

    /// Check `amount_msat` against the advertised sendable range. A zero
    /// bound is treated as absent on that side.
    pub fn check_amount(&self, amount_msat: u64) -> Result<(), PaywallError> {
        let below = self.min_sendable > 0 && amount_msat < self.min_sendable;
        let above = self.max_sendable > 0 && amount_msat > self.max_sendable;
        if below || above {
            return Err(PaywallError::AmountOutOfRange {
                amount_msat,
                min_sendable: self.min_sendable,
                max_sendable: self.max_sendable,
            });
        }
        Ok(())
    }
}

/// Reply of the LNURL-pay callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    /// BOLT11 payment request.
    #[serde(default)]
    pub pr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InvoiceResponse {
    /// The payment request, or the reason the server gave for not issuing one.
    pub fn into_payment_request(self) -> Result<String, PaywallError> {
        if self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ERROR"))
        {
            return Err(PaywallError::InvoiceRequestFailed(format!(
                "payee returned error: {}",
                self.reason.as_deref().unwrap_or("no reason given")
            )));
        }
        let pr = self.pr.trim();
        if pr.is_empty() {
            return Err(PaywallError::InvoiceRequestFailed(
                "payee response has no payment request".to_string(),
            ));
        }
        Ok(pr.to_string())
    }
}
