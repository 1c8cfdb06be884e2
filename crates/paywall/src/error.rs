use thiserror::Error;

/// Errors returned by paywall operations.
///
/// Every variant is terminal for the flow that produced it; nothing in this
/// crate retries or substitutes a fallback invoice.
#[derive(Debug, Error)]
pub enum PaywallError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("payment address resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("amount {amount_msat} msat outside sendable range [{min_sendable}, {max_sendable}]")]
    AmountOutOfRange {
        amount_msat: u64,
        min_sendable: u64,
        max_sendable: u64,
    },

    #[error("invoice request failed: {0}")]
    InvoiceRequestFailed(String),

    #[error("invoice decode failed: {0}")]
    DecodeFailed(String),

    #[error("preview materialization failed: {0}")]
    MaterializationFailed(String),

    #[error("metadata lookup failed: {0}")]
    Lookup(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl PaywallError {
    /// Short stable label, used for metrics and JSON error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            PaywallError::NotFound(_) => "not_found",
            PaywallError::InvalidAsset(_) => "invalid_asset",
            PaywallError::ResolutionFailed(_) => "resolution_failed",
            PaywallError::AmountOutOfRange { .. } => "amount_out_of_range",
            PaywallError::InvoiceRequestFailed(_) => "invoice_request_failed",
            PaywallError::DecodeFailed(_) => "decode_failed",
            PaywallError::MaterializationFailed(_) => "materialization_failed",
            PaywallError::Lookup(_) => "lookup_failed",
            PaywallError::Storage(_) => "storage_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = PaywallError::AmountOutOfRange {
            amount_msat: 500,
            min_sendable: 1000,
            max_sendable: 2000,
        };
        assert_eq!(
            err.to_string(),
            "amount 500 msat outside sendable range [1000, 2000]"
        );
        assert_eq!(err.kind(), "amount_out_of_range");
    }

    #[test]
    fn io_errors_become_storage() {
        let err: PaywallError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), "storage_error");
    }
}
