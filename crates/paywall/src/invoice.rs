use std::str::FromStr;

use bitcoin::hashes::Hash as _;
use lightning_invoice::{Bolt11Invoice, Currency};
use url::Url;

use crate::error::PaywallError;

/// A payable invoice and the hash that identifies its payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// BOLT11 string exactly as the payee issued it.
    pub encoded: String,
    pub payment_hash: [u8; 32],
    /// Amount encoded in the invoice, if it carries one.
    pub amount_msat: Option<u64>,
}

impl Invoice {
    pub fn payment_hash_hex(&self) -> String {
        hex::encode(self.payment_hash)
    }
}

/// Decode a BOLT11 string and extract its payment hash.
///
/// Fails on anything that is not a well-formed, correctly signed invoice for
/// `network`.
pub fn decode_invoice(encoded: &str, network: Currency) -> Result<Invoice, PaywallError> {
    let encoded = encoded.trim();
    let parsed = Bolt11Invoice::from_str(encoded)
        .map_err(|e| PaywallError::DecodeFailed(format!("invalid bolt11 invoice: {e}")))?;

    let currency = parsed.currency();
    if currency != network {
        return Err(PaywallError::DecodeFailed(format!(
            "invoice is for {currency:?}, expected {network:?}"
        )));
    }

    Ok(Invoice {
        encoded: encoded.to_string(),
        payment_hash: parsed.payment_hash().to_byte_array(),
        amount_msat: parsed.amount_milli_satoshis(),
    })
}

/// Map a network name (`bitcoin`, `testnet`, `signet`, `regtest`, `simnet`)
/// to the invoice currency it implies.
pub fn parse_network(name: &str) -> Option<Currency> {
    match name.trim().to_ascii_lowercase().as_str() {
        "bitcoin" | "mainnet" => Some(Currency::Bitcoin),
        "testnet" => Some(Currency::BitcoinTestnet),
        "signet" => Some(Currency::Signet),
        "regtest" => Some(Currency::Regtest),
        "simnet" => Some(Currency::Simnet),
        _ => None,
    }
}

/// Build the LNURL-pay callback request: `<callback>?amount=<msat>&comment=<escaped>`.
///
/// Callbacks that already carry a query string get the parameters appended.
pub fn invoice_request_url(
    callback: &str,
    amount_msat: u64,
    comment: &str,
) -> Result<Url, PaywallError> {
    let callback = callback.trim();
    let separator = if callback.contains('?') { '&' } else { '?' };
    let raw = format!(
        "{callback}{separator}amount={amount_msat}&comment={}",
        urlencoding::encode(comment)
    );
    Url::parse(&raw).map_err(|e| {
        PaywallError::InvoiceRequestFailed(format!("invalid callback url {callback:?}: {e}"))
    })
}
