use lightning_invoice::Currency;
use url::Url;

use crate::asset::AssetLookup;
use crate::constants::INVOICE_COMMENT_PREFIX;
use crate::error::PaywallError;
use crate::fetch::JsonFetcher;
use crate::invoice::{decode_invoice, invoice_request_url, Invoice};
use crate::lnurl::{InvoiceResponse, PayResponse};
use crate::resolver::AddressResolver;
use crate::validation::validate_callback_url;

#[derive(Debug, Clone)]
pub struct MinterConfig {
    /// Network invoices must be issued for.
    pub network: Currency,
    /// Refuse callbacks that are not public `https` URLs.
    pub strict_callbacks: bool,
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            network: Currency::Bitcoin,
            strict_callbacks: true,
        }
    }
}

/// Mints a fresh invoice for an asset on every call.
///
/// The flow is lookup, resolve, bounds check, request, decode. Each step
/// runs at most once and the first failure ends the flow; nothing is cached
/// and the asset record is only ever read.
pub struct InvoiceMinter<L, F> {
    lookup: L,
    resolver: AddressResolver<F>,
    fetcher: F,
    config: MinterConfig,
}

impl<L, F> InvoiceMinter<L, F>
where
    L: AssetLookup,
    F: JsonFetcher + Clone,
{
    pub fn new(lookup: L, fetcher: F, config: MinterConfig) -> Self {
        Self {
            lookup,
            resolver: AddressResolver::new(fetcher.clone())
                .with_public_hosts_only(config.strict_callbacks),
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn mint(&self, identifier: &str) -> Result<Invoice, PaywallError> {
        let record = self
            .lookup
            .find_asset(identifier)?
            .ok_or_else(|| PaywallError::NotFound(identifier.to_string()))?;

        let pay = self.resolver.resolve(&record.payment_address).await?;

        let amount_msat = record.price_msat()?;
        pay.check_amount(amount_msat)?;

        let comment = format!("{INVOICE_COMMENT_PREFIX} {identifier}");
        let invoice = self.request_invoice(&pay, amount_msat, &comment).await?;

        tracing::info!(
            identifier = %identifier,
            amount_msat,
            payment_hash = %invoice.payment_hash_hex(),
            "invoice minted"
        );
        Ok(invoice)
    }

    /// Ask the payee's callback for an invoice of `amount_msat` and decode it.
    pub async fn request_invoice(
        &self,
        pay: &PayResponse,
        amount_msat: u64,
        comment: &str,
    ) -> Result<Invoice, PaywallError> {
        let url: Url = invoice_request_url(&pay.callback, amount_msat, comment)?;
        if self.config.strict_callbacks {
            validate_callback_url(&url)?;
        }

        tracing::debug!(%url, "requesting invoice");

        let body = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(|e| PaywallError::InvoiceRequestFailed(e.to_string()))?;
        let response: InvoiceResponse = serde_json::from_value(body).map_err(|e| {
            PaywallError::InvoiceRequestFailed(format!("malformed invoice response: {e}"))
        })?;

        let pr = response.into_payment_request()?;
        let invoice = decode_invoice(&pr, self.config.network.clone())?;
        if invoice.amount_msat != Some(amount_msat) {
            return Err(PaywallError::InvoiceRequestFailed(format!(
                "payee returned an invoice for {:?} msat, requested {amount_msat}",
                invoice.amount_msat
            )));
        }
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRecord;
    use crate::fetch::testing::{sample_amountless_invoice, sample_invoice, Reply, StubFetcher};
    use serde_json::json;
    use std::collections::HashMap;

    const DISCOVERY: &str = "https://example.com/.well-known/lnurlp/alice";
    const REQUEST: &str =
        "https://example.com/invoice?amount=500000&comment=LSAT%20invoice%20for%20file%20abc123";

    fn store(address: &str, price: u64) -> HashMap<String, AssetRecord> {
        let record = AssetRecord {
            identifier: "abc123".to_string(),
            original_name: "cat.png".to_string(),
            payment_address: address.to_string(),
            price,
            currency: "BTC".to_string(),
            created_at: 1_700_000_000,
        };
        HashMap::from([(record.identifier.clone(), record)])
    }

    fn discovery(min: u64, max: u64) -> serde_json::Value {
        json!({
            "callback": "https://example.com/invoice",
            "minSendable": min,
            "maxSendable": max,
            "metadata": "[[\"text/plain\",\"alice\"]]",
            "tag": "payRequest"
        })
    }

    fn happy_stub() -> (StubFetcher, [u8; 32]) {
        let (pr, hash) = sample_invoice(Currency::Bitcoin, 500_000);
        let stub = StubFetcher::new()
            .json(DISCOVERY, discovery(1000, 1_000_000))
            .json(REQUEST, json!({"pr": pr, "routes": []}));
        (stub, hash)
    }

    #[tokio::test]
    async fn test_mint_end_to_end() {
        let (stub, hash) = happy_stub();
        let minter = InvoiceMinter::new(
            store("alice@example.com", 500),
            stub.clone(),
            MinterConfig::default(),
        );

        let invoice = minter.mint("abc123").await.unwrap();
        assert_eq!(invoice.payment_hash, hash);
        assert_eq!(stub.calls(), vec![DISCOVERY, REQUEST]);

        let again = decode_invoice(&invoice.encoded, Currency::Bitcoin).unwrap();
        assert_eq!(again.payment_hash, invoice.payment_hash);
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let stub = StubFetcher::new();
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub.clone(), MinterConfig::default());

        let err = minter.mint("nope").await.unwrap_err();
        assert!(matches!(err, PaywallError::NotFound(ref id) if id == "nope"));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_address_makes_no_calls() {
        let stub = StubFetcher::new();
        let minter = InvoiceMinter::new(store("not-an-address", 500), stub.clone(), MinterConfig::default());

        let err = minter.mint("abc123").await.unwrap_err();
        assert!(matches!(err, PaywallError::ResolutionFailed(_)));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_price_outside_sendable_range() {
        let stub = StubFetcher::new().json(DISCOVERY, discovery(1000, 100_000));
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub.clone(), MinterConfig::default());

        let err = minter.mint("abc123").await.unwrap_err();
        assert!(matches!(
            err,
            PaywallError::AmountOutOfRange {
                amount_msat: 500_000,
                ..
            }
        ));
        // Never reached the callback
        assert_eq!(stub.calls(), vec![DISCOVERY]);
    }

    #[tokio::test]
    async fn test_payee_error_reply() {
        let stub = StubFetcher::new()
            .json(DISCOVERY, discovery(1000, 1_000_000_000))
            .json(REQUEST, json!({"status": "ERROR", "reason": "wallet offline"}));
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, MinterConfig::default());

        let err = minter.mint("abc123").await.unwrap_err();
        assert!(matches!(err, PaywallError::InvoiceRequestFailed(_)));
        assert!(err.to_string().contains("wallet offline"));
    }

    #[tokio::test]
    async fn test_callback_unreachable() {
        let stub = StubFetcher::new()
            .json(DISCOVERY, discovery(1000, 1_000_000_000))
            .reply(REQUEST, Reply::Down);
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, MinterConfig::default());

        assert!(matches!(
            minter.mint("abc123").await,
            Err(PaywallError::InvoiceRequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_undecodable_invoice() {
        let stub = StubFetcher::new()
            .json(DISCOVERY, discovery(1000, 1_000_000_000))
            .json(REQUEST, json!({"pr": "lnbc500u1garbage"}));
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, MinterConfig::default());

        assert!(matches!(
            minter.mint("abc123").await,
            Err(PaywallError::DecodeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_invoice_for_wrong_network() {
        let (pr, _) = sample_invoice(Currency::BitcoinTestnet, 500_000);
        let stub = StubFetcher::new()
            .json(DISCOVERY, discovery(1000, 1_000_000_000))
            .json(REQUEST, json!({"pr": pr}));
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, MinterConfig::default());

        assert!(matches!(
            minter.mint("abc123").await,
            Err(PaywallError::DecodeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_invoice_amount_must_match_request() {
        for amount in [Some(1), Some(499_999), None] {
            let pr = match amount {
                Some(msat) => sample_invoice(Currency::Bitcoin, msat).0,
                None => sample_amountless_invoice(Currency::Bitcoin),
            };
            let stub = StubFetcher::new()
                .json(DISCOVERY, discovery(1000, 1_000_000_000))
                .json(REQUEST, json!({"pr": pr}));
            let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, MinterConfig::default());

            let err = minter.mint("abc123").await.unwrap_err();
            assert!(
                matches!(err, PaywallError::InvoiceRequestFailed(_)),
                "{amount:?}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_local_discovery_host_never_fetched() {
        let stub = StubFetcher::new();
        let minter = InvoiceMinter::new(store("x@intranet.local", 500), stub.clone(), MinterConfig::default());

        assert!(matches!(
            minter.mint("abc123").await,
            Err(PaywallError::ResolutionFailed(_))
        ));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_private_callback_refused() {
        let stub = StubFetcher::new().json(
            DISCOVERY,
            json!({"callback": "https://127.0.0.1/invoice", "minSendable": 1000, "maxSendable": 1_000_000_000}),
        );
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub.clone(), MinterConfig::default());

        assert!(matches!(
            minter.mint("abc123").await,
            Err(PaywallError::InvoiceRequestFailed(_))
        ));
        assert_eq!(stub.calls(), vec![DISCOVERY]);
    }

    #[tokio::test]
    async fn test_lenient_callbacks_allow_plain_http() {
        let (pr, hash) = sample_invoice(Currency::Regtest, 500_000);
        let stub = StubFetcher::new()
            .json(
                DISCOVERY,
                json!({"callback": "http://127.0.0.1:3000/cb", "minSendable": 1, "maxSendable": 0}),
            )
            .json(
                "http://127.0.0.1:3000/cb?amount=500000&comment=LSAT%20invoice%20for%20file%20abc123",
                json!({"pr": pr}),
            );
        let config = MinterConfig {
            network: Currency::Regtest,
            strict_callbacks: false,
        };
        let minter = InvoiceMinter::new(store("alice@example.com", 500), stub, config);

        assert_eq!(minter.mint("abc123").await.unwrap().payment_hash, hash);
    }

    #[tokio::test]
    async fn test_repeated_mints_are_independent() {
        let (stub, hash) = happy_stub();
        let records = store("alice@example.com", 500);
        let before = records.clone();
        let minter = InvoiceMinter::new(records, stub.clone(), MinterConfig::default());

        let first = minter.mint("abc123").await.unwrap();
        let second = minter.mint("abc123").await.unwrap();
        assert_eq!(first.payment_hash, hash);
        assert_eq!(second.payment_hash, hash);
        // Every mint goes to the network again
        assert_eq!(stub.calls().len(), 4);
        assert_eq!(minter.lookup(), &before);
    }
}
