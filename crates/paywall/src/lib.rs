//! Lightning-gated asset delivery.
//!
//! Every uploaded asset exists in two tiers: the protected original and a
//! heavily blurred public preview. A requester only receives the original
//! after paying a BOLT11 invoice that is minted on demand for the asset's
//! owner.
//!
//! # Pieces
//!
//! - [`AddressResolver`]: turns a lightning address (`alice@example.com`)
//!   into the payee's LNURL-pay callback and sendable bounds
//! - [`InvoiceMinter`]: looks up the asset, resolves its owner, requests an
//!   invoice for the price and decodes the payment hash
//! - [`Materializer`]: derives the blurred preview from the original
//! - [`upload::store_upload`]: writes both tiers as one unit
//!
//! The payment-challenge layer (token encoding, preimage checks) lives with
//! the HTTP server; this crate only mints the invoice it embeds.
//!
//! # Quick example
//!
//! ```no_run
//! use std::time::Duration;
//! use paywall::{HttpFetcher, InvoiceMinter, MinterConfig};
//! # use paywall::{AssetLookup, AssetRecord, PaywallError};
//! # struct Store;
//! # impl AssetLookup for Store {
//! #     fn find_asset(&self, _: &str) -> Result<Option<AssetRecord>, PaywallError> { Ok(None) }
//! # }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fetcher = HttpFetcher::new(Duration::from_secs(10)).unwrap();
//! let minter = InvoiceMinter::new(Store, fetcher, MinterConfig::default());
//!
//! let invoice = minter.mint("3f2a..._cat.png").await.unwrap();
//! println!("pay {} (hash {})", invoice.encoded, invoice.payment_hash_hex());
//! # }
//! ```

pub mod address;
pub mod asset;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod invoice;
pub mod lnurl;
pub mod materializer;
pub mod minter;
pub mod resolver;
pub mod tiers;
pub mod upload;
pub mod validation;

pub use address::LightningAddress;
pub use asset::{AssetLookup, AssetRecord, NewAsset};
pub use constants::*;
pub use error::PaywallError;
pub use fetch::{FetchError, HttpFetcher, JsonFetcher};
pub use invoice::{decode_invoice, parse_network, Invoice};
pub use lightning_invoice::Currency;
pub use lnurl::{InvoiceResponse, PayResponse};
pub use materializer::{BlurSettings, Materializer};
pub use minter::{InvoiceMinter, MinterConfig};
pub use resolver::AddressResolver;
pub use tiers::{AccessState, Tier, TierLayout};
pub use upload::{store_upload, CommittedUpload, StagedUpload};
