use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{CURRENCY, MSAT_PER_SAT};
use crate::error::PaywallError;

/// Metadata of one uploaded asset. Created once at upload, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Generated key, doubles as the file name in both tiers.
    pub identifier: String,
    /// Display-only name the uploader gave the file.
    pub original_name: String,
    /// Lightning address that receives the payment.
    pub payment_address: String,
    /// Unlock price in satoshis, always positive.
    pub price: u64,
    pub currency: String,
    pub created_at: i64,
}

impl AssetRecord {
    /// Price in millisatoshis, the unit LNURL-pay callbacks expect.
    pub fn price_msat(&self) -> Result<u64, PaywallError> {
        self.price.checked_mul(MSAT_PER_SAT).ok_or_else(|| {
            PaywallError::InvalidAsset(format!(
                "price {} sat overflows msat range",
                self.price
            ))
        })
    }
}

/// Upload request before an identifier has been assigned.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub original_name: String,
    pub payment_address: String,
    pub price: i64,
}

impl NewAsset {
    pub fn validate(&self) -> Result<(), PaywallError> {
        if self.payment_address.trim().is_empty() {
            return Err(PaywallError::InvalidAsset(
                "payment address must be set".to_string(),
            ));
        }
        if self.price <= 0 {
            return Err(PaywallError::InvalidAsset(format!(
                "price must be a positive number of sats, got {}",
                self.price
            )));
        }
        if self.original_name.trim().is_empty() {
            return Err(PaywallError::InvalidAsset(
                "file name must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and turn into a record under a freshly generated identifier.
    pub fn into_record(self, created_at: i64) -> Result<AssetRecord, PaywallError> {
        self.validate()?;
        let price = u64::try_from(self.price)
            .map_err(|_| PaywallError::InvalidAsset("price out of range".to_string()))?;
        Ok(AssetRecord {
            identifier: generate_identifier(&self.original_name),
            original_name: self.original_name,
            payment_address: self.payment_address.trim().to_string(),
            price,
            currency: CURRENCY.to_string(),
            created_at,
        })
    }
}

/// `<uuid-v4>_<sanitized file name>`: unique, safe as a single path segment,
/// and still recognisable to whoever uploaded it.
pub fn generate_identifier(original_name: &str) -> String {
    format!("{}_{}", uuid::Uuid::new_v4(), sanitize_filename(original_name))
}

/// Reduce a user-supplied name to its last path component made of
/// `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Read access to the metadata store, the only thing the minting flow needs
/// from it.
pub trait AssetLookup: Send + Sync {
    fn find_asset(&self, identifier: &str) -> Result<Option<AssetRecord>, PaywallError>;
}

impl<T: AssetLookup + ?Sized> AssetLookup for Arc<T> {
    fn find_asset(&self, identifier: &str) -> Result<Option<AssetRecord>, PaywallError> {
        (**self).find_asset(identifier)
    }
}

impl AssetLookup for HashMap<String, AssetRecord> {
    fn find_asset(&self, identifier: &str) -> Result<Option<AssetRecord>, PaywallError> {
        Ok(self.get(identifier).cloned())
    }
}
