//! Two-tier on-disk layout.
//!
//! ```text
//! <root>/paid/<identifier>   protected original
//! <root>/free/<identifier>   public blurred preview
//! ```
//!
//! The public path of an asset is always its protected path with the tier
//! segment swapped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::{PROTECTED_TIER_DIR, PUBLIC_TIER_DIR, STAGING_DIR};
use crate::error::PaywallError;

/// Which copy of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Protected,
    Public,
}

impl Tier {
    pub fn dir_name(self) -> &'static str {
        match self {
            Tier::Protected => PROTECTED_TIER_DIR,
            Tier::Public => PUBLIC_TIER_DIR,
        }
    }
}

/// Whether the requester has proven payment for the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unpaid,
    Paid,
}

impl AccessState {
    /// The tier this requester may be served.
    pub fn tier(self) -> Tier {
        match self {
            AccessState::Paid => Tier::Protected,
            AccessState::Unpaid => Tier::Public,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessState::Paid => "paid",
            AccessState::Unpaid => "unpaid",
        }
    }
}

/// Reject identifiers that are not a single, plain path segment.
pub fn validate_identifier(identifier: &str) -> Result<(), PaywallError> {
    let bad = identifier.is_empty()
        || identifier == "."
        || identifier.contains("..")
        || identifier.contains(|c| matches!(c, '/' | '\\' | '\0'))
        || identifier.starts_with('.');
    if bad {
        return Err(PaywallError::InvalidAsset(format!(
            "invalid asset identifier: {identifier:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TierLayout {
    root: PathBuf,
}

impl TierLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create both tier directories (and the staging area) if missing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.tier_dir(Tier::Protected))?;
        fs::create_dir_all(self.tier_dir(Tier::Public))?;
        fs::create_dir_all(self.staging_root())?;
        Ok(())
    }

    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.root.join(tier.dir_name())
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn path_for(&self, tier: Tier, identifier: &str) -> Result<PathBuf, PaywallError> {
        validate_identifier(identifier)?;
        Ok(self.tier_dir(tier).join(identifier))
    }

    /// Mirror a protected-tier path into the public tier.
    pub fn public_path_for(&self, protected: &Path) -> Result<PathBuf, PaywallError> {
        let relative = protected
            .strip_prefix(self.tier_dir(Tier::Protected))
            .map_err(|_| {
                PaywallError::InvalidAsset(format!(
                    "{} is not in the protected tier",
                    protected.display()
                ))
            })?;
        let identifier = relative.to_str().ok_or_else(|| {
            PaywallError::InvalidAsset(format!("non-utf8 path {}", protected.display()))
        })?;
        self.path_for(Tier::Public, identifier)
    }
}
