//! Two-phase storage of a new asset.
//!
//! Both tiers are first written into a private staging directory. Only when
//! the preview has been derived successfully are the two files moved into
//! place, so a failed upload never leaves a protected original without its
//! preview (or the other way round).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PaywallError;
use crate::materializer::Materializer;
use crate::tiers::{validate_identifier, Tier, TierLayout};

/// Files of one upload, still in staging. Dropping it discards them.
#[derive(Debug)]
pub struct StagedUpload {
    identifier: String,
    staging: TierLayout,
    preview_ready: bool,
}

impl StagedUpload {
    pub fn begin(layout: &TierLayout, identifier: &str) -> Result<Self, PaywallError> {
        validate_identifier(identifier)?;
        let dir = layout.staging_root().join(uuid::Uuid::new_v4().to_string());
        let staging = TierLayout::new(dir);
        fs::create_dir_all(staging.tier_dir(Tier::Protected))?;
        fs::create_dir_all(staging.tier_dir(Tier::Public))?;
        Ok(Self {
            identifier: identifier.to_string(),
            staging,
            preview_ready: false,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn staged(&self, tier: Tier) -> Result<PathBuf, PaywallError> {
        self.staging.path_for(tier, &self.identifier)
    }

    pub fn write_original(&self, bytes: &[u8]) -> Result<(), PaywallError> {
        fs::write(self.staged(Tier::Protected)?, bytes)?;
        Ok(())
    }

    pub fn derive_preview(&mut self, materializer: &Materializer) -> Result<(), PaywallError> {
        let protected = self.staged(Tier::Protected)?;
        materializer.materialize(&self.staging, &protected)?;
        self.preview_ready = true;
        Ok(())
    }

    /// Move both staged files into `layout`. Fails without touching either
    /// tier if the identifier is already taken.
    pub fn commit(self, layout: &TierLayout) -> Result<CommittedUpload, PaywallError> {
        if !self.preview_ready {
            return Err(PaywallError::MaterializationFailed(format!(
                "no preview derived for {}",
                self.identifier
            )));
        }

        let protected = layout.path_for(Tier::Protected, &self.identifier)?;
        let public = layout.path_for(Tier::Public, &self.identifier)?;
        if protected.exists() || public.exists() {
            return Err(PaywallError::InvalidAsset(format!(
                "asset {} already exists",
                self.identifier
            )));
        }

        fs::rename(self.staged(Tier::Protected)?, &protected)?;
        if let Err(e) = fs::rename(self.staged(Tier::Public)?, &public) {
            if let Err(undo) = fs::remove_file(&protected) {
                tracing::warn!(path = %protected.display(), error = %undo, "rollback failed");
            }
            return Err(e.into());
        }

        tracing::debug!(identifier = %self.identifier, "upload committed");
        Ok(CommittedUpload { protected, public })
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        let dir = self.staging.root();
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to clean staging dir");
            }
        }
    }
}

/// Both tiers of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedUpload {
    pub protected: PathBuf,
    pub public: PathBuf,
}

impl CommittedUpload {
    /// Remove both files again, e.g. when the metadata insert fails.
    pub fn rollback(self) {
        for path in [&self.protected, &self.public] {
            remove_quietly(path);
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove asset file");
    }
}

/// Stage, materialize and commit in one go.
pub fn store_upload(
    layout: &TierLayout,
    materializer: &Materializer,
    identifier: &str,
    bytes: &[u8],
) -> Result<CommittedUpload, PaywallError> {
    let mut staged = StagedUpload::begin(layout, identifier)?;
    staged.write_original(bytes)?;
    staged.derive_preview(materializer)?;
    staged.commit(layout)
}
