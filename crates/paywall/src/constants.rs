/// Millisatoshis per satoshi. LNURL-pay amounts are always in msat.
pub const MSAT_PER_SAT: u64 = 1000;

/// The only currency assets can be priced in.
pub const CURRENCY: &str = "BTC";

/// Path prefix of the LUD-16 lightning address discovery document.
pub const LNURLP_WELL_KNOWN: &str = "/.well-known/lnurlp";

/// Prefix of the comment attached to every invoice request; the asset
/// identifier is appended.
pub const INVOICE_COMMENT_PREFIX: &str = "LSAT invoice for file";

/// Per-request timeout for outbound LNURL calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Gaussian sigma (in source pixels) of the preview blur.
pub const DEFAULT_BLUR_SIGMA: f32 = 24.0;

/// JPEG quality of the stored preview.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Directory name of the protected tier under the assets root.
pub const PROTECTED_TIER_DIR: &str = "paid";

/// Directory name of the public tier under the assets root.
pub const PUBLIC_TIER_DIR: &str = "free";

/// Directory under the assets root where uploads are staged before commit.
pub const STAGING_DIR: &str = ".staging";
