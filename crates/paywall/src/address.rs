//! Lightning addresses (LUD-16): `local-part@domain` identifiers that map to
//! an LNURL-pay discovery document at
//! `https://<domain>/.well-known/lnurlp/<local-part>`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::constants::LNURLP_WELL_KNOWN;

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z0-9._%+\-]+)@([a-z0-9.\-]+\.[a-z]{2,24})")
        .expect("lightning address pattern is valid")
});

/// A lightning address split into its two halves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LightningAddress {
    local_part: String,
    domain: String,
}

impl LightningAddress {
    /// Parse a string that must consist of exactly one address.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let caps = ADDRESS_RE.captures(input)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != input.len() {
            return None;
        }
        Some(Self::from_parts(&caps[1], &caps[2]))
    }

    /// Find every address-shaped substring of `input`, in order of appearance.
    pub fn find_all(input: &str) -> Vec<Self> {
        ADDRESS_RE
            .captures_iter(input)
            .map(|caps| Self::from_parts(&caps[1], &caps[2]))
            .collect()
    }

    fn from_parts(local_part: &str, domain: &str) -> Self {
        Self {
            local_part: local_part.to_ascii_lowercase(),
            domain: domain.trim_end_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The LNURL-pay discovery URL for this address.
    pub fn discovery_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "https://{}{}/{}",
            self.domain, LNURLP_WELL_KNOWN, self.local_part
        ))
    }
}

impl fmt::Display for LightningAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_address() {
        let addr = LightningAddress::parse("alice@example.com").unwrap();
        assert_eq!(addr.local_part(), "alice");
        assert_eq!(addr.domain(), "example.com");
        assert_eq!(addr.to_string(), "alice@example.com");
    }

    #[test]
    fn test_parse_rejects_surrounding_text() {
        assert!(LightningAddress::parse("pay alice@example.com please").is_none());
        assert!(LightningAddress::parse("not-an-address").is_none());
        assert!(LightningAddress::parse("").is_none());
    }

    #[test]
    fn test_parse_lowercases() {
        let addr = LightningAddress::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(addr.to_string(), "alice@example.com");
    }

    #[test]
    fn test_discovery_url() {
        let addr = LightningAddress::parse("alice@example.com").unwrap();
        assert_eq!(
            addr.discovery_url().unwrap().as_str(),
            "https://example.com/.well-known/lnurlp/alice"
        );
    }

    #[test]
    fn test_find_all_in_order() {
        let found = LightningAddress::find_all(
            "tips: bob@wallet.example.org, or fallback carol.x@ln.example.net",
        );
        let rendered: Vec<String> = found.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["bob@wallet.example.org", "carol.x@ln.example.net"]
        );
    }

    #[test]
    fn test_find_all_none() {
        assert!(LightningAddress::find_all("not-an-address").is_empty());
        assert!(LightningAddress::find_all("user@localhost").is_empty());
    }
}
