//! Checks on URLs handed to us by third-party LNURL servers before we call
//! them.

use std::net::{Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::error::PaywallError;

/// Check if an IPv4 address is private, loopback, or otherwise non-routable.
pub fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()          // 127.0.0.0/8
        || ip.is_private()    // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
        || ip.is_link_local() // 169.254.0.0/16
        || ip.is_broadcast()  // 255.255.255.255
        || ip.is_unspecified() // 0.0.0.0
        || ip.octets()[0] == 100 && (ip.octets()[1] & 0xC0) == 64 // 100.64.0.0/10 (CGNAT)
}

/// Check if an IPv6 address is private, loopback, or otherwise non-routable.
pub fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || {
            let segments = ip.segments();
            // fc00::/7 unique local, fe80::/10 link-local
            (segments[0] & 0xFE00) == 0xFC00
                || (segments[0] & 0xFFC0) == 0xFE80
                || match ip.to_ipv4_mapped() {
                    Some(v4) => is_private_ipv4(&v4),
                    None => false,
                }
        }
}

/// Why `url` must not be called, if it is not a public `https` URL.
fn refusal(url: &Url) -> Option<&'static str> {
    if url.scheme() != "https" {
        return Some("must use https");
    }

    match url.host() {
        Some(url::Host::Ipv4(ip)) if is_private_ipv4(&ip) => Some("private address"),
        Some(url::Host::Ipv6(ip)) if is_private_ipv6(&ip) => Some("private address"),
        Some(url::Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            if domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal")
            {
                Some("local domain")
            } else {
                None
            }
        }
        Some(_) => None,
        None => Some("missing host"),
    }
}

/// Validate an invoice callback URL: HTTPS, public host.
pub fn validate_callback_url(url: &Url) -> Result<(), PaywallError> {
    match refusal(url) {
        Some(msg) => Err(PaywallError::InvoiceRequestFailed(format!(
            "refusing callback {url}: {msg}"
        ))),
        None => Ok(()),
    }
}

/// Validate a discovery URL derived from an uploader-supplied address.
pub fn validate_discovery_url(url: &Url) -> Result<(), PaywallError> {
    match refusal(url) {
        Some(msg) => Err(PaywallError::ResolutionFailed(format!(
            "refusing discovery {url}: {msg}"
        ))),
        None => Ok(()),
    }
}
