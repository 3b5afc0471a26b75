use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

// Dotted labels followed by a 2+ letter TLD. Underscore labels are allowed
// because SPF policies routinely redirect into names like `_spf.example.com`.
static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-A-Za-z0-9_]+\.)+[A-Za-z]{2,}$").unwrap());

/// True when `domain` looks like a resolvable dotted name.
pub fn is_valid_domain(domain: &str) -> bool {
    domain.len() >= 3 && DOMAIN_RE.is_match(domain)
}

/// True for dotted-quad IPv4 or colon-grouped IPv6, including the `::` and
/// `::1` shorthands. Out-of-range octets such as `999.999.999.999` are
/// rejected.
pub fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normal_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("_spf.example.com"));
        assert!(is_valid_domain("mail.sub.example.co.uk"));
        assert!(is_valid_domain("xn--bcher-kva.example"));
    }

    #[test]
    fn rejects_malformed_domains() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("ab"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("example."));
        assert!(!is_valid_domain("-"));
    }

    #[test]
    fn accepts_ipv4_and_ipv6() {
        assert!(is_valid_ip("192.0.2.1"));
        assert!(is_valid_ip("2001:db8::1"));
        assert!(is_valid_ip("::1"));
        assert!(is_valid_ip("::"));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert!(!is_valid_ip("999.999.999.999"));
        assert!(!is_valid_ip("192.0.2"));
        assert!(!is_valid_ip("not-an-ip"));
        assert!(!is_valid_ip(""));
    }
}
