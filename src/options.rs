use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MAX_RESOLVE: u32 = 10;
pub const DEFAULT_MAX_VOID: u32 = 2;
pub const DEFAULT_RESOLVER_HOST: &str = "https://dns.google/resolve";

// IPv4-mapped IPv6, e.g. `::ffff:192.0.2.1`.
static V4_MAPPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[:A-F0-9]+:((?:\d+\.){3}\d+)$").unwrap());

/// Caller-supplied evaluation options; everything except the client IP can
/// be left out and derived.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Options {
    /// Client IP address.
    pub ip: String,
    /// Envelope sender address.
    pub sender: Option<String>,
    /// Client EHLO/HELO hostname, used as a sender fallback.
    pub helo: Option<String>,
    /// Hostname of the MTA that processes the message. Informational.
    pub mta: Option<String>,
    /// Maximum DNS lookups allowed.
    pub max_resolve_count: Option<u32>,
    /// Maximum void DNS lookups allowed.
    pub max_void_count: Option<u32>,
    /// DNS resolver target URL, optionally templated with
    /// `{domain}`/`{type}` placeholders.
    pub dns_resolver_host: Option<String>,
}

/// Options with every default applied and the sending domain derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub ip: String,
    pub sender: String,
    pub domain: String,
    pub mta: Option<String>,
    pub max_resolve_count: u32,
    pub max_void_count: u32,
    pub dns_resolver_host: String,
}

impl Options {
    /// Applies defaults and derives the sending domain:
    /// - a missing sender becomes `postmaster@{helo}`;
    /// - a sender without `@` becomes `postmaster@{sender}`, one starting
    ///   with `@` gets `postmaster` prefixed;
    /// - an IPv4-mapped IPv6 client address collapses to the embedded IPv4;
    /// - the domain is the lowercased, trimmed part after the last `@`, or
    ///   `-` when nothing remains.
    pub fn resolve(self) -> ResolvedOptions {
        let sender = match self.sender {
            None => format!("postmaster@{}", self.helo.as_deref().unwrap_or_default()),
            Some(s) => match s.find('@') {
                None => format!("postmaster@{s}"),
                Some(0) => format!("postmaster{s}"),
                Some(_) => s,
            },
        };

        let ip = match V4_MAPPED_RE.captures(&self.ip) {
            Some(caps) => caps[1].to_string(),
            None => self.ip,
        };

        let domain = sender
            .rsplit('@')
            .next()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "-".to_string());

        ResolvedOptions {
            ip,
            sender,
            domain,
            mta: self.mta,
            max_resolve_count: self.max_resolve_count.unwrap_or(DEFAULT_MAX_RESOLVE),
            max_void_count: self.max_void_count.unwrap_or(DEFAULT_MAX_VOID),
            dns_resolver_host: self
                .dns_resolver_host
                .unwrap_or_else(|| DEFAULT_RESOLVER_HOST.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let resolved = Options {
            ip: "192.0.2.1".into(),
            sender: Some("user@Example.COM".into()),
            ..Default::default()
        }
        .resolve();

        assert_eq!(resolved.max_resolve_count, 10);
        assert_eq!(resolved.max_void_count, 2);
        assert_eq!(resolved.dns_resolver_host, "https://dns.google/resolve");
        assert_eq!(resolved.domain, "example.com");
    }

    #[test]
    fn missing_sender_falls_back_to_helo() {
        let resolved = Options {
            ip: "192.0.2.1".into(),
            helo: Some("mail.example.org".into()),
            ..Default::default()
        }
        .resolve();

        assert_eq!(resolved.sender, "postmaster@mail.example.org");
        assert_eq!(resolved.domain, "mail.example.org");
    }

    #[test]
    fn bare_domain_sender_gets_postmaster_prefix() {
        let resolved = Options {
            ip: "192.0.2.1".into(),
            sender: Some("example.com".into()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(resolved.sender, "postmaster@example.com");

        let resolved = Options {
            ip: "192.0.2.1".into(),
            sender: Some("@example.com".into()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(resolved.sender, "postmaster@example.com");
    }

    #[test]
    fn v4_mapped_client_ip_collapses_to_ipv4() {
        let resolved = Options {
            ip: "::ffff:192.0.2.7".into(),
            sender: Some("user@example.com".into()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(resolved.ip, "192.0.2.7");
    }

    #[test]
    fn plain_ipv6_is_left_alone() {
        let resolved = Options {
            ip: "2001:db8::1".into(),
            sender: Some("user@example.com".into()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(resolved.ip, "2001:db8::1");
    }
}
