use std::fmt;

/// Version tag marking an SPF record body.
pub const SPF_VERSION_TAG: &str = "v=spf1";

/// Modifier vocabulary. Anything else parses as a mechanism.
pub const SPF_MODIFIERS: [&str; 2] = ["all", "exp"];

/// Mechanism vocabulary, kept verbatim for interoperability.
pub const SPF_MECHANISMS: [&str; 13] = [
    "a", "a:PTR", "a:SPF", "mx", "ip4", "ip6", "all", "ptr", "exists", "ext", "st", "redirect",
    "include",
];

/// Qualifier optionally prefixed onto a raw term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    Neutral,
    Fail,
    Pass,
    SoftFail,
}

impl Qualifier {
    pub fn from_char(c: char) -> Option<Qualifier> {
        match c {
            '?' => Some(Qualifier::Neutral),
            '-' => Some(Qualifier::Fail),
            '+' => Some(Qualifier::Pass),
            '~' => Some(Qualifier::SoftFail),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Qualifier::Neutral => '?',
            Qualifier::Fail => '-',
            Qualifier::Pass => '+',
            Qualifier::SoftFail => '~',
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One parsed term of an SPF record body.
///
/// The modifier variant keeps the raw colon/equals suffix even though a
/// modifier never requires one: the engine rejects `all:extra` as a semantic
/// error, which it can only do if the suffix survives parsing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpfTerm {
    Mechanism {
        token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        qualifier: Option<Qualifier>,
    },
    Modifier {
        token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        qualifier: Option<Qualifier>,
    },
}

impl SpfTerm {
    pub fn token(&self) -> &str {
        match self {
            SpfTerm::Mechanism { token, .. } | SpfTerm::Modifier { token, .. } => token,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            SpfTerm::Mechanism { host, .. } | SpfTerm::Modifier { host, .. } => host.as_deref(),
        }
    }

    pub fn qualifier(&self) -> Option<Qualifier> {
        match self {
            SpfTerm::Mechanism { qualifier, .. } | SpfTerm::Modifier { qualifier, .. } => {
                *qualifier
            }
        }
    }

    pub fn is_mechanism(&self) -> bool {
        matches!(self, SpfTerm::Mechanism { .. })
    }

    /// Structural well-formedness: a mechanism needs a non-empty host, a
    /// modifier is always valid. Semantic checks live in the engine.
    pub fn is_valid(&self) -> bool {
        match self {
            SpfTerm::Mechanism { host, .. } => host.as_deref().is_some_and(|h| !h.is_empty()),
            SpfTerm::Modifier { .. } => true,
        }
    }
}

impl fmt::Display for SpfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = self.qualifier() {
            write!(f, "{q}")?;
        }
        f.write_str(self.token())?;
        if let Some(host) = self.host() {
            // RFC 7208 writes modifiers with '=' and mechanisms with ':'.
            let sep = if matches!(self.token(), "redirect" | "exp") {
                '='
            } else {
                ':'
            };
            write!(f, "{sep}{host}")?;
        }
        Ok(())
    }
}

/// Parses one raw term. Never fails; malformed terms come out structurally
/// incomplete and are rejected by validation later.
pub fn parse_term(raw: &str) -> SpfTerm {
    // Mechanisms attach the host with ':', the redirect/exp modifiers with
    // '='. Split on whichever comes first.
    let (head, host) = match raw.find([':', '=']) {
        Some(idx) => (&raw[..idx], Some(raw[idx + 1..].to_string())),
        None => (raw, None),
    };

    let (token, qualifier) = match head.chars().next().and_then(Qualifier::from_char) {
        Some(q) => (&head[1..], Some(q)),
        None => (head, None),
    };

    if SPF_MODIFIERS.contains(&token) {
        SpfTerm::Modifier {
            token: token.to_string(),
            host,
            qualifier,
        }
    } else {
        SpfTerm::Mechanism {
            token: token.to_string(),
            host,
            qualifier,
        }
    }
}

/// Parses a record body's whitespace-delimited terms (version tag already
/// stripped). Pure; performs no validation and no I/O.
pub fn parse_terms<'a, I>(terms: I) -> Vec<SpfTerm>
where
    I: IntoIterator<Item = &'a str>,
{
    terms
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(parse_term)
        .collect()
}
