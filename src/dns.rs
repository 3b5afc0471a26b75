use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
};
use url::Url;

/// DNS record types with their wire codes, as carried in the numeric `type`
/// field of DNS-over-HTTPS JSON responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Mx,
    Txt,
    Aaaa,
    Srv,
    Naptr,
    Cert,
    Ds,
    Rrsig,
    Nsec,
    Dnskey,
    Tlsa,
    Caa,
}

impl RecordType {
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Ptr => 12,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Srv => 33,
            RecordType::Naptr => 35,
            RecordType::Cert => 37,
            RecordType::Ds => 43,
            RecordType::Rrsig => 46,
            RecordType::Nsec => 47,
            RecordType::Dnskey => 48,
            RecordType::Tlsa => 52,
            RecordType::Caa => 257,
        }
    }

    pub fn from_code(code: u16) -> Option<RecordType> {
        Some(match code {
            1 => RecordType::A,
            2 => RecordType::Ns,
            5 => RecordType::Cname,
            6 => RecordType::Soa,
            12 => RecordType::Ptr,
            15 => RecordType::Mx,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            33 => RecordType::Srv,
            35 => RecordType::Naptr,
            37 => RecordType::Cert,
            43 => RecordType::Ds,
            46 => RecordType::Rrsig,
            47 => RecordType::Nsec,
            48 => RecordType::Dnskey,
            52 => RecordType::Tlsa,
            257 => RecordType::Caa,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Ns => "NS",
            RecordType::Cname => "CNAME",
            RecordType::Soa => "SOA",
            RecordType::Ptr => "PTR",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Aaaa => "AAAA",
            RecordType::Srv => "SRV",
            RecordType::Naptr => "NAPTR",
            RecordType::Cert => "CERT",
            RecordType::Ds => "DS",
            RecordType::Rrsig => "RRSIG",
            RecordType::Nsec => "NSEC",
            RecordType::Dnskey => "DNSKEY",
            RecordType::Tlsa => "TLSA",
            RecordType::Caa => "CAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rtype = match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "NS" => RecordType::Ns,
            "CNAME" => RecordType::Cname,
            "SOA" => RecordType::Soa,
            "PTR" => RecordType::Ptr,
            "MX" => RecordType::Mx,
            "TXT" => RecordType::Txt,
            "AAAA" => RecordType::Aaaa,
            "SRV" => RecordType::Srv,
            "NAPTR" => RecordType::Naptr,
            "CERT" => RecordType::Cert,
            "DS" => RecordType::Ds,
            "RRSIG" => RecordType::Rrsig,
            "NSEC" => RecordType::Nsec,
            "DNSKEY" => RecordType::Dnskey,
            "TLSA" => RecordType::Tlsa,
            "CAA" => RecordType::Caa,
            other => return Err(format!("unknown DNS record type {other}")),
        };
        Ok(rtype)
    }
}

fn deserialize_record_type<'de, D>(deserializer: D) -> Result<RecordType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Code(u16),
        Name(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Code(code) => RecordType::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown DNS type code {code}"))),
        Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
    }
}

/// One resource-record answer from a lookup. Deserializes directly from the
/// `Answer` entries of Google/Cloudflare DoH JSON, where `type` is numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsAnswer {
    pub name: String,
    #[serde(rename = "type", deserialize_with = "deserialize_record_type")]
    pub rtype: RecordType,
    #[serde(rename = "TTL", default)]
    pub ttl: u32,
    #[serde(default)]
    pub data: Option<String>,
}

/// Lookup collaborator for real or mock DNS transports.
///
/// `None` signals that the transport itself failed; `Some(vec![])` signals a
/// clean zero-answer response. The resolution guard treats both as void.
#[async_trait]
pub trait Lookup {
    async fn lookup(&self, name: &str, rtype: RecordType) -> Option<Vec<DnsAnswer>>;
}

/// System-resolver adapter over trust-dns.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<TokioAsyncResolver>,
}

impl DnsResolver {
    pub fn new() -> anyhow::Result<Self> {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Ok(Self {
            inner: Arc::new(resolver),
        })
    }
}

#[async_trait]
impl Lookup for DnsResolver {
    async fn lookup(&self, name: &str, rtype: RecordType) -> Option<Vec<DnsAnswer>> {
        match rtype {
            RecordType::Txt => {
                let response = self.inner.txt_lookup(name).await.ok()?;
                let answers = response
                    .iter()
                    .map(|txt| {
                        // Character-strings of one TXT record concatenate
                        // into a single policy string (RFC 7208 §3.3).
                        let data: String = txt
                            .txt_data()
                            .iter()
                            .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                            .collect();
                        DnsAnswer {
                            name: name.to_string(),
                            rtype,
                            ttl: 0,
                            data: Some(data),
                        }
                    })
                    .collect();
                Some(answers)
            }
            RecordType::Mx => {
                let response = self.inner.mx_lookup(name).await.ok()?;
                let answers = response
                    .iter()
                    .map(|mx| DnsAnswer {
                        name: name.to_string(),
                        rtype,
                        ttl: 0,
                        data: Some(mx.exchange().to_string()),
                    })
                    .collect();
                Some(answers)
            }
            RecordType::A | RecordType::Aaaa => {
                let response = self.inner.lookup_ip(name).await.ok()?;
                let answers = response
                    .iter()
                    .filter(|ip| match rtype {
                        RecordType::A => ip.is_ipv4(),
                        _ => ip.is_ipv6(),
                    })
                    .map(|ip| DnsAnswer {
                        name: name.to_string(),
                        rtype,
                        ttl: 0,
                        data: Some(ip.to_string()),
                    })
                    .collect();
                Some(answers)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Option<Vec<DnsAnswer>>,
}

/// DNS-over-HTTPS adapter. The target is either a template containing
/// `{domain}`/`{type}` placeholders, or a plain URL that receives `name` and
/// `type` query parameters.
#[derive(Clone)]
pub struct DohResolver {
    target: String,
    client: reqwest::Client,
}

impl DohResolver {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            client: reqwest::Client::new(),
        }
    }

    fn request_url(&self, name: &str, rtype: RecordType) -> Option<Url> {
        if self.target.contains("{domain}") {
            let raw = self
                .target
                .replace("{domain}", name)
                .replace("{type}", rtype.as_str());
            return Url::parse(&raw).ok();
        }

        let mut url = Url::parse(&self.target).ok()?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("type", rtype.as_str());
        Some(url)
    }
}

#[async_trait]
impl Lookup for DohResolver {
    async fn lookup(&self, name: &str, rtype: RecordType) -> Option<Vec<DnsAnswer>> {
        let url = self.request_url(name, rtype)?;

        let response = self
            .client
            .get(url)
            .header("accept", "application/dns-json")
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            log::debug!("resolver answered {} for {name}", response.status());
            return None;
        }

        let body: DohResponse = response.json().await.ok()?;
        Some(body.answer.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_codes_round_trip() {
        for rtype in [
            RecordType::A,
            RecordType::Mx,
            RecordType::Txt,
            RecordType::Aaaa,
            RecordType::Caa,
        ] {
            assert_eq!(RecordType::from_code(rtype.code()), Some(rtype));
        }
        assert_eq!(RecordType::from_code(9999), None);
    }

    #[test]
    fn record_type_parses_from_name() {
        assert_eq!("TXT".parse::<RecordType>().unwrap(), RecordType::Txt);
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("BOGUS".parse::<RecordType>().is_err());
    }

    #[test]
    fn answer_deserializes_from_doh_json() {
        let raw = r#"{
            "name": "example.com.",
            "type": 16,
            "TTL": 300,
            "data": "\"v=spf1 -all\""
        }"#;
        let answer: DnsAnswer = serde_json::from_str(raw).unwrap();
        assert_eq!(answer.rtype, RecordType::Txt);
        assert_eq!(answer.ttl, 300);
        assert!(answer.data.unwrap().contains("v=spf1"));
    }

    #[test]
    fn doh_target_template_is_expanded() {
        let resolver = DohResolver::new("https://dns.example/q/{domain}/{type}");
        let url = resolver.request_url("example.com", RecordType::Txt).unwrap();
        assert_eq!(url.as_str(), "https://dns.example/q/example.com/TXT");
    }

    #[test]
    fn doh_plain_target_gets_query_parameters() {
        let resolver = DohResolver::new("https://dns.google/resolve");
        let url = resolver.request_url("example.com", RecordType::Txt).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dns.google/resolve?name=example.com&type=TXT"
        );
    }

    #[test]
    fn doh_response_without_answers_is_empty() {
        let body: DohResponse = serde_json::from_str(r#"{"Status": 3}"#).unwrap();
        assert!(body.answer.is_none());
    }
}
