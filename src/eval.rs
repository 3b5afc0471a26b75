use crate::dns::{DohResolver, Lookup, RecordType};
use crate::error::PolicyError;
use crate::guard::ResolutionGuard;
use crate::net::is_valid_ip;
use crate::options::Options;
use crate::record::{self, SPF_VERSION_TAG, SpfTerm};
use futures::future::BoxFuture;

/// Extension seam for `ip4`/`ip6`/`include` authorization matching.
///
/// The engine parses and validates these mechanisms but never evaluates
/// them; an implementation of this trait would decide per mechanism whether
/// `client_ip` is authorized. None ships with the core.
pub trait MechanismMatcher {
    fn matches(&self, term: &SpfTerm, client_ip: &str) -> bool;
}

/// Result of one top-level evaluation, with the guard's final counters for
/// observability.
#[derive(Debug, serde::Serialize)]
pub struct PolicyOutcome {
    pub resolve_count: u32,
    pub void_count: u32,
    pub records: Vec<SpfTerm>,
}

/// Resolves and validates the SPF policy for `domain`, following at most one
/// redirect chain per recursive step. The guard is shared across the whole
/// chain; its ceilings are cumulative.
pub async fn verify<L: Lookup + Send + Sync>(
    domain: &str,
    guard: &mut ResolutionGuard<L>,
    client_ip: &str,
) -> Result<Vec<SpfTerm>, PolicyError> {
    verify_inner(domain.to_owned(), guard, client_ip).await
}

/// Boxed recursive step; one call per domain in the redirect chain.
fn verify_inner<'a, L: Lookup + Send + Sync>(
    domain: String,
    guard: &'a mut ResolutionGuard<L>,
    client_ip: &'a str,
) -> BoxFuture<'a, Result<Vec<SpfTerm>, PolicyError>> {
    Box::pin(async move {
        if !is_valid_ip(client_ip) {
            return Err(PolicyError::permerror(format!("invalid IP {client_ip}")));
        }

        let ascii_domain = idna::domain_to_ascii(&domain)
            .map_err(|_| PolicyError::permerror(format!("invalid domain {domain}")))?;

        let answers = guard.resolve(&ascii_domain, RecordType::Txt).await?;

        // Exactly one answer may carry the version tag.
        let mut body: Option<&str> = None;
        for answer in &answers {
            let Some(data) = answer.data.as_deref() else {
                continue;
            };
            let trimmed = data.trim();
            if trimmed.split_whitespace().next() != Some(SPF_VERSION_TAG) {
                continue;
            }
            if body.is_some() {
                return Err(PolicyError::permerror(format!(
                    "multiple SPF records found for {domain}"
                )));
            }
            if data.bytes().any(|b| !(0x20..=0x7e).contains(&b)) {
                return Err(PolicyError::permerror(
                    "DNS response includes invalid characters",
                ));
            }
            body = Some(trimmed);
        }

        let Some(body) = body else {
            return Err(PolicyError::permerror(format!(
                "no SPF records for {domain}"
            )));
        };

        let terms = record::parse_terms(body.split_whitespace().skip(1));

        let redirect = {
            let mut redirects = terms.iter().filter(|t| t.token() == "redirect");
            let first = redirects.next().cloned();
            if redirects.next().is_some() {
                return Err(PolicyError::permerror("more than 1 redirect found"));
            }
            first
        };

        // An explicit `all` overrides and disables any redirect.
        let has_all = terms.iter().any(|t| t.token() == "all");

        if let Some(redirect) = redirect {
            if !has_all {
                if !redirect.is_valid() {
                    return Err(PolicyError::permerror("unexpected empty value"));
                }
                let target = redirect.host().unwrap_or_default().to_owned();
                log::debug!("{domain} redirects to {target}");
                return verify_inner(target, guard, client_ip).await;
            }
        }

        for term in &terms {
            if !term.is_valid() {
                return Err(PolicyError::permerror("unexpected empty value"));
            }

            match term.token() {
                "redirect" if !has_all => {
                    let target = term.host().unwrap_or_default().to_owned();
                    return verify_inner(target, guard, client_ip).await;
                }
                "all" => {
                    if term.host().is_some() {
                        return Err(PolicyError::permerror(
                            "unexpected extension for all modifier",
                        ));
                    }
                }
                // include/ip4/ip6 and the rest are retained unevaluated; a
                // MechanismMatcher implementation would be consulted here.
                _ => {}
            }
        }

        Ok(terms)
    })
}

/// Evaluates the policy for an explicit domain over the given transport,
/// reporting the guard's final counters alongside the record list.
pub async fn evaluate_policy_with<L: Lookup + Send + Sync>(
    domain: &str,
    client_ip: &str,
    lookup: L,
    max_resolve: u32,
    max_void: u32,
) -> Result<PolicyOutcome, PolicyError> {
    let mut guard = ResolutionGuard::new(lookup, max_resolve, max_void);
    let records = verify(domain, &mut guard, client_ip).await?;

    Ok(PolicyOutcome {
        resolve_count: guard.resolve_count(),
        void_count: guard.void_count(),
        records,
    })
}

/// Top-level entry point: applies option defaults, derives the sending
/// domain, and evaluates over a DNS-over-HTTPS transport.
pub async fn evaluate_policy(options: Options) -> Result<PolicyOutcome, PolicyError> {
    let opts = options.resolve();
    log::info!("checking SPF policy for {} (client {})", opts.domain, opts.ip);

    evaluate_policy_with(
        &opts.domain,
        &opts.ip,
        DohResolver::new(&opts.dns_resolver_host),
        opts.max_resolve_count,
        opts.max_void_count,
    )
    .await
}
