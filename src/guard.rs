use crate::dns::{DnsAnswer, Lookup, RecordType};
use crate::error::PolicyError;
use crate::net::is_valid_domain;

/// Caps the DNS lookups one evaluation may perform.
///
/// One guard is constructed per top-level evaluation and threaded through
/// every recursive redirect, so the ceilings bound the whole chain rather
/// than a single recursion level. Attempted lookups count against the
/// ceiling whether or not they succeed; void (empty or failed) responses are
/// capped separately.
pub struct ResolutionGuard<L> {
    lookup: L,
    max_resolve: u32,
    max_void: u32,
    resolve_count: u32,
    void_count: u32,
}

impl<L: Lookup + Send + Sync> ResolutionGuard<L> {
    pub fn new(lookup: L, max_resolve: u32, max_void: u32) -> Self {
        Self {
            lookup,
            max_resolve,
            max_void,
            resolve_count: 0,
            void_count: 0,
        }
    }

    pub fn resolve_count(&self) -> u32 {
        self.resolve_count
    }

    pub fn void_count(&self) -> u32 {
        self.void_count
    }

    pub fn resolve_limit(&self) -> u32 {
        self.max_resolve
    }

    /// Performs one counted lookup.
    ///
    /// The ceiling check runs before any network access; once the guard is
    /// over budget no further request reaches the collaborator. Failures
    /// raised after the network attempt begins are normalized to the
    /// unclassified kind, with the inner failure chained as cause.
    pub async fn resolve(
        &mut self,
        domain: &str,
        rtype: RecordType,
    ) -> Result<Vec<DnsAnswer>, PolicyError> {
        self.resolve_count += 1;

        if self.resolve_count > self.max_resolve {
            log::warn!(
                "lookup ceiling of {} hit while resolving {domain}",
                self.max_resolve
            );
            return Err(PolicyError::permerror("too many DNS requests"));
        }

        if !is_valid_domain(domain) {
            return Err(PolicyError::permerror(format!("invalid domain {domain}")));
        }

        log::debug!(
            "resolving {rtype} for {domain} (lookup {}/{})",
            self.resolve_count,
            self.max_resolve
        );

        match self.lookup.lookup(domain, rtype).await {
            Some(answers) if !answers.is_empty() => Ok(answers),
            _ => {
                self.void_count += 1;
                let inner = if self.void_count > self.max_void {
                    log::warn!("void ceiling of {} hit while resolving {domain}", self.max_void);
                    PolicyError::unknown("too many void DNS results")
                } else {
                    PolicyError::unknown("DNS call failed")
                };
                Err(PolicyError::unknown("unable to resolve DNS").with_cause(inner))
            }
        }
    }
}
