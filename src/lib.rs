pub mod dns;
pub mod error;
pub mod eval;
pub mod guard;
pub mod net;
pub mod options;
pub mod record;

pub use dns::{DnsAnswer, DnsResolver, DohResolver, Lookup, RecordType};
pub use error::{ErrorKind, PolicyError};
pub use eval::{MechanismMatcher, PolicyOutcome, evaluate_policy, evaluate_policy_with, verify};
pub use guard::ResolutionGuard;
pub use options::{Options, ResolvedOptions};
pub use record::{Qualifier, SpfTerm, parse_term, parse_terms};
