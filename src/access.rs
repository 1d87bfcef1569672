//! Access control — matches a presented token against the registry.
//!
//! Authentication is pure lookup plus a volatile scan-count bump; whether a
//! scan is evaluated at all (gate closed, no emergency) is the control
//! cycle's responsibility, not this module's.

use log::{info, warn};

use crate::registry::{Registry, TokenName};

/// Outcome of presenting a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Token is registered; the gate may open.
    Granted {
        name: TokenName,
        /// Session scan count for this token, including this grant.
        scan_count: u16,
    },
    /// Token is unknown. No state change.
    Denied,
}

/// Authenticate a presented identifier.
///
/// Exact match on identifier bytes and declared length. On a grant the
/// token's session scan count is incremented; a denial mutates nothing.
pub fn authenticate(registry: &mut Registry, id: &[u8]) -> AccessDecision {
    match registry.find_mut(id) {
        Some(token) => {
            token.scan_count = token.scan_count.saturating_add(1);
            info!(
                "access: granted \"{}\" (scan #{})",
                token.name, token.scan_count
            );
            AccessDecision::Granted {
                name: token.name.clone(),
                scan_count: token.scan_count,
            }
        }
        None => {
            warn!("access: denied unknown token ({} bytes)", id.len());
            AccessDecision::Denied
        }
    }
}
