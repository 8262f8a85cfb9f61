//! SRV resolution seam.
//!
//! Discovery only needs one question answered: which hosts advertise
//! LDAP service for a name. The trait keeps the orchestrator testable
//! without a live DNS; production uses hickory's tokio resolver with the
//! system configuration.

use async_trait::async_trait;
use dcfind_common::model::ServiceRecord;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::ResolveErrorKind;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[error("SRV lookup for {name} failed: {reason}")]
pub struct ResolutionError {
    pub name: String,
    pub reason: String,
}

#[async_trait]
pub trait SrvResolver: Send + Sync {
    /// Resolve SRV records for `name`.
    ///
    /// A lookup that times out or finds no records yields an empty list;
    /// resolver breakage (no config, I/O trouble) propagates as an error.
    async fn resolve_srv(&self, name: &str) -> Result<Vec<ServiceRecord>, ResolutionError>;
}

pub struct DnsSrvResolver {
    inner: TokioAsyncResolver,
}

impl DnsSrvResolver {
    pub fn from_system_conf() -> anyhow::Result<Self> {
        Ok(Self {
            inner: TokioAsyncResolver::tokio_from_system_conf()?,
        })
    }
}

#[async_trait]
impl SrvResolver for DnsSrvResolver {
    async fn resolve_srv(&self, name: &str) -> Result<Vec<ServiceRecord>, ResolutionError> {
        debug!(%name, "querying DNS for SRV records");

        let lookup = match self.inner.srv_lookup(name).await {
            Ok(lookup) => lookup,
            Err(err) => {
                return match err.kind() {
                    ResolveErrorKind::Timeout => {
                        warn!(%name, "DNS timeout, treating as zero candidates");
                        Ok(Vec::new())
                    }
                    ResolveErrorKind::NoRecordsFound { .. } => {
                        debug!(%name, "no SRV records");
                        Ok(Vec::new())
                    }
                    _ => Err(ResolutionError {
                        name: name.to_string(),
                        reason: err.to_string(),
                    }),
                };
            }
        };

        let records = lookup
            .iter()
            .map(|srv| {
                let mut target = srv.target().to_utf8();
                if target.ends_with('.') {
                    target.pop();
                }
                ServiceRecord::new(target, srv.port(), srv.priority(), srv.weight())
            })
            .collect();
        Ok(records)
    }
}
