//! Single-candidate Netlogon ping.

use std::fmt;
use std::time::Duration;

use dcfind_common::model::{DcInfo, ServiceRecord};
use dcfind_protocols::ldap::{NetlogonTransport, TransportFault};
use dcfind_protocols::netlogon::{self, NetlogonError};
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

/// Client identity and domain hints carried in every ping of a round.
#[derive(Clone, Debug, Default)]
pub struct PingContext {
    pub domain: Option<String>,
    pub client: Option<String>,
    pub client_fqdn: Option<String>,
}

/// Why a response did not produce a [`DcInfo`].
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("server answered without a netlogon attribute")]
    MissingAttribute,
    #[error(transparent)]
    Netlogon(#[from] NetlogonError),
}

/// Result of probing one candidate. Never retained past the racing
/// round it was produced in.
#[derive(Debug)]
pub enum ProbeOutcome {
    Success(DcInfo),
    Timeout,
    Transport(TransportFault),
    Protocol(ProbeFailure),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success(_) => write!(f, "success"),
            ProbeOutcome::Timeout => write!(f, "timed out"),
            ProbeOutcome::Transport(fault) => write!(f, "{fault}"),
            ProbeOutcome::Protocol(failure) => write!(f, "{failure}"),
        }
    }
}

/// Ping one candidate and decode its answer.
///
/// Exactly one request/response exchange, bounded by `attempt_timeout`.
/// All failure modes are folded into the outcome; this never panics and
/// never aborts anything beyond its own exchange.
pub async fn probe(
    candidate: &ServiceRecord,
    context: &PingContext,
    transport: &dyn NetlogonTransport,
    attempt_timeout: Duration,
) -> ProbeOutcome {
    let filter = netlogon::build_ping_filter(
        context.domain.as_deref(),
        context.client.as_deref(),
        context.client_fqdn.as_deref(),
    );
    debug!(server = %candidate.target, %filter, "dispatching netlogon ping");

    let reply = timeout(
        attempt_timeout,
        transport.netlogon_search(&candidate.target, candidate.port, &filter),
    )
    .await;

    match reply {
        Err(_) => ProbeOutcome::Timeout,
        Ok(Err(fault)) => ProbeOutcome::Transport(fault),
        Ok(Ok(None)) => ProbeOutcome::Protocol(ProbeFailure::MissingAttribute),
        Ok(Ok(Some(payload))) => match netlogon::parse_response(&payload) {
            Ok(info) => {
                debug!(server = %candidate.target, flags = ?netlogon::flag_names(info.flags), "got answer");
                ProbeOutcome::Success(info)
            }
            Err(err) => ProbeOutcome::Protocol(err.into()),
        },
    }
}
