//! # Connection Racing
//!
//! Runs ranked candidates through fixed-size batches. Each batch opens
//! one connection attempt per candidate concurrently, waits until the
//! first candidate proves reachable (or the batch window elapses), then
//! cancels the stragglers and pings only the candidates that answered.
//!
//! The any-of wait is a deliberate latency/completeness trade-off
//! inherited from the discovery protocol's intent: a reachable but
//! slightly slower host in the same batch is dropped for this round.
//! Widening it to an all-of wait would change observable discovery
//! completeness, so it stays.

use dcfind_common::config::RaceConfig;
use dcfind_common::model::{DcInfo, ServiceRecord};
use dcfind_protocols::ldap::NetlogonTransport;
use tokio::net::TcpStream;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::prober::{self, PingContext, ProbeOutcome};

/// Race every candidate and collect the successful ping responses.
///
/// Results preserve candidate rank order within and across batches,
/// never arrival order. Individual candidate failures are logged and
/// absorbed; an empty return is a valid outcome, not an error. With
/// `eager` set, no further batch starts once one response has been
/// collected, but in-flight pings of the current batch still finish.
pub async fn race(
    candidates: &[ServiceRecord],
    context: &PingContext,
    transport: &dyn NetlogonTransport,
    config: &RaceConfig,
) -> Vec<DcInfo> {
    let batch_size = config.batch_size.max(1);
    let mut collected: Vec<DcInfo> = Vec::new();

    for batch in candidates.chunks(batch_size) {
        let reachable = connect_batch(batch, config).await;
        if reachable.is_empty() {
            debug!("no candidate in this batch was reachable");
            continue;
        }

        for idx in reachable {
            let candidate = &batch[idx];
            match prober::probe(candidate, context, transport, config.attempt_timeout).await {
                ProbeOutcome::Success(info) => collected.push(info),
                outcome => {
                    warn!(server = %candidate.target, %outcome, "ping produced no result");
                }
            }
        }

        if config.eager && !collected.is_empty() {
            debug!("eager mode: skipping remaining batches");
            break;
        }
    }

    collected
}

/// Open a connection attempt to every candidate in `batch` and return
/// the indices, in rank order, of those that connected before the any-of
/// condition fired.
///
/// Every attempt still pending at that point is aborted AND joined
/// before this returns, so no canceled attempt outlives the batch or
/// keeps its socket.
async fn connect_batch(batch: &[ServiceRecord], config: &RaceConfig) -> Vec<usize> {
    let mut attempts: JoinSet<(usize, std::io::Result<TcpStream>)> = JoinSet::new();
    for (idx, candidate) in batch.iter().enumerate() {
        let target = candidate.target.clone();
        let port = candidate.port;
        debug!(server = %target, "connecting");
        attempts.spawn(async move { (idx, TcpStream::connect((target.as_str(), port)).await) });
    }

    let window_closes = Instant::now() + config.connect_timeout;
    let mut reachable: Vec<usize> = Vec::new();

    loop {
        match timeout_at(window_closes, attempts.join_next()).await {
            // Batch window elapsed before anyone connected.
            Err(_) => break,
            // Every attempt already resolved.
            Ok(None) => break,
            Ok(Some(joined)) => {
                if note_connect(joined, batch, &mut reachable) {
                    // First reachable candidate ends the wait; take any
                    // attempt that happened to finish in the meantime,
                    // everything else is canceled.
                    while let Some(also_done) = attempts.try_join_next() {
                        note_connect(also_done, batch, &mut reachable);
                    }
                    break;
                }
            }
        }
    }

    attempts.abort_all();
    while attempts.join_next().await.is_some() {}

    reachable.sort_unstable();
    reachable
}

/// Record one resolved connection attempt; returns whether it connected.
fn note_connect(
    joined: Result<(usize, std::io::Result<TcpStream>), JoinError>,
    batch: &[ServiceRecord],
    reachable: &mut Vec<usize>,
) -> bool {
    match joined {
        Ok((idx, Ok(stream))) => {
            // Reachability is all we need here; the ping opens its own
            // session against the same target.
            drop(stream);
            reachable.push(idx);
            true
        }
        Ok((idx, Err(err))) => {
            warn!(server = %batch[idx].target, %err, "connect failed");
            false
        }
        Err(err) => {
            debug!(%err, "connect attempt did not finish");
            false
        }
    }
}
