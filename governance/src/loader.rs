//! Startup bootstrap: rebuilds governance state from chain history.
//!
//! The chain is the only store, so after the node catches up past the
//! activation height the whole range up to the tip is swept once. Reading
//! blocks from disk dominates the cost, so the range is split into one
//! contiguous slice per core; the per-block merges serialize briefly on the
//! state mutex. Because the merge rules are commutative at startup, slices
//! may deliver blocks in any order.

use crate::chain::{BlockSource, ShutdownFlag};
use crate::error::GovernanceError;
use crate::state::Governance;
use std::sync::Mutex;
use std::thread;
use tracing::{debug, info, warn};

/// Scans `[governance_block, tip]` and replays every block through the
/// connected-block handler, then prunes votes whose backing utxo is no
/// longer unspent (the mempool is ignored, it may not be loaded yet).
///
/// Returns early with `Ok` when governance has not activated. Workers poll
/// the shutdown flag between blocks and abandon their slice when it trips.
pub fn load_governance_data(
    governance: &Governance,
    chain: &dyn BlockSource,
    shutdown: &ShutdownFlag,
) -> Result<(), GovernanceError> {
    let tip = chain.height();
    let activation = governance.params().governance_block;
    if tip == 0 || tip < activation {
        return Ok(());
    }

    let cores = thread::available_parallelism().map_or(1, |n| n.get()) as i32;
    let failures: Mutex<Vec<String>> = Mutex::new(Vec::new());

    info!(from = activation, to = tip, workers = cores, "loading governance data");

    let total = tip - activation;
    let slice = total / cores;
    thread::scope(|scope| {
        for k in 0..cores {
            let start = activation + k * slice;
            // The last slice absorbs the rounding remainder and the tip.
            let end = if k == cores - 1 { tip + 1 } else { start + slice };
            let failures = &failures;
            scope.spawn(move || {
                for height in start..end {
                    if shutdown.requested() {
                        debug!(height, "governance scan interrupted");
                        return;
                    }
                    let Some(block) = chain.read_block(height) else {
                        failures
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .push(format!("failed to read block {} from disk", height));
                        return;
                    };
                    governance.connect_block(&block, height, false);
                }
            });
        }
    });

    if shutdown.requested() {
        return Err(GovernanceError::ShutdownRequested);
    }
    let failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
    if !failures.is_empty() {
        warn!(count = failures.len(), "governance scan reported failures");
        return Err(GovernanceError::Bootstrap(failures.join("; ")));
    }

    // With the complete vote set in memory, drop votes whose utxos were
    // spent later in the chain. Each worker prunes its own shard.
    let votes = governance.votes();
    if votes.is_empty() {
        return Ok(());
    }
    let shard = votes.len().div_ceil(cores as usize);
    thread::scope(|scope| {
        for chunk in votes.chunks(shard) {
            scope.spawn(move || {
                for vote in chunk {
                    if shutdown.requested() {
                        return;
                    }
                    if governance.utxos().is_spent(&vote.utxo(), false) {
                        governance.remove_vote(&vote.hash());
                    }
                }
            });
        }
    });

    if shutdown.requested() {
        return Err(GovernanceError::ShutdownRequested);
    }
    info!(
        proposals = governance.proposals().len(),
        votes = governance.votes().len(),
        "governance data loaded"
    );
    Ok(())
}
