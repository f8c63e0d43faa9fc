//! Per-instance NodeInfo health probe and concurrent fan-out over a target list.

mod transport;

pub use transport::{HttpReply, HttpTransport, Transport, TransportError, TransportOptions};

use fedicheck_core::{OutcomeGroups, ProbeOutcome, Target};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Accepted schema relation prefix, matched against each link's `rel`.
    pub schema_prefix: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions { schema_prefix: nodeinfo::DEFAULT_SCHEMA_PREFIX.to_string() }
    }
}

/// Run the check sequence for one target. The first failing stage decides the outcome.
pub async fn probe<T: Transport>(transport: &T, target: &Target, opts: &ProbeOptions) -> ProbeOutcome {
    let name = target.0.as_str();

    match transport.resolve(target.host()).await {
        Ok(addrs) => debug!(instance = name, stage = "resolve", addrs = addrs.len(), "resolved"),
        Err(e) => {
            info!(instance = name, stage = "resolve", error = %e, "unresolved");
            return ProbeOutcome::Unresolved;
        }
    }

    let index = match transport.get(&target.well_known_url()).await {
        Ok(reply) => reply,
        Err(e) => {
            info!(instance = name, stage = "index", error = %e, "not functioning");
            return ProbeOutcome::NotFunctioning;
        }
    };
    if !index.is_success() {
        info!(instance = name, stage = "index", status = index.status, "returning non-success status");
        return ProbeOutcome::WrongCode(index.status);
    }
    debug!(instance = name, stage = "index", "reachable, gathering nodeinfo");

    let list = match nodeinfo::decode_list(&index.body) {
        Ok(list) => list,
        Err(e) => {
            info!(instance = name, stage = "decode_index", error = %e, "nodeinfo list is invalid");
            return ProbeOutcome::MisformattedList;
        }
    };
    debug!(instance = name, stage = "decode_index", links = list.links.len(), "nodeinfo list decoded");

    let Some(href) = list.schema_link(&opts.schema_prefix) else {
        info!(instance = name, stage = "select_link", "no available nodeinfo schema");
        return ProbeOutcome::NoAvailableSchema;
    };
    debug!(instance = name, stage = "select_link", href, "schema link selected");

    let schema = match transport.get(href).await {
        Ok(reply) => reply,
        Err(e) => {
            info!(instance = name, stage = "schema", href, error = %e, "schema href is not accessible");
            return ProbeOutcome::NoAvailableSchema;
        }
    };

    match nodeinfo::decode_schema(&schema.body) {
        Ok(info) => {
            debug!(instance = name, software = %info.software.name, "valid");
            ProbeOutcome::Valid(Box::new(info))
        }
        Err(e) => {
            info!(instance = name, stage = "decode_schema", error = %e, "nodeinfo schema is invalid");
            ProbeOutcome::MisformattedSchema
        }
    }
}

/// Probe every target on its own task and group the outcomes.
///
/// Tasks hand results to this function over a channel sized to the target count,
/// so no send ever waits on another probe. Returns once every task has finished.
pub async fn probe_all<T: Transport>(transport: Arc<T>, targets: Vec<String>, opts: ProbeOptions) -> OutcomeGroups {
    let opts = Arc::new(opts);
    let (tx, mut rx) = mpsc::channel::<(String, ProbeOutcome)>(targets.len().max(1));

    let mut handles = Vec::with_capacity(targets.len());
    for t in targets {
        let txc = tx.clone();
        let transport = transport.clone();
        let opts = opts.clone();
        let name = t.clone();
        handles.push((name, tokio::spawn(async move {
            let target = Target(t);
            let outcome = probe(transport.as_ref(), &target, &opts).await;
            let _ = txc.send((target.0, outcome)).await;
        })));
    }
    drop(tx);

    let mut groups = OutcomeGroups::default();
    while let Some((t, outcome)) = rx.recv().await {
        groups.record(t, outcome);
    }
    for (name, h) in handles {
        if let Err(e) = h.await {
            error!(instance = %name, error = %e, "probe task aborted");
        }
    }
    groups
}
