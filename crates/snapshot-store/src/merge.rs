//! History merge: carry `since` forward for targets still failing the same way.

use crate::models::{CodedRecords, CodedSince, Since, SinceRecords, Snapshot};
use fedicheck_core::OutcomeGroups;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Records for `current`, keeping the prior `since` of targets already in `prior`.
/// Targets only present in `prior` are dropped.
pub fn inherit_since(prior: &SinceRecords, current: &[String], now: OffsetDateTime) -> SinceRecords {
    current
        .iter()
        .map(|t| {
            let since = prior.get(t).copied().unwrap_or(Since(now));
            (t.clone(), since)
        })
        .collect()
}

/// Like [`inherit_since`], but a target only keeps its `since` when the status code is unchanged.
pub fn inherit_since_with_code(prior: &CodedRecords, current: &[(String, u16)], now: OffsetDateTime) -> CodedRecords {
    current
        .iter()
        .map(|(t, code)| {
            let since = match prior.get(t) {
                Some(old) if old.code == *code => old.since,
                _ => Since(now),
            };
            (t.clone(), CodedSince { since, code: *code })
        })
        .collect()
}

/// Build this run's snapshot from the previous one and this run's outcomes.
/// `valid` carries no history and is rebuilt from `groups` alone.
pub fn merge_snapshot(prior: &Snapshot, groups: &OutcomeGroups, now: OffsetDateTime) -> Snapshot {
    Snapshot {
        collected_at: now,
        unresolved: inherit_since(&prior.unresolved, &groups.unresolved, now),
        not_functioning: inherit_since(&prior.not_functioning, &groups.not_functioning, now),
        wrong_code: inherit_since_with_code(&prior.wrong_code, &groups.wrong_code, now),
        misformatted_list: inherit_since(&prior.misformatted_list, &groups.misformatted_list, now),
        no_available_schema: inherit_since(&prior.no_available_schema, &groups.no_available_schema, now),
        misformatted_schema: inherit_since(&prior.misformatted_schema, &groups.misformatted_schema, now),
        valid: groups.valid.iter().cloned().collect::<BTreeMap<_, _>>(),
    }
}
