//! SRV record ranking.

use dcfind_common::model::ServiceRecord;

/// Order candidates by ascending priority, then descending weight, then
/// target name.
///
/// This is not the RFC 2782 weighted-random selection; the lexicographic
/// tie-break is a deterministic stand-in that is close enough for DC
/// discovery and keeps the racing order reproducible.
pub fn rank(mut records: Vec<ServiceRecord>) -> Vec<ServiceRecord> {
    records.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.weight.cmp(&a.weight))
            .then(a.target.cmp(&b.target))
    });
    records
}
