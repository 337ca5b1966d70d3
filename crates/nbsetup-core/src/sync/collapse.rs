use std::collections::HashSet;

use crate::model::Candidate;

/// Drop redundant declarations of the same VLAN group or VRF, keeping the
/// first occurrence (the one that carries the full details). Records with a
/// route distinguisher are distinct per `rd`, the rest per name.
pub fn collapse(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<(Option<String>, Option<String>)> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let name = candidate.name().map(str::to_owned);
            let rd = candidate.str_field("rd").map(str::to_owned);
            seen.insert((name, rd))
        })
        .collect()
}
