mod records;
use log::{debug, info, warn};

use std::collections::BTreeMap;

pub use crate::records::*;

pub mod builder;
pub mod legacy;
pub mod manual;
pub mod nominees;
pub mod states;
pub mod tabular;

/// Whether an incoming record replaces the one already merged under the same
/// key. `None` when the collision cannot be resolved.
fn incoming_wins(policy: CollisionPolicy, existing: Origin, incoming: Origin) -> Option<bool> {
    // A source repeating a key is a data problem, not a precedence question.
    if existing == incoming {
        return None;
    }
    match policy {
        CollisionPolicy::Fail => None,
        CollisionPolicy::PreferTabular => Some(incoming == Origin::Tabular),
        CollisionPolicy::PreferScraped => Some(incoming == Origin::Scraped),
    }
}

/// Merges the scraped and tabular records into one dataset.
///
/// Records are keyed by (year, state FIPS). The result is ordered by that
/// key. When the two inputs do not share any key, the output holds all the
/// input records. Otherwise `policy` decides.
///
/// Arguments:
/// * `scraped` the records read from the results pages
/// * `tabular` the records read from the tabular source
/// * `policy` what to do when both inputs hold the same key
pub fn merge_records(
    scraped: Vec<ElectionRecord>,
    tabular: Vec<ElectionRecord>,
    policy: CollisionPolicy,
) -> Result<Vec<ElectionRecord>, MergeError> {
    info!(
        "merge_records: {} scraped records, {} tabular records, policy: {:?}",
        scraped.len(),
        tabular.len(),
        policy
    );
    let mut tagged = scraped
        .into_iter()
        .map(|r| (Origin::Scraped, r))
        .chain(tabular.into_iter().map(|r| (Origin::Tabular, r)));

    let merged = tagged.try_fold(
        BTreeMap::<(u32, StateFips), (Origin, ElectionRecord)>::new(),
        |mut acc, (origin, record)| -> Result<_, MergeError> {
            let key = record.key();
            let existing = acc.get(&key).map(|(o, _)| *o);
            match existing {
                None => {
                    acc.insert(key, (origin, record));
                }
                Some(existing) => {
                    let replace = incoming_wins(policy, existing, origin).ok_or_else(|| {
                        MergeError::Collision {
                            year: key.0,
                            fips: key.1.clone(),
                            existing,
                            incoming: origin,
                        }
                    })?;
                    warn!(
                        "merge_records: {} {}: keeping the {:?} record",
                        key.0,
                        record.state_abbr(),
                        if replace { origin } else { existing }
                    );
                    if replace {
                        acc.insert(key, (origin, record));
                    }
                }
            }
            Ok(acc)
        },
    )?;

    let res: Vec<ElectionRecord> = merged.into_values().map(|(_, r)| r).collect();
    debug!("merge_records: {} records after merge", res.len());
    Ok(res)
}

/// SHA-256 of the canonical JSON serialization of a dataset.
///
/// Two runs over the same sources produce the same digest.
pub fn dataset_digest(records: &[ElectionRecord]) -> Result<String, serde_json::Error> {
    let js = serde_json::to_string(records)?;
    Ok(sha256::digest(js))
}
