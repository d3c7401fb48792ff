//! Change detection against the offset map.
//!
//! A record is changed iff its id is missing from the map, or its
//! `last_edited_time` string differs from the stored one. The comparison is
//! plain string equality: a timestamp that moves backwards, or differs only
//! in sub-second digits, still counts as a change.
//!
//! Detection runs per page as pages arrive, so memory stays bounded by one
//! page regardless of collection size.

use crate::model::RawRecord;
use crate::sync::types::OffsetMap;

/// Records of one page, partitioned by change detection.
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Records to process, in source order.
    pub changed: Vec<RawRecord>,
    /// Number of records skipped as unchanged.
    pub unchanged: usize,
}

/// Whether `record` needs processing.
///
/// A record without a timestamp never matches a stored value.
#[must_use]
pub fn is_changed(record: &RawRecord, offsets: &OffsetMap) -> bool {
    match (offsets.get(&record.id), record.last_edited_time.as_deref()) {
        (Some(stored), Some(current)) => stored != current,
        _ => true,
    }
}

/// Partition one page of records.
#[must_use]
pub fn detect_changes(page: Vec<RawRecord>, offsets: &OffsetMap) -> ChangeSet {
    let mut set = ChangeSet::default();
    for record in page {
        if is_changed(&record, offsets) {
            set.changed.push(record);
        } else {
            set.unchanged += 1;
        }
    }
    set
}
