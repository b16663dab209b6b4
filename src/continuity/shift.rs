// Insert-before renumbering
// The target entry and every later take of its scene/shot move up past the inserted
// entry's numbers. Each field is shifted independently and keeps its width. A carry of the
// last assigned upper bound is threaded through the chain so blank slots never break the run.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::db::schema::LogEntry;
use super::delta::{rebuild, span};
use super::duplicate::Candidate;
use super::{take_number, FieldId};

/// Last assigned upper bound per field. `None` means the field is not being shifted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carry {
    pub sound: Option<u32>,
    pub cameras: Vec<Option<u32>>,
}

impl Carry {
    /// Seed the carry from the inserted entry's upper bounds
    pub fn from_inserted(inserted: &Candidate) -> Self {
        Self {
            sound: inserted.participating_slot(FieldId::Sound).upper(),
            cameras: (0..inserted.camera_files.len())
                .map(|i| inserted.participating_slot(FieldId::Camera(i)).upper())
                .collect(),
        }
    }

    pub fn get(&self, field: FieldId) -> Option<u32> {
        match field {
            FieldId::Sound => self.sound,
            FieldId::Camera(i) => self.cameras.get(i).copied().flatten(),
            _ => None,
        }
    }

    /// A new carry with one field advanced
    pub fn advanced(&self, field: FieldId, upper: u32) -> Self {
        let mut next = self.clone();
        match field {
            FieldId::Sound => next.sound = Some(upper),
            FieldId::Camera(i) => {
                if next.cameras.len() <= i {
                    next.cameras.resize(i + 1, None);
                }
                next.cameras[i] = Some(upper);
            }
            _ => {}
        }
        next
    }

    pub fn fields(&self) -> Vec<FieldId> {
        FieldId::file_fields(self.cameras.len())
    }
}

/// Renumbering of one existing entry: new take plus the file fields that changed.
/// `take` is `None` for entries logged without a take (Ambience, SFX).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    pub entry_id: i64,
    pub take: Option<String>,
    pub fields: BTreeMap<FieldId, super::Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftPlan {
    pub updates: Vec<EntryUpdate>,
    pub carry: Carry,
}

impl ShiftPlan {
    pub fn entry_ids(&self) -> Vec<i64> {
        self.updates.iter().map(|u| u.entry_id).collect()
    }
}

/// The next take after `take`, or `None` when the entry has no take to bump
pub fn bumped_take(take: &str) -> Option<String> {
    if take.trim().is_empty() {
        return None;
    }
    Some(take_number(take).saturating_add(1).to_string())
}

/// The target followed by every entry of its scene/shot with a higher take, ascending.
/// An entry without a take is followed by the untaken entries logged after it, oldest first.
pub fn chain_for<'a>(target: &'a LogEntry, entries: &'a [LogEntry]) -> Vec<&'a LogEntry> {
    let same_place = entries
        .iter()
        .filter(|e| e.id != target.id)
        .filter(|e| e.same_scene_shot(&target.scene, &target.shot));

    let later: Vec<&LogEntry> = if target.take.trim().is_empty() {
        let logged = |e: &LogEntry| (e.created_at.clone(), e.id);
        let mut later: Vec<&LogEntry> = same_place
            .filter(|e| e.take.trim().is_empty())
            .filter(|e| logged(*e) > logged(target))
            .collect();
        later.sort_by_key(|e| logged(*e));
        later
    } else {
        let target_take = target.take_number();
        let mut later: Vec<&LogEntry> = same_place
            .filter(|e| !e.take.trim().is_empty())
            .filter(|e| e.take_number() > target_take)
            .collect();
        later.sort_by_key(|e| (e.take_number(), e.id));
        later
    };

    std::iter::once(target).chain(later).collect()
}

/// Shift one entry past `carry`. Returns the update and the carry for the next entry.
pub fn shift_entry(entry: &LogEntry, carry: &Carry) -> (EntryUpdate, Carry) {
    let (fields, next) = carry.fields().into_iter().fold(
        (BTreeMap::new(), carry.clone()),
        |(mut fields, next), field| {
            let Some(last_upper) = carry.get(field) else {
                return (fields, next);
            };

            let current = entry.participating_slot(field);
            if span(&current).is_none() {
                // Blank adds nothing and keeps the run going
                return (fields, next);
            }

            let moved = rebuild(&current, last_upper.saturating_add(1));
            let upper = moved.upper().unwrap_or(last_upper);
            fields.insert(field, moved);
            (fields, next.advanced(field, upper))
        },
    );

    let update = EntryUpdate {
        entry_id: entry.id,
        take: bumped_take(&entry.take),
        fields,
    };

    (update, next)
}

/// Plan the insert-before cascade for `inserted` landing ahead of `target`
pub fn plan_insert_before(inserted: &Candidate, target: &LogEntry, entries: &[LogEntry]) -> ShiftPlan {
    let chain = chain_for(target, entries);

    let (updates, carry) = chain.into_iter().fold(
        (Vec::new(), Carry::from_inserted(inserted)),
        |(mut updates, carry), entry| {
            let (update, next) = shift_entry(entry, &carry);
            updates.push(update);
            (updates, next)
        },
    );

    log::debug!(
        "Insert-before planned: {} entries renumbered starting at {}",
        updates.len(),
        target.location()
    );

    ShiftPlan { updates, carry }
}

/// A renumbered slot that would land on an entry outside the chain
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftOverlap {
    pub moved_entry_id: i64,
    pub field: FieldId,
    pub moved: super::Slot,
    pub other_entry_id: i64,
    pub location: String,
}

/// First overlap between the plan's renumbered slots and any entry the plan leaves alone
pub fn find_shift_overlap(plan: &ShiftPlan, entries: &[LogEntry]) -> Option<ShiftOverlap> {
    let moved_ids = plan.entry_ids();
    let untouched: Vec<&LogEntry> = entries.iter().filter(|e| !moved_ids.contains(&e.id)).collect();

    plan.updates.iter().find_map(|update| {
        update.fields.iter().find_map(|(&field, moved)| {
            untouched.iter().find_map(|other| {
                let existing = other.participating_slot(field);
                moved.overlaps(&existing).then(|| ShiftOverlap {
                    moved_entry_id: update.entry_id,
                    field,
                    moved: *moved,
                    other_entry_id: other.id,
                    location: format!("{}: {} {}", other.location(), field, existing),
                })
            })
        })
    })
}
