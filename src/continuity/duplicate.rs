// Duplicate detection across a whole project
// Finds take-number collisions and file-number collisions and decides whether an
// insert-before is possible. Single-camera projects are simply the one-channel case.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::db::schema::LogEntry;
use super::predict::highest_take;
use super::shift::{bumped_take, chain_for};
use super::{Classification, FieldId, Slot};

/// Values of the entry about to be committed, after classification suppression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub classification: Classification,
    pub sound_file: Slot,
    pub camera_files: Vec<Slot>,
    pub rec_active: Vec<bool>,
    pub disabled: BTreeSet<FieldId>,
}

impl Candidate {
    pub fn slot(&self, field: FieldId) -> Slot {
        match field {
            FieldId::Sound => self.sound_file,
            FieldId::Camera(i) => self.camera_files.get(i).copied().unwrap_or_default(),
            _ => Slot::Blank,
        }
    }

    /// Slot as it takes part in detection and shifting: disabled and inactive fields are blank
    pub fn participating_slot(&self, field: FieldId) -> Slot {
        if self.disabled.contains(&field) {
            return Slot::Blank;
        }
        if let FieldId::Camera(i) = field {
            if !self.rec_active.get(i).copied().unwrap_or(true) {
                return Slot::Blank;
            }
        }
        self.slot(field)
    }

    pub fn file_fields(&self) -> Vec<FieldId> {
        FieldId::file_fields(self.camera_files.len())
    }

    /// Non-blank participating slots, sound first
    pub fn participating_slots(&self) -> Vec<(FieldId, Slot)> {
        self.file_fields()
            .into_iter()
            .map(|f| (f, self.participating_slot(f)))
            .filter(|(_, s)| !s.is_blank())
            .collect()
    }
}

/// How a candidate slot collides with an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same single value or same range
    Exact,
    /// Same lower bound, different upper bound
    Lower,
    /// Candidate starts on the existing range's upper bound
    Upper,
    /// Any other overlap
    Within,
}

impl ConflictKind {
    pub fn is_insertable(&self) -> bool {
        matches!(self, ConflictKind::Lower)
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictKind::Exact => "exact",
            ConflictKind::Lower => "lower",
            ConflictKind::Upper => "upper",
            ConflictKind::Within => "within",
        };
        f.write_str(s)
    }
}

/// Why a file collision cannot be resolved by inserting before the existing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockReason {
    Exact,
    Within,
    /// Insert-after is not supported
    Upper,
    /// Channels align with different existing entries
    CrossEntry,
    /// Some channel has a value but neither aligns with the target nor finds it blank
    Misaligned,
    /// Renumbering the chain would run into an entry outside it
    ShiftOverlap,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockReason::Exact => "exact",
            BlockReason::Within => "within",
            BlockReason::Upper => "upper",
            BlockReason::CrossEntry => "cross-entry",
            BlockReason::Misaligned => "misaligned",
            BlockReason::ShiftOverlap => "shift-overlap",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCollision {
    pub field: FieldId,
    pub entry_id: i64,
    pub kind: ConflictKind,
    pub existing: Slot,
    pub candidate: Slot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TakeConflict {
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub existing_entry_id: i64,
    pub highest_take: u32,
    pub suggested_take: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileConflict {
    pub reason: BlockReason,
    pub collisions: Vec<ChannelCollision>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertTarget {
    pub entry_id: i64,
    pub collisions: Vec<ChannelCollision>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Clear,
    TakeConflict(TakeConflict),
    FileConflict(FileConflict),
    InsertEligible(InsertTarget),
}

/// Classify a candidate slot against an existing slot. Blank on either side never collides.
pub fn classify(candidate: &Slot, existing: &Slot) -> Option<ConflictKind> {
    let (c_lo, c_hi) = candidate.bounds()?;
    let (e_lo, e_hi) = existing.bounds()?;

    if !candidate.overlaps(existing) {
        return None;
    }

    if c_lo == e_lo && c_hi == e_hi {
        Some(ConflictKind::Exact)
    } else if c_lo == e_lo {
        Some(ConflictKind::Lower)
    } else if existing.is_range() && c_lo == e_hi {
        Some(ConflictKind::Upper)
    } else {
        Some(ConflictKind::Within)
    }
}

/// Every file collision of the candidate against every entry of the project
pub fn find_file_collisions(candidate: &Candidate, entries: &[LogEntry]) -> Vec<ChannelCollision> {
    let mut collisions = Vec::new();

    for (field, slot) in candidate.participating_slots() {
        for entry in entries {
            let existing = entry.participating_slot(field);
            if let Some(kind) = classify(&slot, &existing) {
                collisions.push(ChannelCollision {
                    field,
                    entry_id: entry.id,
                    kind,
                    existing,
                    candidate: slot,
                });
            }
        }
    }

    collisions
}

fn take_matches(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    matches!((a.parse::<u32>(), b.parse::<u32>()), (Ok(x), Ok(y)) if x == y)
}

/// Normal candidates must not reuse a (Scene, Shot, Take) of a Normal entry
pub fn find_take_conflict(candidate: &Candidate, entries: &[LogEntry]) -> Option<TakeConflict> {
    if candidate.classification != Classification::Normal || candidate.take.trim().is_empty() {
        return None;
    }

    let existing = entries.iter().find(|e| {
        e.is_normal()
            && e.same_scene_shot(&candidate.scene, &candidate.shot)
            && take_matches(&e.take, &candidate.take)
    })?;

    let highest = highest_take(entries, &candidate.scene, &candidate.shot).unwrap_or(0);

    Some(TakeConflict {
        scene: candidate.scene.clone(),
        shot: candidate.shot.clone(),
        take: candidate.take.clone(),
        existing_entry_id: existing.id,
        highest_take: highest,
        suggested_take: highest.saturating_add(1),
    })
}

fn describe(collisions: &[&ChannelCollision], entries: &[LogEntry]) -> String {
    collisions
        .iter()
        .map(|c| {
            let place = entries
                .iter()
                .find(|e| e.id == c.entry_id)
                .map(|e| e.location())
                .unwrap_or_else(|| format!("entry #{}", c.entry_id));
            format!("{}: {} {}", place, c.field, c.existing)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn blocking_reason(kind: ConflictKind) -> Option<BlockReason> {
    match kind {
        ConflictKind::Exact => Some(BlockReason::Exact),
        ConflictKind::Within => Some(BlockReason::Within),
        ConflictKind::Upper => Some(BlockReason::Upper),
        ConflictKind::Lower => None,
    }
}

/// Decide whether a non-empty set of file collisions allows insert-before.
fn evaluate_file_collisions(
    candidate: &Candidate,
    collisions: Vec<ChannelCollision>,
    entries: &[LogEntry],
) -> Result<InsertTarget, FileConflict> {
    // Exact beats within beats upper when several channels block
    for reason in [BlockReason::Exact, BlockReason::Within, BlockReason::Upper] {
        let blocking: Vec<&ChannelCollision> = collisions
            .iter()
            .filter(|c| blocking_reason(c.kind) == Some(reason))
            .collect();
        if !blocking.is_empty() {
            let location = describe(&blocking, entries);
            return Err(FileConflict {
                reason,
                collisions: collisions.clone(),
                location,
            });
        }
    }

    // Everything left aligns on a lower bound; it must all be the same entry
    let mut by_entry: BTreeMap<i64, Vec<&ChannelCollision>> = BTreeMap::new();
    for c in &collisions {
        by_entry.entry(c.entry_id).or_default().push(c);
    }

    let mut ids = by_entry.keys().copied();
    let (Some(target_id), None) = (ids.next(), ids.next()) else {
        let all: Vec<&ChannelCollision> = collisions.iter().collect();
        let location = describe(&all, entries);
        return Err(FileConflict {
            reason: BlockReason::CrossEntry,
            collisions: collisions.clone(),
            location,
        });
    };
    let target = entries.iter().find(|e| e.id == target_id);

    // A channel the candidate fills must align with the target or find it blank
    for (field, _) in candidate.participating_slots() {
        if collisions.iter().any(|c| c.field == field) {
            continue;
        }
        let target_slot = target.map(|t| t.participating_slot(field)).unwrap_or_default();
        if !target_slot.is_blank() {
            let location = target
                .map(|t| format!("{}: {} {}", t.location(), field, target_slot))
                .unwrap_or_else(|| format!("entry #{}", target_id));
            return Err(FileConflict {
                reason: BlockReason::Misaligned,
                collisions: collisions.clone(),
                location,
            });
        }
    }

    let all: Vec<&ChannelCollision> = collisions.iter().collect();
    let location = describe(&all, entries);
    Ok(InsertTarget {
        entry_id: target_id,
        collisions,
        location,
    })
}

/// Run full detection for a candidate against the project's entries
pub fn detect(candidate: &Candidate, entries: &[LogEntry]) -> Detection {
    let collisions = find_file_collisions(candidate, entries);

    if collisions.is_empty() {
        log::debug!(
            "No file collisions for scene {} / shot {} / take {}",
            candidate.scene, candidate.shot, candidate.take
        );
        return find_take_conflict(candidate, entries)
            .map(Detection::TakeConflict)
            .unwrap_or(Detection::Clear);
    }

    log::debug!("Found {} file collision(s)", collisions.len());

    match evaluate_file_collisions(candidate, collisions, entries) {
        Err(conflict) => Detection::FileConflict(conflict),
        Ok(target) => {
            // Takes are compared as they will be once the chain has moved up by one
            let chain: BTreeSet<i64> = entries
                .iter()
                .find(|e| e.id == target.entry_id)
                .map(|t| chain_for(t, entries).iter().map(|e| e.id).collect())
                .unwrap_or_default();
            let renumbered: Vec<LogEntry> = entries
                .iter()
                .map(|e| {
                    let mut e = e.clone();
                    if chain.contains(&e.id) {
                        if let Some(take) = bumped_take(&e.take) {
                            e.take = take;
                        }
                    }
                    e
                })
                .collect();

            match find_take_conflict(candidate, &renumbered) {
                Some(conflict) => Detection::TakeConflict(conflict),
                None => Detection::InsertEligible(target),
            }
        }
    }
}
