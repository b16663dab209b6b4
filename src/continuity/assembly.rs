// Entry assembly
// Gate -> validation -> detection -> optional renumbering -> persistence, in that order.
// Everything written by one commit goes through a single transaction.

use rusqlite::Connection;

use crate::db::schema::{self, LogEntry, NewLogEntry, Project};
use crate::error::{Result, SlateLogError};
use crate::licensing::{self, LicenseState};
use crate::settings::{OptionalField, ProjectSettings};
use super::classification::EntryForm;
use super::duplicate::{detect, BlockReason, Candidate, Detection, InsertTarget};
use super::predict::predict_next;
use super::shift::{find_shift_overlap, plan_insert_before};
use super::take_number;

/// Caller decisions for conflicts that need one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Renumber the conflicting entry and its chain to make room
    pub confirm_insert: bool,
    /// Resolve a take collision by bumping every take from the typed one upward
    pub shift_takes_on_conflict: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Created {
        entry: LogEntry,
        /// Entries whose take was bumped to make room
        takes_shifted: usize,
    },
    Inserted {
        entry: LogEntry,
        renumbered: Vec<i64>,
    },
    /// Nothing was written; commit again with `confirm_insert` to go ahead
    NeedsInsertConfirmation(InsertTarget),
}

impl CommitOutcome {
    pub fn entry(&self) -> Option<&LogEntry> {
        match self {
            CommitOutcome::Created { entry, .. } | CommitOutcome::Inserted { entry, .. } => Some(entry),
            CommitOutcome::NeedsInsertConfirmation(_) => None,
        }
    }
}

fn optional_text(settings: &ProjectSettings, field: OptionalField, value: &Option<String>) -> Option<String> {
    if !settings.is_enabled(field) {
        return None;
    }
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Final record for a validated form: suppressed fields blank, free text only when enabled
pub fn build_new_entry(project: &Project, form: &EntryForm, candidate: &Candidate) -> NewLogEntry {
    let settings = &project.settings;

    let custom_values = form
        .custom_values
        .iter()
        .filter(|(key, value)| {
            !value.trim().is_empty() && settings.custom_fields.iter().any(|f| &f.key == *key)
        })
        .map(|(key, value)| (key.clone(), value.trim().to_string()))
        .collect();

    NewLogEntry {
        project_id: project.id,
        scene: candidate.scene.clone(),
        shot: candidate.shot.clone(),
        take: candidate.take.clone(),
        classification: candidate.classification,
        sound_file: candidate.sound_file,
        camera_files: candidate.camera_files.clone(),
        rec_active: candidate.rec_active.clone(),
        mos: form.mos(),
        episode: optional_text(settings, OptionalField::Episode, &form.episode),
        description: optional_text(settings, OptionalField::Description, &form.description),
        notes: optional_text(settings, OptionalField::Notes, &form.notes),
        card_numbers: optional_text(settings, OptionalField::CardNumbers, &form.card_numbers),
        custom_values,
    }
}

fn insert_and_load(conn: &Connection, entry: &NewLogEntry) -> Result<LogEntry> {
    let id = schema::insert_entry(conn, entry)?;
    schema::get_entry(conn, id)?.ok_or(SlateLogError::EntryNotFound(id))
}

/// Commit a filled-in form to a project
pub fn commit_entry(
    conn: &Connection,
    project: &Project,
    license: &LicenseState,
    form: &EntryForm,
    options: CommitOptions,
) -> Result<CommitOutcome> {
    let count = schema::count_entries(conn, project.id)?;
    if !licensing::may_accept_entry(license, count) {
        log::warn!("Project {} refused a new entry: quota reached at {}", project.id, count);
        return Err(SlateLogError::QuotaExceeded);
    }

    let missing = form.missing_fields(&project.settings);
    if !missing.is_empty() {
        log::warn!("Entry refused, missing fields: {:?}", missing);
        return Err(SlateLogError::Validation(missing));
    }

    let candidate = form.to_candidate(&project.settings);
    let new_entry = build_new_entry(project, form, &candidate);

    // Dropping the transaction without commit rolls everything back
    let tx = conn.unchecked_transaction()?;
    let mut takes_shifted = None;

    let outcome = loop {
        let entries = schema::list_entries(&tx, project.id)?;

        match detect(&candidate, &entries) {
            Detection::Clear => {
                let entry = insert_and_load(&tx, &new_entry)?;
                break CommitOutcome::Created {
                    entry,
                    takes_shifted: takes_shifted.unwrap_or(0),
                };
            }
            Detection::TakeConflict(conflict) => {
                if options.shift_takes_on_conflict && takes_shifted.is_none() {
                    let shifted = schema::shift_take_numbers(
                        &tx,
                        project.id,
                        &conflict.scene,
                        &conflict.shot,
                        take_number(&conflict.take),
                        1,
                    )?;
                    log::info!(
                        "Shifted {} take(s) in scene {} / shot {} from take {}",
                        shifted, conflict.scene, conflict.shot, conflict.take
                    );
                    takes_shifted = Some(shifted);
                    continue;
                }

                log::warn!(
                    "Take conflict on scene {} / shot {} / take {}",
                    conflict.scene, conflict.shot, conflict.take
                );
                return Err(SlateLogError::TakeNumberConflict {
                    scene: conflict.scene,
                    shot: conflict.shot,
                    take: conflict.take,
                    suggested: conflict.suggested_take,
                });
            }
            Detection::FileConflict(conflict) => {
                log::warn!("File conflict ({}) with {}", conflict.reason, conflict.location);
                return Err(SlateLogError::FileRangeConflict {
                    reason: conflict.reason,
                    location: conflict.location,
                });
            }
            Detection::InsertEligible(target) => {
                let target_entry = entries
                    .iter()
                    .find(|e| e.id == target.entry_id)
                    .ok_or(SlateLogError::EntryNotFound(target.entry_id))?;
                let plan = plan_insert_before(&candidate, target_entry, &entries);

                if let Some(overlap) = find_shift_overlap(&plan, &entries) {
                    log::warn!(
                        "Insert-before refused: entry {} would move {} to {} onto {}",
                        overlap.moved_entry_id, overlap.field, overlap.moved, overlap.location
                    );
                    return Err(SlateLogError::FileRangeConflict {
                        reason: BlockReason::ShiftOverlap,
                        location: overlap.location,
                    });
                }

                if !options.confirm_insert {
                    return Ok(CommitOutcome::NeedsInsertConfirmation(target));
                }

                schema::apply_entry_updates(&tx, &plan.updates)?;
                let entry = insert_and_load(&tx, &new_entry)?;
                break CommitOutcome::Inserted {
                    entry,
                    renumbered: plan.entry_ids(),
                };
            }
        }
    };

    tx.commit()?;

    match &outcome {
        CommitOutcome::Inserted { entry, renumbered } => log::info!(
            "Inserted entry {} ({}) before {} existing entr(ies)",
            entry.id,
            entry.location(),
            renumbered.len()
        ),
        CommitOutcome::Created { entry, .. } => {
            log::info!("Created entry {} ({})", entry.id, entry.location())
        }
        CommitOutcome::NeedsInsertConfirmation(_) => {}
    }

    Ok(outcome)
}

/// A new form primed with the predicted next values
pub fn prime_next_form(conn: &Connection, project: &Project) -> Result<EntryForm> {
    let entries = schema::list_entries(conn, project.id)?;
    let prediction = predict_next(&project.settings, &entries);
    Ok(EntryForm::from_prediction(&prediction))
}
