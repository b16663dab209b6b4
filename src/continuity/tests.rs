// --- Continuity engine scenarios against a real database ---

use std::collections::BTreeMap;
use rusqlite::Connection;

use super::assembly::{commit_entry, prime_next_form, CommitOptions, CommitOutcome};
use super::classification::{ClassificationChoice, EntryForm, WasteSelection};
use super::delta::span;
use super::duplicate::BlockReason;
use super::*;
use crate::constants::TRIAL_ENTRY_LIMIT;
use crate::db::schema::{self, LogEntry, NewLogEntry, Project};
use crate::error::SlateLogError;
use crate::licensing::LicenseState;
use crate::settings::{CustomField, OptionalField, ProjectSettings};

/// In-memory DB with migrations applied and one project.
fn setup_test_db(settings: ProjectSettings) -> (Connection, Project) {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    crate::db::migrations::run_migrations(&conn).unwrap();
    let id = schema::insert_project(&conn, "Scenario Shoot", &settings).unwrap();
    let project = schema::get_project(&conn, id).unwrap().unwrap();
    (conn, project)
}

fn cameras_only(channels: usize) -> ProjectSettings {
    let mut settings = ProjectSettings::with_cameras(channels);
    settings.enabled_fields.remove(&OptionalField::SoundFile);
    settings
}

/// Write an entry directly, bypassing detection
fn seed(conn: &Connection, project: &Project, take: &str, sound: Slot, cameras: Vec<Slot>) -> i64 {
    schema::insert_entry(
        conn,
        &NewLogEntry {
            project_id: project.id,
            scene: "1".to_string(),
            shot: "1".to_string(),
            take: take.to_string(),
            rec_active: vec![true; cameras.len()],
            sound_file: sound,
            camera_files: cameras,
            ..Default::default()
        },
    )
    .unwrap()
}

fn form(take: &str, sound: Slot, cameras: Vec<Slot>) -> EntryForm {
    let mut form = EntryForm::new(cameras.len());
    form.scene = "1".to_string();
    form.shot = "1".to_string();
    form.take = take.to_string();
    form.sound_file = sound;
    form.camera_files = cameras;
    form
}

fn commit(conn: &Connection, project: &Project, form: &EntryForm, options: CommitOptions) -> crate::error::Result<CommitOutcome> {
    commit_entry(conn, project, &LicenseState::trial(), form, options)
}

fn confirmed() -> CommitOptions {
    CommitOptions { confirm_insert: true, ..Default::default() }
}

fn entry(conn: &Connection, id: i64) -> LogEntry {
    schema::get_entry(conn, id).unwrap().unwrap()
}

fn assert_no_overlap(entries: &[LogEntry], channels: usize) {
    for field in FieldId::file_fields(channels) {
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                let (sa, sb) = (a.participating_slot(field), b.participating_slot(field));
                assert!(
                    !sa.overlaps(&sb),
                    "{} overlaps between entries {} ({}) and {} ({})",
                    field, a.id, sa, b.id, sb
                );
            }
        }
    }
}

fn assert_unique_takes(entries: &[LogEntry]) {
    let mut seen = std::collections::BTreeSet::new();
    for e in entries.iter().filter(|e| e.is_normal()) {
        assert!(
            seen.insert((e.scene.clone(), e.shot.clone(), e.take_number())),
            "duplicate take {}",
            e.location()
        );
    }
}

// ---------------------------------------------------------------
// Scenario A: empty project predicts the first numbers
// ---------------------------------------------------------------
#[test]
fn test_scenario_a_empty_project() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let form = prime_next_form(&conn, &project).unwrap();

    assert_eq!(form.scene, "1");
    assert_eq!(form.shot, "1");
    assert_eq!(form.take, "1");
    assert_eq!(form.sound_file.to_string(), "0001");
    assert_eq!(form.camera_files[0].to_string(), "0001");
}

// ---------------------------------------------------------------
// Scenario B: exact file match blocks
// ---------------------------------------------------------------
#[test]
fn test_scenario_b_exact_match_blocks() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let first = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    assert!(matches!(
        commit(&conn, &project, &first, CommitOptions::default()).unwrap(),
        CommitOutcome::Created { .. }
    ));

    let second = form("2", Slot::Single(1), vec![Slot::Single(1)]);
    let err = commit(&conn, &project, &second, confirmed()).unwrap_err();
    match err {
        SlateLogError::FileRangeConflict { reason, location } => {
            assert_eq!(reason, BlockReason::Exact);
            assert!(location.contains("Scene 1 / Shot 1 / Take 1"), "{}", location);
        }
        other => panic!("expected file conflict, got {:?}", other),
    }
    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), 1);
}

// ---------------------------------------------------------------
// Scenario C: lower-bound match, insert-before shifts the range
// ---------------------------------------------------------------
#[test]
fn test_scenario_c_insert_before_range() {
    let (conn, project) = setup_test_db(cameras_only(1));
    let existing = seed(&conn, &project, "1", Slot::Blank, vec![Slot::range(1, 3)]);

    let new = form("1", Slot::Blank, vec![Slot::Single(1)]);

    // Without confirmation nothing is written
    match commit(&conn, &project, &new, CommitOptions::default()).unwrap() {
        CommitOutcome::NeedsInsertConfirmation(target) => assert_eq!(target.entry_id, existing),
        other => panic!("expected confirmation request, got {:?}", other),
    }
    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), 1);
    assert_eq!(entry(&conn, existing).camera_files[0], Slot::range(1, 3));

    let outcome = commit(&conn, &project, &new, confirmed()).unwrap();
    let CommitOutcome::Inserted { entry: inserted, renumbered } = outcome else {
        panic!("expected insert");
    };
    assert_eq!(renumbered, vec![existing]);
    assert_eq!(inserted.take, "1");
    assert_eq!(inserted.camera_files[0].to_string(), "0001");

    let shifted = entry(&conn, existing);
    assert_eq!(shifted.camera_files[0].to_string(), "0002-0004");
    assert_eq!(shifted.take, "2");
    assert!(shifted.updated_at.is_some());

    // Span preservation
    assert_eq!(span(&shifted.camera_files[0]), Some(2));
}

// ---------------------------------------------------------------
// Scenario D: blank slot in the chain is skipped, carry continues
// ---------------------------------------------------------------
#[test]
fn test_scenario_d_blank_slot_in_chain() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let t1 = seed(&conn, &project, "1", Slot::range(1, 2), vec![Slot::range(1, 2)]);
    let t2 = seed(&conn, &project, "2", Slot::Blank, vec![Slot::Single(3)]);
    let t3 = seed(&conn, &project, "3", Slot::range(3, 4), vec![Slot::Single(4)]);

    let new = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    let outcome = commit(&conn, &project, &new, confirmed()).unwrap();
    let CommitOutcome::Inserted { renumbered, .. } = outcome else {
        panic!("expected insert");
    };
    assert_eq!(renumbered, vec![t1, t2, t3]);

    let (e1, e2, e3) = (entry(&conn, t1), entry(&conn, t2), entry(&conn, t3));
    assert_eq!(e1.sound_file, Slot::range(2, 3));
    assert_eq!(e2.sound_file, Slot::Blank);
    // Carry continuity: next non-blank starts right after the last non-blank upper
    assert_eq!(e3.sound_file.lower(), e1.sound_file.upper().map(|u| u + 1));
    assert_eq!(e3.sound_file, Slot::range(4, 5));

    assert_eq!(e1.camera_files[0], Slot::range(2, 3));
    assert_eq!(e2.camera_files[0], Slot::Single(4));
    assert_eq!(e3.camera_files[0], Slot::Single(5));

    let takes: Vec<&str> = [&e1, &e2, &e3].iter().map(|e| e.take.as_str()).collect();
    assert_eq!(takes, vec!["2", "3", "4"]);

    let all = schema::list_entries(&conn, project.id).unwrap();
    assert_no_overlap(&all, 1);
    assert_unique_takes(&all);
}

// ---------------------------------------------------------------
// Scenario E: multi-channel alignment
// ---------------------------------------------------------------
#[test]
fn test_scenario_e_blank_channel_in_target_allows_insert() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(2));
    let target = seed(&conn, &project, "1", Slot::range(1, 2), vec![Slot::range(1, 2), Slot::Blank]);

    let new = form("1", Slot::Single(1), vec![Slot::Single(1), Slot::Single(1)]);
    match commit(&conn, &project, &new, CommitOptions::default()).unwrap() {
        CommitOutcome::NeedsInsertConfirmation(t) => {
            assert_eq!(t.entry_id, target);
            assert_eq!(t.collisions.len(), 2);
        }
        other => panic!("expected confirmation request, got {:?}", other),
    }

    commit(&conn, &project, &new, confirmed()).unwrap();
    let shifted = entry(&conn, target);
    assert_eq!(shifted.sound_file, Slot::range(2, 3));
    assert_eq!(shifted.camera_files, vec![Slot::range(2, 3), Slot::Blank]);
    assert_no_overlap(&schema::list_entries(&conn, project.id).unwrap(), 2);
}

#[test]
fn test_scenario_e_cross_entry_blocks() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    seed(&conn, &project, "1", Slot::range(5, 6), vec![Slot::range(1, 2)]);
    seed(&conn, &project, "2", Slot::range(1, 3), vec![Slot::range(3, 4)]);

    let new = form("3", Slot::Single(1), vec![Slot::Single(1)]);
    let err = commit(&conn, &project, &new, confirmed()).unwrap_err();
    assert!(matches!(
        err,
        SlateLogError::FileRangeConflict { reason: BlockReason::CrossEntry, .. }
    ));
}

#[test]
fn test_misaligned_channel_blocks() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    seed(&conn, &project, "1", Slot::range(1, 2), vec![Slot::Single(7)]);

    // Sound aligns, camera has its own value while the target's camera is not blank
    let new = form("1", Slot::Single(1), vec![Slot::Single(9)]);
    let err = commit(&conn, &project, &new, confirmed()).unwrap_err();
    assert!(matches!(
        err,
        SlateLogError::FileRangeConflict { reason: BlockReason::Misaligned, .. }
    ));
}

#[test]
fn test_upper_match_blocks() {
    let (conn, project) = setup_test_db(cameras_only(1));
    seed(&conn, &project, "1", Slot::Blank, vec![Slot::range(1, 3)]);

    let new = form("2", Slot::Blank, vec![Slot::Single(3)]);
    let err = commit(&conn, &project, &new, confirmed()).unwrap_err();
    assert!(matches!(err, SlateLogError::FileRangeConflict { reason: BlockReason::Upper, .. }));
}

#[test]
fn test_shift_into_other_scene_blocks() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let target = seed(&conn, &project, "1", Slot::range(1, 2), vec![Slot::range(1, 2)]);
    let other = schema::insert_entry(
        &conn,
        &NewLogEntry {
            project_id: project.id,
            scene: "2".to_string(),
            shot: "1".to_string(),
            take: "1".to_string(),
            sound_file: Slot::Single(3),
            camera_files: vec![Slot::Single(3)],
            rec_active: vec![true],
            ..Default::default()
        },
    )
    .unwrap();

    let new = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    for options in [CommitOptions::default(), confirmed()] {
        match commit(&conn, &project, &new, options).unwrap_err() {
            SlateLogError::FileRangeConflict { reason, location } => {
                assert_eq!(reason, BlockReason::ShiftOverlap);
                assert!(location.contains("Scene 2"), "{}", location);
            }
            other => panic!("expected shift overlap, got {:?}", other),
        }
    }

    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), 2);
    assert_eq!(entry(&conn, target).sound_file, Slot::range(1, 2));
    assert_eq!(entry(&conn, other).sound_file, Slot::Single(3));
    assert_no_overlap(&schema::list_entries(&conn, project.id).unwrap(), 1);
}

#[test]
fn test_insert_before_sound_only_keeps_blank_take() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let sound_only = |classification: Classification, sound: Slot| {
        schema::insert_entry(
            &conn,
            &NewLogEntry {
                project_id: project.id,
                classification,
                sound_file: sound,
                camera_files: vec![Slot::Blank],
                rec_active: vec![true],
                ..Default::default()
            },
        )
        .unwrap()
    };
    let ambience = sound_only(Classification::Ambience, Slot::range(1, 2));
    let sfx = sound_only(Classification::Sfx, Slot::Single(3));

    let mut new = form("", Slot::Single(1), vec![Slot::Blank]);
    new.select(ClassificationChoice::Sfx, Slot::Single(1));
    let outcome = commit(&conn, &project, &new, confirmed()).unwrap();
    let CommitOutcome::Inserted { entry: inserted, renumbered } = outcome else {
        panic!("expected insert");
    };
    assert_eq!(renumbered, vec![ambience, sfx]);
    assert_eq!(inserted.take, "");

    let (a, s) = (entry(&conn, ambience), entry(&conn, sfx));
    assert_eq!(a.take, "");
    assert_eq!(s.take, "");
    assert_eq!(a.sound_file, Slot::range(2, 3));
    assert_eq!(s.sound_file, Slot::Single(4));
    assert_no_overlap(&schema::list_entries(&conn, project.id).unwrap(), 1);
}

// ---------------------------------------------------------------
// Take numbers
// ---------------------------------------------------------------
#[test]
fn test_take_conflict_suggests_next_take() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    seed(&conn, &project, "1", Slot::Single(1), vec![Slot::Single(1)]);
    seed(&conn, &project, "2", Slot::Single(2), vec![Slot::Single(2)]);

    let new = form("1", Slot::Single(3), vec![Slot::Single(3)]);
    match commit(&conn, &project, &new, CommitOptions::default()).unwrap_err() {
        SlateLogError::TakeNumberConflict { take, suggested, .. } => {
            assert_eq!(take, "1");
            assert_eq!(suggested, 3);
        }
        other => panic!("expected take conflict, got {:?}", other),
    }
}

#[test]
fn test_take_cascade_makes_room() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let t1 = seed(&conn, &project, "1", Slot::Single(1), vec![Slot::Single(1)]);
    let t2 = seed(&conn, &project, "2", Slot::Single(2), vec![Slot::Single(2)]);
    let t3 = seed(&conn, &project, "3", Slot::Single(3), vec![Slot::Single(3)]);

    let new = form("2", Slot::Single(4), vec![Slot::Single(4)]);
    let options = CommitOptions { shift_takes_on_conflict: true, ..Default::default() };
    match commit(&conn, &project, &new, options).unwrap() {
        CommitOutcome::Created { entry: created, takes_shifted } => {
            assert_eq!(takes_shifted, 2);
            assert_eq!(created.take, "2");
        }
        other => panic!("expected create, got {:?}", other),
    }

    assert_eq!(entry(&conn, t1).take, "1");
    assert_eq!(entry(&conn, t2).take, "3");
    assert_eq!(entry(&conn, t3).take, "4");
    assert_unique_takes(&schema::list_entries(&conn, project.id).unwrap());
}

#[test]
fn test_take_cascade_rolled_back_when_insert_not_confirmed() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let outside = seed(&conn, &project, "1", Slot::Single(1), vec![Slot::Single(1)]);
    let target = seed(&conn, &project, "5", Slot::range(3, 4), vec![Slot::range(3, 4)]);

    // Files align with take 5, take number collides with take 1 outside the chain
    let new = form("1", Slot::Single(3), vec![Slot::Single(3)]);
    let options = CommitOptions { shift_takes_on_conflict: true, ..Default::default() };
    match commit(&conn, &project, &new, options).unwrap() {
        CommitOutcome::NeedsInsertConfirmation(t) => assert_eq!(t.entry_id, target),
        other => panic!("expected confirmation request, got {:?}", other),
    }

    assert_eq!(entry(&conn, outside).take, "1");
    assert_eq!(entry(&conn, target).take, "5");
    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), 2);
}

#[test]
fn test_take_conflict_checks_renumbered_chain() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    seed(&conn, &project, "1", Slot::range(1, 2), vec![Slot::range(1, 2)]);
    seed(&conn, &project, "2", Slot::Single(3), vec![Slot::Single(3)]);

    // Take 1 moves to take 2, so take 2 would collide once the chain has shifted
    let clash = form("2", Slot::Single(1), vec![Slot::Single(1)]);
    match commit(&conn, &project, &clash, confirmed()).unwrap_err() {
        SlateLogError::TakeNumberConflict { suggested, .. } => assert_eq!(suggested, 4),
        other => panic!("expected take conflict, got {:?}", other),
    }

    // Reusing the target's take is what insert-before is for
    let fits = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    assert!(matches!(
        commit(&conn, &project, &fits, confirmed()).unwrap(),
        CommitOutcome::Inserted { .. }
    ));
    assert_unique_takes(&schema::list_entries(&conn, project.id).unwrap());
}

// ---------------------------------------------------------------
// Gate, validation, classification
// ---------------------------------------------------------------
#[test]
fn test_quota_refuses_before_detection() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    for n in 1..=TRIAL_ENTRY_LIMIT as u32 {
        seed(&conn, &project, &n.to_string(), Slot::Single(n), vec![Slot::Single(n)]);
    }

    let next = prime_next_form(&conn, &project).unwrap();
    let err = commit(&conn, &project, &next, CommitOptions::default()).unwrap_err();
    assert!(matches!(err, SlateLogError::QuotaExceeded));
    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), TRIAL_ENTRY_LIMIT);
}

#[test]
fn test_validation_reports_missing_fields() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let blank = EntryForm::new(1);
    match commit(&conn, &project, &blank, CommitOptions::default()).unwrap_err() {
        SlateLogError::Validation(fields) => {
            assert!(fields.contains(&FieldId::Scene));
            assert!(fields.contains(&FieldId::Sound));
            assert!(fields.contains(&FieldId::Camera(0)));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(schema::count_entries(&conn, project.id).unwrap(), 0);
}

#[test]
fn test_waste_suppresses_unselected_slot() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let mut waste = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    waste.select(
        ClassificationChoice::Waste(WasteSelection { camera: true, sound: false }),
        Slot::Single(1),
    );

    let outcome = commit(&conn, &project, &waste, CommitOptions::default()).unwrap();
    let stored = outcome.entry().unwrap();
    assert_eq!(stored.classification, Classification::Waste);
    assert_eq!(stored.sound_file, Slot::Blank);
    assert_eq!(stored.camera_files[0], Slot::Single(1));

    // The held sound number is still free
    let next = prime_next_form(&conn, &project).unwrap();
    assert_eq!(next.sound_file, Slot::Single(1));
    assert_eq!(next.camera_files[0], Slot::Single(2));
}

#[test]
fn test_ambience_commits_without_identity() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    seed(&conn, &project, "1", Slot::Single(1), vec![Slot::Single(1)]);

    let mut next = prime_next_form(&conn, &project).unwrap();
    next.sound_file = Slot::Blank;
    next.select(ClassificationChoice::Ambience, Slot::Single(2));

    let outcome = commit(&conn, &project, &next, CommitOptions::default()).unwrap();
    let stored = outcome.entry().unwrap();
    assert_eq!(stored.classification, Classification::Ambience);
    assert!(stored.scene.is_empty());
    assert_eq!(stored.sound_file, Slot::Single(2));
    assert_eq!(stored.camera_files[0], Slot::Blank);

    // Scene/shot still come from the last normal entry
    let after = prime_next_form(&conn, &project).unwrap();
    assert_eq!(after.scene, "1");
    assert_eq!(after.take, "2");
    assert_eq!(after.sound_file, Slot::Single(3));
}

#[test]
fn test_mos_entry_stores_blank_sound() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(1));
    let mut mos = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    mos.toggle_mos().unwrap();

    let outcome = commit(&conn, &project, &mos, CommitOptions::default()).unwrap();
    let stored = outcome.entry().unwrap();
    assert!(stored.mos);
    assert_eq!(stored.sound_file, Slot::Blank);
}

#[test]
fn test_inactive_channel_is_not_checked() {
    let (conn, project) = setup_test_db(cameras_only(2));
    seed(&conn, &project, "1", Slot::Blank, vec![Slot::Single(1), Slot::Single(1)]);

    let mut new = form("2", Slot::Blank, vec![Slot::Single(2), Slot::Single(1)]);
    new.rec_active = vec![true, false];
    let outcome = commit(&conn, &project, &new, CommitOptions::default()).unwrap();
    let stored = outcome.entry().unwrap();
    assert_eq!(stored.rec_active, vec![true, false]);
    assert_eq!(stored.camera_files, vec![Slot::Single(2), Slot::Blank]);
}

#[test]
fn test_free_text_follows_project_fields() {
    let mut settings = ProjectSettings::with_cameras(1);
    settings.custom_fields.push(CustomField { key: "lens".to_string(), label: "Lens".to_string() });
    let (conn, project) = setup_test_db(settings);

    let mut new = form("1", Slot::Single(1), vec![Slot::Single(1)]);
    new.episode = Some("101".to_string());
    new.notes = Some("  good take ".to_string());
    new.custom_values = BTreeMap::from([
        ("lens".to_string(), "35mm".to_string()),
        ("unknown".to_string(), "dropped".to_string()),
    ]);

    let outcome = commit(&conn, &project, &new, CommitOptions::default()).unwrap();
    let stored = outcome.entry().unwrap();
    assert_eq!(stored.episode, None, "episode not enabled on this project");
    assert_eq!(stored.notes.as_deref(), Some("good take"));
    assert_eq!(stored.custom_values.len(), 1);
    assert_eq!(stored.custom_values["lens"], "35mm");
}

#[test]
fn test_prediction_is_idempotent_and_advances_after_commit() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(2));
    let first = prime_next_form(&conn, &project).unwrap();
    assert_eq!(first, prime_next_form(&conn, &project).unwrap());

    commit(&conn, &project, &first, CommitOptions::default()).unwrap();

    let second = prime_next_form(&conn, &project).unwrap();
    assert_eq!(second.take, "2");
    assert_eq!(second.sound_file, Slot::Single(2));
    assert_eq!(second.camera_files, vec![Slot::Single(2), Slot::Single(2)]);
}

#[test]
fn test_many_commits_keep_invariants() {
    let (conn, project) = setup_test_db(ProjectSettings::with_cameras(2));
    for _ in 0..5 {
        let next = prime_next_form(&conn, &project).unwrap();
        commit(&conn, &project, &next, CommitOptions::default()).unwrap();
    }

    // A multi-file take, then a single take inserted in front of it
    let ranged = form("6", Slot::range(6, 8), vec![Slot::range(6, 8), Slot::range(6, 7)]);
    commit(&conn, &project, &ranged, CommitOptions::default()).unwrap();

    let insert = form("6", Slot::Single(6), vec![Slot::Single(6), Slot::Single(6)]);
    commit(&conn, &project, &insert, confirmed()).unwrap();

    let moved = schema::list_entries(&conn, project.id)
        .unwrap()
        .into_iter()
        .find(|e| e.take == "7")
        .unwrap();
    assert_eq!(moved.sound_file, Slot::range(7, 9));
    assert_eq!(moved.camera_files, vec![Slot::range(7, 9), Slot::range(7, 8)]);

    let all = schema::list_entries(&conn, project.id).unwrap();
    assert_eq!(all.len(), 7);
    assert_no_overlap(&all, 2);
    assert_unique_takes(&all);
}
