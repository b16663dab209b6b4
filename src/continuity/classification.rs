// Classification lifecycle for an entry being filled in
// Each classification has enter/exit effects. Which fields are disabled is derived from the
// current state, so there is no separate set of flags to keep in sync.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlateLogError};
use crate::settings::ProjectSettings;
use super::duplicate::Candidate;
use super::predict::Prediction;
use super::{Classification, FieldId, Slot};

/// Which parts of a wasted take were actually rolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteSelection {
    pub camera: bool,
    pub sound: bool,
}

/// A classification together with the answer to its prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationChoice {
    Normal,
    Waste(WasteSelection),
    Insert { sound_speed: bool },
    Ambience,
    Sfx,
}

impl ClassificationChoice {
    pub fn classification(&self) -> Classification {
        match self {
            ClassificationChoice::Normal => Classification::Normal,
            ClassificationChoice::Waste(_) => Classification::Waste,
            ClassificationChoice::Insert { .. } => Classification::Insert,
            ClassificationChoice::Ambience => Classification::Ambience,
            ClassificationChoice::Sfx => Classification::Sfx,
        }
    }
}

/// Identity values put aside while an Ambience/SFX take is being logged
#[derive(Debug, Clone, PartialEq)]
struct IdentitySnapshot {
    scene: String,
    shot: String,
    take: String,
    camera_files: Vec<Slot>,
}

/// The entry under construction
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub sound_file: Slot,
    pub camera_files: Vec<Slot>,
    pub rec_active: Vec<bool>,
    pub episode: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub card_numbers: Option<String>,
    pub custom_values: BTreeMap<String, String>,
    classification: Classification,
    waste: Option<WasteSelection>,
    sound_speed: Option<bool>,
    mos: bool,
    held_sound: Option<Slot>,
    saved_identity: Option<IdentitySnapshot>,
}

impl EntryForm {
    pub fn new(camera_channel_count: usize) -> Self {
        Self {
            scene: String::new(),
            shot: String::new(),
            take: String::new(),
            sound_file: Slot::Blank,
            camera_files: vec![Slot::Blank; camera_channel_count],
            rec_active: vec![true; camera_channel_count],
            episode: None,
            description: None,
            notes: None,
            card_numbers: None,
            custom_values: BTreeMap::new(),
            classification: Classification::Normal,
            waste: None,
            sound_speed: None,
            mos: false,
            held_sound: None,
            saved_identity: None,
        }
    }

    /// A fresh Normal form primed with predicted values
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let mut form = Self::new(prediction.camera_files.len());
        form.scene = prediction.scene.clone();
        form.shot = prediction.shot.clone();
        form.take = prediction.take.clone();
        form.episode = prediction.episode.clone();
        form.sound_file = prediction.sound_file;
        form.camera_files = prediction.camera_files.clone();
        form.rec_active = prediction.rec_active.clone();
        form
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn mos(&self) -> bool {
        self.mos
    }

    pub fn waste_selection(&self) -> Option<WasteSelection> {
        self.waste
    }

    pub fn sound_speed(&self) -> Option<bool> {
        self.sound_speed
    }

    pub fn is_channel_active(&self, channel: usize) -> bool {
        self.rec_active.get(channel).copied().unwrap_or(true)
    }

    /// Select a classification tab. Selecting the active one returns to Normal.
    /// `next_sound` is the next free sound number, used wherever sound is auto-filled.
    pub fn select(&mut self, choice: ClassificationChoice, next_sound: Slot) -> Classification {
        let target = if choice.classification() == self.classification {
            ClassificationChoice::Normal
        } else {
            choice
        };

        self.exit();
        self.enter(target, next_sound);

        log::debug!("Classification now {}", self.classification);
        self.classification
    }

    /// Toggle MOS (no sound recorded). Blocked on Ambience and SFX.
    pub fn toggle_mos(&mut self) -> Result<bool> {
        if self.classification.is_sound_only() {
            return Err(SlateLogError::MosBlocked(self.classification.to_string()));
        }

        self.mos = !self.mos;
        if self.mos {
            self.hold_sound();
        } else {
            self.release_sound();
        }
        Ok(self.mos)
    }

    fn exit(&mut self) {
        match self.classification {
            Classification::Normal => {}
            Classification::Waste => self.waste = None,
            Classification::Insert => {
                self.sound_speed = None;
                self.release_sound();
            }
            Classification::Ambience | Classification::Sfx => {
                if let Some(saved) = self.saved_identity.take() {
                    self.scene = saved.scene;
                    self.shot = saved.shot;
                    self.take = saved.take;
                    self.camera_files = saved.camera_files;
                }
            }
        }
        self.classification = Classification::Normal;
    }

    fn enter(&mut self, choice: ClassificationChoice, next_sound: Slot) {
        match choice {
            ClassificationChoice::Normal => {}
            ClassificationChoice::Waste(selection) => self.waste = Some(selection),
            ClassificationChoice::Insert { sound_speed } => {
                self.sound_speed = Some(sound_speed);
                if !sound_speed {
                    self.hold_sound();
                } else if self.mos {
                    self.held_sound = Some(next_sound);
                } else {
                    self.sound_file = next_sound;
                }
            }
            ClassificationChoice::Ambience | ClassificationChoice::Sfx => {
                if self.mos {
                    self.mos = false;
                    self.release_sound();
                }
                let channels = self.camera_files.len();
                self.saved_identity = Some(IdentitySnapshot {
                    scene: std::mem::take(&mut self.scene),
                    shot: std::mem::take(&mut self.shot),
                    take: std::mem::take(&mut self.take),
                    camera_files: std::mem::replace(&mut self.camera_files, vec![Slot::Blank; channels]),
                });
                if self.sound_file.is_blank() {
                    self.sound_file = next_sound;
                }
            }
        }
        self.classification = choice.classification();
    }

    /// Sound is blanked (not just disabled) by MOS or an Insert without speed
    fn sound_blanked(&self) -> bool {
        self.mos || self.sound_speed == Some(false)
    }

    fn hold_sound(&mut self) {
        if self.held_sound.is_none() {
            self.held_sound = Some(self.sound_file);
        }
        self.sound_file = Slot::Blank;
    }

    fn release_sound(&mut self) {
        if self.sound_blanked() {
            return;
        }
        if let Some(held) = self.held_sound.take() {
            self.sound_file = held;
        }
    }

    /// Fields currently disabled by classification, MOS, or project settings
    pub fn disabled_fields(&self, settings: &ProjectSettings) -> BTreeSet<FieldId> {
        let channels = settings.channels();
        let cameras = || (0..channels).map(FieldId::Camera);
        let mut disabled = BTreeSet::new();

        if !settings.sound_enabled() || self.sound_blanked() {
            disabled.insert(FieldId::Sound);
        }

        match self.classification {
            Classification::Waste => {
                if let Some(selection) = self.waste {
                    if !selection.sound {
                        disabled.insert(FieldId::Sound);
                    }
                    if !selection.camera {
                        disabled.extend(cameras());
                    }
                }
            }
            Classification::Ambience | Classification::Sfx => {
                disabled.extend([FieldId::Scene, FieldId::Shot, FieldId::Take]);
                disabled.extend(cameras());
            }
            Classification::Normal | Classification::Insert => {}
        }

        disabled
    }

    /// Mandatory fields that are still empty
    pub fn missing_fields(&self, settings: &ProjectSettings) -> Vec<FieldId> {
        let disabled = self.disabled_fields(settings);

        [FieldId::Scene, FieldId::Shot, FieldId::Take]
            .into_iter()
            .chain(settings.file_fields())
            .filter(|f| !disabled.contains(f))
            .filter(|f| match f {
                FieldId::Camera(i) => self.is_channel_active(*i),
                _ => true,
            })
            .filter(|f| match f {
                FieldId::Scene => self.scene.trim().is_empty(),
                FieldId::Shot => self.shot.trim().is_empty(),
                FieldId::Take => self.take.trim().is_empty(),
                FieldId::Sound => self.sound_file.is_blank(),
                FieldId::Camera(i) => self.camera_files.get(*i).map_or(true, Slot::is_blank),
            })
            .collect()
    }

    /// Values as they will be committed: disabled and inactive fields suppressed
    pub fn to_candidate(&self, settings: &ProjectSettings) -> Candidate {
        let disabled = self.disabled_fields(settings);
        let channels = settings.channels();
        let keep = |field: FieldId, value: &str| {
            if disabled.contains(&field) {
                String::new()
            } else {
                value.trim().to_string()
            }
        };

        let camera_files = (0..channels)
            .map(|i| {
                if disabled.contains(&FieldId::Camera(i)) || !self.is_channel_active(i) {
                    Slot::Blank
                } else {
                    self.camera_files.get(i).copied().unwrap_or_default()
                }
            })
            .collect();

        Candidate {
            scene: keep(FieldId::Scene, &self.scene),
            shot: keep(FieldId::Shot, &self.shot),
            take: keep(FieldId::Take, &self.take),
            classification: self.classification,
            sound_file: if disabled.contains(&FieldId::Sound) {
                Slot::Blank
            } else {
                self.sound_file
            },
            camera_files,
            rec_active: (0..channels).map(|i| self.is_channel_active(i)).collect(),
            disabled,
        }
    }
}
