// Slot values: blank, a single file number, or a normalized range
// Every other continuity module goes through these helpers instead of sniffing strings.

use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{FILE_NUMBER_WIDTH, WASTE_MARKER};
use crate::db::schema::LogEntry;
use super::FieldId;

/// A sound or camera file slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    /// Nothing recorded (blank or wasted)
    #[default]
    Blank,
    Single(u32),
    /// Always normalized so that `lower <= upper`
    Range { lower: u32, upper: u32 },
}

impl Slot {
    /// Build a range from two ends in any order
    pub fn range(from: u32, to: u32) -> Self {
        Slot::Range {
            lower: from.min(to),
            upper: from.max(to),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Slot::Blank)
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Slot::Range { .. })
    }

    pub fn lower(&self) -> Option<u32> {
        match *self {
            Slot::Blank => None,
            Slot::Single(n) => Some(n),
            Slot::Range { lower, .. } => Some(lower),
        }
    }

    pub fn upper(&self) -> Option<u32> {
        match *self {
            Slot::Blank => None,
            Slot::Single(n) => Some(n),
            Slot::Range { upper, .. } => Some(upper),
        }
    }

    pub fn bounds(&self) -> Option<(u32, u32)> {
        Some((self.lower()?, self.upper()?))
    }

    pub fn contains(&self, n: u32) -> bool {
        self.bounds().map_or(false, |(lo, hi)| lo <= n && n <= hi)
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => a_lo <= b_hi && b_lo <= a_hi,
            _ => false,
        }
    }

    /// Convert to the stored `{from, to}` pair. Blank slots are not stored.
    pub fn to_stored(&self) -> Option<StoredSlot> {
        match *self {
            Slot::Blank => None,
            Slot::Single(n) => Some(StoredSlot {
                from: format_padded(n),
                to: None,
            }),
            Slot::Range { lower, upper } => Some(StoredSlot {
                from: format_padded(lower),
                to: Some(format_padded(upper)),
            }),
        }
    }

    pub fn from_stored(stored: Option<&StoredSlot>) -> Slot {
        match stored {
            None => Slot::Blank,
            Some(StoredSlot { from, to: Some(to) }) => {
                if is_blank_text(from) && is_blank_text(to) {
                    Slot::Blank
                } else {
                    Slot::range(parse_number(from), parse_number(to))
                }
            }
            Some(StoredSlot { from, to: None }) => parse_slot(from),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Slot::Blank => Ok(()),
            Slot::Single(n) => f.write_str(&format_padded(n)),
            Slot::Range { lower, upper } => {
                write!(f, "{}-{}", format_padded(lower), format_padded(upper))
            }
        }
    }
}

// Slots serialize as their stored pair, with blank as null
impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_stored().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let stored = Option::<StoredSlot>::deserialize(deserializer)?;
        Ok(Slot::from_stored(stored.as_ref()))
    }
}

/// Persisted form of a non-blank slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlot {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*[-\x{2013}\x{2014}]\s*(\d+)\s*$").expect("range pattern is valid")
    })
}

fn is_blank_text(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(WASTE_MARKER)
}

/// Parse a typed slot value: blank, "WASTE", "0012", or "0012-0015"
pub fn parse_slot(raw: &str) -> Slot {
    if is_blank_text(raw) {
        return Slot::Blank;
    }

    if let Some(caps) = range_pattern().captures(raw) {
        return Slot::range(parse_number(&caps[1]), parse_number(&caps[2]));
    }

    Slot::Single(parse_number(raw))
}

/// Numeric coercion used for file numbers and takes. Non-numeric input is 0.
pub fn parse_number(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

/// Zero-pad to the file number width ("7" -> "0007"). Wider numbers are kept whole.
pub fn format_padded(n: u32) -> String {
    format!("{:0width$}", n, width = FILE_NUMBER_WIDTH)
}

/// Whether an entry's field holds nothing
pub fn is_blank(entry: &LogEntry, field: FieldId) -> bool {
    match field {
        FieldId::Scene => entry.scene.trim().is_empty(),
        FieldId::Shot => entry.shot.trim().is_empty(),
        FieldId::Take => entry.take.trim().is_empty(),
        FieldId::Sound | FieldId::Camera(_) => entry.slot(field).is_blank(),
    }
}
