// Delta calculation: how wide a slot is, so a shift can keep the width

use super::slot::Slot;

/// Span of a slot: `upper - lower` for ranges, 0 for singles, none for blanks.
pub fn span(slot: &Slot) -> Option<u32> {
    match *slot {
        Slot::Blank => None,
        Slot::Single(_) => Some(0),
        Slot::Range { lower, upper } => Some(upper - lower),
    }
}

/// Rebuild `original` at a new lower bound with the same span and shape.
/// A range stays a range even when its span is 0. Blank stays blank.
pub fn rebuild(original: &Slot, new_lower: u32) -> Slot {
    match *original {
        Slot::Blank => Slot::Blank,
        Slot::Single(_) => Slot::Single(new_lower),
        Slot::Range { lower, upper } => Slot::Range {
            lower: new_lower,
            upper: new_lower.saturating_add(upper - lower),
        },
    }
}
