//! The score ledger and its line-oriented text format.
//!
//! ```text
//! Player0 3
//! Player1 0
//! alice 12
//! ```
//!
//! Line `i` belongs to participant slot `i`. A line that is missing or
//! cannot be parsed falls back to the generated default for that slot.

use std::fmt;

/// Longest participant name kept from a score file. Longer names are cut.
pub const MAX_NAME_LEN: usize = 31;

// ---------------------------------------------------------------------------
// ScoreEntry
// ---------------------------------------------------------------------------

/// One participant's persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Display name. A single whitespace-free token.
    pub name: String,
    /// Rounds won across every session that used this score file.
    pub score: u64,
}

impl ScoreEntry {
    /// The generated record for a slot with no usable saved data.
    pub fn default_for(slot: usize) -> Self {
        Self {
            name: format!("Player{slot}"),
            score: 0,
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        let score = tokens.next()?.parse::<u64>().ok()?;
        Some(Self {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            score,
        })
    }
}

impl fmt::Display for ScoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.score)
    }
}

// ---------------------------------------------------------------------------
// ScoreLedger
// ---------------------------------------------------------------------------

/// Participant slot → score mapping.
///
/// The ledger always holds exactly one entry per participant slot, so
/// lookups by slot never need to handle gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    entries: Vec<ScoreEntry>,
}

impl ScoreLedger {
    /// A fresh ledger with generated names and zero scores.
    pub fn with_defaults(slots: usize) -> Self {
        Self {
            entries: (0..slots).map(ScoreEntry::default_for).collect(),
        }
    }

    /// Parses the persisted text form, defaulting every slot whose line is
    /// missing or malformed. Lines past `slots` are ignored.
    pub fn parse(text: &str, slots: usize) -> Self {
        let mut lines = text.lines();
        let entries = (0..slots)
            .map(|slot| {
                lines
                    .next()
                    .and_then(ScoreEntry::parse)
                    .unwrap_or_else(|| ScoreEntry::default_for(slot))
            })
            .collect();
        Self { entries }
    }

    /// Renders the full persisted text form, one line per slot.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Adds one win to `slot`. Returns the new score, or `None` for an
    /// unknown slot.
    pub fn increment(&mut self, slot: usize) -> Option<u64> {
        let entry = self.entries.get_mut(slot)?;
        entry.score = entry.score.saturating_add(1);
        Some(entry.score)
    }

    /// Current score for `slot`.
    pub fn score(&self, slot: usize) -> Option<u64> {
        self.entries.get(slot).map(|e| e.score)
    }

    /// Full record for `slot`.
    pub fn get(&self, slot: usize) -> Option<&ScoreEntry> {
        self.entries.get(slot)
    }

    /// All records in slot order.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the ledger has no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_generated_names_with_zero() {
        let ledger = ScoreLedger::with_defaults(3);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get(2), Some(&ScoreEntry::default_for(2)));
        assert_eq!(ledger.get(2).unwrap().name, "Player2");
        assert_eq!(ledger.score(0), Some(0));
    }

    #[test]
    fn test_parse_reads_one_line_per_slot() {
        let ledger = ScoreLedger::parse("alice 4\nbob 0\ncarol 11\n", 3);
        assert_eq!(ledger.get(0).unwrap().name, "alice");
        assert_eq!(ledger.score(0), Some(4));
        assert_eq!(ledger.score(2), Some(11));
    }

    #[test]
    fn test_parse_defaults_missing_and_garbled_lines() {
        let ledger = ScoreLedger::parse("alice 4\nbob lots\n", 4);
        assert_eq!(ledger.score(0), Some(4));
        assert_eq!(ledger.get(1), Some(&ScoreEntry::default_for(1)));
        assert_eq!(ledger.get(2), Some(&ScoreEntry::default_for(2)));
        assert_eq!(ledger.get(3), Some(&ScoreEntry::default_for(3)));
    }

    #[test]
    fn test_parse_rejects_negative_scores() {
        let ledger = ScoreLedger::parse("alice -2\n", 1);
        assert_eq!(ledger.get(0), Some(&ScoreEntry::default_for(0)));
    }

    #[test]
    fn test_parse_truncates_long_names() {
        let long = "n".repeat(64);
        let ledger = ScoreLedger::parse(&format!("{long} 1\n"), 1);
        assert_eq!(ledger.get(0).unwrap().name.len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_parse_ignores_extra_lines() {
        let ledger = ScoreLedger::parse("a 1\nb 2\nc 3\n", 2);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_render_then_parse_reproduces_mapping() {
        let mut ledger = ScoreLedger::with_defaults(5);
        for (slot, wins) in [(0, 3), (2, 1), (4, 7)] {
            for _ in 0..wins {
                ledger.increment(slot);
            }
        }
        let reloaded = ScoreLedger::parse(&ledger.render(), 5);
        assert_eq!(reloaded, ledger);
    }

    #[test]
    fn test_increment_unknown_slot_is_none() {
        let mut ledger = ScoreLedger::with_defaults(2);
        assert_eq!(ledger.increment(1), Some(1));
        assert_eq!(ledger.increment(1), Some(2));
        assert_eq!(ledger.increment(9), None);
    }

    #[test]
    fn test_render_format() {
        let ledger = ScoreLedger::with_defaults(2);
        assert_eq!(ledger.render(), "Player0 0\nPlayer1 0\n");
    }
}
