//! Display-label correction.
//!
//! The training data behind the sign model carries a handful of known-wrong
//! class labels. This module overrides them at display time with a static,
//! ordered rule table. Extending the table is adding a row; no control flow
//! changes anywhere else.

/// One override row: a class id and the name to show for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrectionRule {
    pub class_id: u32,
    pub display_name: &'static str,
}

/// Known mislabelings in the sign dataset.
///
/// Class 1 mixes several speed-limit signs; the dominant one is 30 km/h.
/// Class 11 is labeled "Keep Left" but the captured signs are turn-right.
pub const CORRECTION_RULES: &[CorrectionRule] = &[
    CorrectionRule {
        class_id: 1,
        display_name: "Speed Limit 30",
    },
    CorrectionRule {
        class_id: 11,
        display_name: "Turn Right",
    },
];

/// Ordered override table, first match wins.
#[derive(Clone, Debug)]
pub struct CorrectionTable {
    rules: Vec<CorrectionRule>,
}

impl CorrectionTable {
    /// Table with the built-in rule rows.
    pub fn builtin() -> Self {
        Self {
            rules: CORRECTION_RULES.to_vec(),
        }
    }

    /// Table from explicit rows (rule order is preserved).
    pub fn from_rules(rules: Vec<CorrectionRule>) -> Self {
        Self { rules }
    }

    /// Resolve the display name for a detection.
    ///
    /// Pure and total: returns the first matching rule's name, or
    /// `default_name` unchanged when no rule covers `class_id`.
    pub fn corrected_name<'a>(&self, class_id: u32, default_name: &'a str) -> &'a str {
        self.rules
            .iter()
            .find(|rule| rule.class_id == class_id)
            .map(|rule| rule.display_name)
            .unwrap_or(default_name)
    }
}

impl Default for CorrectionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
