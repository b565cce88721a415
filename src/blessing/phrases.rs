//! Deities and flavor text.
//!
//! Everything here is presentation. Decisions are made in
//! [`decide`](super::decide) before any of this is consulted.

use super::ScoreCategory;

/// Reviewer for paradigms not in the table.
pub const DEFAULT_DEITY: &str = "The Arbiter of Spells";

const DEITIES: &[(&str, &str)] = &[
    ("academic", "The Archmage Council"),
    ("divine", "The Radiant Pantheon"),
    ("pact", "The Patron Beyond"),
    ("blood", "The Crimson Matriarch"),
    ("names", "The Keeper of True Names"),
    ("breath", "The First Wind"),
    ("emotional", "The Heart's Chorus"),
];

/// The deity reviewing spells of a paradigm.
#[must_use]
pub fn deity_for(paradigm: Option<&str>) -> &'static str {
    paradigm
        .and_then(|p| DEITIES.iter().find(|(key, _)| key.eq_ignore_ascii_case(p)))
        .map_or(DEFAULT_DEITY, |(_, deity)| deity)
}

pub const APPROVAL: &[&str] = &[
    "{deity} finds the weave sound and grants it passage into the world.",
    "{deity} nods once. The spell may be spoken.",
    "{deity} accepts the working and records its name.",
];

pub const EXCEPTIONAL: &[&str] = &[
    "{deity} is moved. A working of rare elegance joins the canon.",
    "{deity} rises in acclaim. This spell will be taught for ages.",
];

pub const INVALID: &[&str] = &[
    "{deity} will not look upon a malformed weave.",
    "{deity} turns away. The working does not hold together.",
];

const SAFETY: &[&str] = &[
    "{deity} recoils. This power would tear the world apart.",
    "{deity} seals the working away. It is too dangerous to exist.",
];

const BALANCE: &[&str] = &[
    "{deity} weighs the spell and finds the scales broken.",
    "{deity} frowns. The working tips the balance of power.",
];

const COMPLETENESS: &[&str] = &[
    "{deity} sees only fragments. The weave is unfinished.",
    "{deity} cannot bless what has no shape.",
];

const CREATIVITY: &[&str] = &[
    "{deity} yawns. The world has seen this spell a thousand times.",
    "{deity} asks for more than a common cantrip.",
];

const OVERALL: &[&str] = &[
    "{deity} finds the working adequate in parts but lacking as a whole.",
    "{deity} hesitates, then withholds the blessing.",
];

/// Rejection phrasings for a failed category.
#[must_use]
pub fn rejection(category: ScoreCategory) -> &'static [&'static str] {
    match category {
        ScoreCategory::Safety => SAFETY,
        ScoreCategory::Balance => BALANCE,
        ScoreCategory::Completeness => COMPLETENESS,
        ScoreCategory::Creativity => CREATIVITY,
        ScoreCategory::Overall => OVERALL,
    }
}

/// Fill in the deity placeholder.
#[must_use]
pub fn render(template: &str, deity: &str) -> String {
    template.replace("{deity}", deity)
}
