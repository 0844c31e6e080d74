//! Identifier resolution
//!
//! Turns a loose identifier ("2", a message ID, "boss", "invoice") into one
//! message out of a list of candidates. Strategies are tried in a fixed order
//! and the first hit wins:
//!
//! 1. 1-based position in the candidate list
//! 2. exact message ID
//! 3. case-insensitive substring of sender or subject, in list order

use crate::models::MessageRef;

/// Which strategy matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Position(usize),
    ExactId,
    Text,
}

/// A successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub message: &'a MessageRef,
    pub kind: MatchKind,
}

/// Resolve `identifier` against `candidates`, or `None` if nothing matches
pub fn resolve<'a>(identifier: &str, candidates: &'a [MessageRef]) -> Option<Resolved<'a>> {
    if candidates.is_empty() {
        return None;
    }

    by_position(identifier, candidates)
        .or_else(|| by_exact_id(identifier, candidates))
        .or_else(|| by_text(identifier, candidates))
}

fn by_position<'a>(identifier: &str, candidates: &'a [MessageRef]) -> Option<Resolved<'a>> {
    let position: i64 = identifier.trim().parse().ok()?;
    let index = usize::try_from(position).ok()?.checked_sub(1)?;
    candidates.get(index).map(|message| Resolved {
        message,
        kind: MatchKind::Position(index + 1),
    })
}

fn by_exact_id<'a>(identifier: &str, candidates: &'a [MessageRef]) -> Option<Resolved<'a>> {
    candidates
        .iter()
        .find(|m| m.id.as_str() == identifier)
        .map(|message| Resolved {
            message,
            kind: MatchKind::ExactId,
        })
}

fn by_text<'a>(identifier: &str, candidates: &'a [MessageRef]) -> Option<Resolved<'a>> {
    let needle = identifier.to_lowercase();
    candidates
        .iter()
        .find(|m| {
            m.sender.to_lowercase().contains(&needle) || m.subject.to_lowercase().contains(&needle)
        })
        .map(|message| Resolved {
            message,
            kind: MatchKind::Text,
        })
}
