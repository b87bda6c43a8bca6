/// The typed-sequence matcher.
///
/// One global buffer of recently typed characters is matched against every
/// live label by character *multiset*, not by position: a label is complete
/// as soon as each of its letters is present in the buffer often enough,
/// whatever order they were typed in and whatever noise sits between them.
///
/// Per keystroke:
///   1. append the (lowercased) character;
///   2. check labels longest first, each one consuming its letters from a
///      shared pool so two words never claim the same keystroke;
///   3. on a match, drop the consumed letters and report every matched target;
///   4. otherwise keep the buffer while it is still a plausible start of
///      something on screen, or clear it and report a miss.  A miss on a
///      letter that appears in no label at all is a *dead key*.
///
/// Labels already waiting for the turret are `held`: they still count as on
/// screen for step 4 but can not be completed a second time.

use std::collections::HashMap;

use crate::entities::{TargetId, TargetKind};
use crate::target::Target;

/// Keys that take part in typing; anything else is ignored.
pub const ALLOWED_KEYS: &str = "qwertyuiopasdfghjkl;zxcvbnm";

/// A live label offered to the matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: TargetId,
    pub kind: TargetKind,
    pub label: String,
    pub held: bool,
}

impl Candidate {
    pub fn new(id: TargetId, kind: TargetKind, label: &str) -> Self {
        Self {
            id,
            kind,
            label: label.to_lowercase(),
            held: false,
        }
    }

    /// Mark the label as already matched and waiting for destruction.
    pub fn held(mut self) -> Self {
        self.held = true;
        self
    }

    pub fn from_target(target: &dyn Target) -> Option<Self> {
        target
            .label()
            .filter(|l| !l.is_empty())
            .map(|l| Self::new(target.id(), target.kind(), l))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a typing key; nothing changed.
    Ignored,
    /// One or more labels completed, longest first.
    Matched(Vec<Candidate>),
    /// No match yet, but the buffer may still grow into one.
    Pending,
    /// The buffer was abandoned.  `dead_key` is set when the character
    /// appears in no live label at all.
    Miss { typed: String, dead_key: bool },
}

type Pool = HashMap<char, usize>;

fn pool_of(s: &str) -> Pool {
    let mut pool = Pool::new();
    for c in s.chars() {
        *pool.entry(c).or_insert(0) += 1;
    }
    pool
}

/// `true` when every character of `label` is available in `pool`.
fn covers(pool: &Pool, label: &str) -> bool {
    pool_of(label)
        .iter()
        .all(|(c, need)| pool.get(c).copied().unwrap_or(0) >= *need)
}

/// Remove one occurrence of each character of `label` from `pool`.
fn consume(pool: &mut Pool, label: &str) {
    for c in label.chars() {
        if let Some(n) = pool.get_mut(&c) {
            *n = n.saturating_sub(1);
        }
    }
}

/// Could the buffer still turn into a match?  The buffer is plausible when it
/// is a substring of some label, or when all of its letters can still be
/// placed somewhere among the live labels.
pub fn is_plausible(buffer: &str, candidates: &[Candidate]) -> bool {
    if candidates.iter().any(|c| c.label.contains(buffer)) {
        return true;
    }
    let mut available = Pool::new();
    for candidate in candidates {
        for (c, n) in pool_of(&candidate.label) {
            *available.entry(c).or_insert(0) += n;
        }
    }
    covers(&available, buffer)
}

/// Length of the longest buffer suffix that is a prefix of `label`.
pub fn highlight_len(label: &str, buffer: &str) -> usize {
    let label = label.to_lowercase();
    let chars: Vec<char> = buffer.chars().collect();
    (1..=chars.len())
        .rev()
        .map(|n| chars[chars.len() - n..].iter().collect::<String>())
        .find(|suffix| label.starts_with(suffix.as_str()))
        .map_or(0, |suffix| suffix.chars().count())
}

#[derive(Debug, Default, Clone)]
pub struct TypingMatcher {
    buffer: String,
}

impl TypingMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_allowed(c: char) -> bool {
        ALLOWED_KEYS.contains(c)
    }

    /// Feed one typed character against the current live labels.
    pub fn on_char(&mut self, c: char, candidates: &[Candidate]) -> KeyOutcome {
        let Some(c) = c.to_lowercase().next().filter(|c| Self::is_allowed(*c)) else {
            return KeyOutcome::Ignored;
        };
        self.buffer.push(c);

        let mut ordered: Vec<&Candidate> = candidates.iter().filter(|c| !c.held).collect();
        ordered.sort_by(|a, b| b.label.chars().count().cmp(&a.label.chars().count()));

        let mut pool = pool_of(&self.buffer);
        let mut matched = Vec::new();
        for candidate in ordered {
            if covers(&pool, &candidate.label) {
                consume(&mut pool, &candidate.label);
                matched.push(candidate.clone());
            }
        }

        if !matched.is_empty() {
            self.drop_consumed(&pool);
            return KeyOutcome::Matched(matched);
        }

        if is_plausible(&self.buffer, candidates) {
            return KeyOutcome::Pending;
        }

        let dead_key = !candidates.iter().any(|cand| cand.label.contains(c));
        let typed = std::mem::take(&mut self.buffer);
        KeyOutcome::Miss { typed, dead_key }
    }

    /// Keep only the characters left over in `pool`, in typing order.
    fn drop_consumed(&mut self, pool: &Pool) {
        let mut left = pool.clone();
        let mut kept = String::new();
        // Leftovers are the latest occurrences of each letter.
        for c in self.buffer.chars().rev() {
            if let Some(n) = left.get_mut(&c) {
                if *n > 0 {
                    *n -= 1;
                    kept.push(c);
                }
            }
        }
        self.buffer = kept.chars().rev().collect();
    }
}
