/// Label allocation with two-character prefix claims.
///
/// Every live labelled target holds a claim on the first two characters of
/// its label (or the whole label when shorter).  New labels are drawn from a
/// difficulty-tiered vocabulary until one with an unclaimed prefix turns up;
/// after a bounded number of attempts a conflicting label is accepted rather
/// than stalling the spawn.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::debug;

/// Default retry budget before accepting a prefix conflict.
pub const LABEL_ATTEMPTS: usize = 50;

// ── Vocabulary ───────────────────────────────────────────────────────────────

const TOP_ROW: &str = "qwertyuiop";
const HOME_ROW: &str = "asdfghjkl;";
const BOTTOM_ROW: &str = "zxcvbnm";

const TOP_WEIGHT: u32 = 1;
const HOME_WEIGHT: u32 = 5;
const BOTTOM_WEIGHT: u32 = 2;

/// Levels below this use single keys; from here on missiles carry words.
pub const FIRST_WORD_LEVEL: u32 = 3;

const THREE_LETTER: &[&str] = &["cat", "dog", "run", "car", "sun", "red", "big", "hot", "old", "new"];
const FOUR_LETTER: &[&str] = &["fire", "help", "jump", "fast", "slow", "cold", "blue", "dark", "long", "safe"];
const FIVE_LETTER: &[&str] = &["power", "laser", "blast", "storm", "quick", "magic", "space", "fight", "brave", "peace"];
const SIX_LETTER: &[&str] = &["defend", "shield", "attack", "weapon", "strong", "danger", "flight", "battle", "energy", "launch"];
const LONG: &[&str] = &["missile", "defense", "protect", "freedom", "victory", "command", "destroy", "counter", "nuclear", "warfare"];

/// Deliberately awkward words for bonus ships.
pub const POWERUP_WORDS: &[&str] = &[
    "zyx", "qaz", "wsx", "xqz", "jkl", "mnb", "zxc",
    "lynx", "jinx", "quiz", "fizz", "fuzz", "jazz", "buzz", "whiz",
    "whatev", "istg", "tbh", "irl", "nvm", "ttyl", "brb", "smh",
    "zygote", "rhythm", "psycho", "sphinx", "fjords", "glyph", "nymph",
    "snatched", "pressed", "cappin", "ghosted", "bussin", "slayed",
    "xylophone", "zephyr", "syzygy", "byzantine", "schizoid", "rhapsody",
    "labyrinth", "synchrony", "toxicity", "xerophyte",
];

/// Word pool for missiles at `difficulty` (only meaningful from
/// `FIRST_WORD_LEVEL` upwards).
pub fn word_tier(difficulty: u32) -> Vec<&'static str> {
    let tiers: &[&[&str]] = match difficulty {
        0..=5 => &[THREE_LETTER],
        6..=8 => &[THREE_LETTER, FOUR_LETTER],
        9..=12 => &[FOUR_LETTER, FIVE_LETTER],
        13..=16 => &[FIVE_LETTER, SIX_LETTER],
        _ => &[SIX_LETTER, LONG],
    };
    tiers.iter().flat_map(|t| t.iter().copied()).collect()
}

/// One random missile label: a home-row-biased single key at low levels,
/// a tiered word afterwards.
pub fn missile_candidate(difficulty: u32, rng: &mut impl Rng) -> String {
    if difficulty < FIRST_WORD_LEVEL {
        let rows = [(TOP_ROW, TOP_WEIGHT), (HOME_ROW, HOME_WEIGHT), (BOTTOM_ROW, BOTTOM_WEIGHT)];
        let keys: Vec<char> = rows.iter().flat_map(|(row, _)| row.chars()).collect();
        let weights: Vec<u32> = rows
            .iter()
            .flat_map(|(row, w)| std::iter::repeat(*w).take(row.len()))
            .collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => keys[dist.sample(rng)].to_string(),
            Err(_) => HOME_ROW[..1].to_string(),
        }
    } else {
        word_tier(difficulty)
            .choose(rng)
            .copied()
            .unwrap_or("cat")
            .to_string()
    }
}

/// The claimable prefix: first two characters, lowercased.
pub fn prefix_of(label: &str) -> String {
    label.chars().take(2).flat_map(char::to_lowercase).collect()
}

// ── Allocator ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LabelAllocator {
    /// Prefix → number of live targets holding it.  More than one only after
    /// a forced fallback.
    claims: HashMap<String, usize>,
    attempts: usize,
}

impl Default for LabelAllocator {
    fn default() -> Self {
        Self::new(LABEL_ATTEMPTS)
    }
}

impl LabelAllocator {
    pub fn new(attempts: usize) -> Self {
        Self {
            claims: HashMap::new(),
            attempts,
        }
    }

    pub fn can_claim(&self, label: &str) -> bool {
        !self.claims.contains_key(&prefix_of(label))
    }

    /// Number of live claims on the prefix of `label`.
    pub fn holders(&self, label: &str) -> usize {
        self.claims.get(&prefix_of(label)).copied().unwrap_or(0)
    }

    pub fn claim(&mut self, label: &str) {
        *self.claims.entry(prefix_of(label)).or_insert(0) += 1;
    }

    pub fn release(&mut self, label: &str) {
        let prefix = prefix_of(label);
        if let Some(count) = self.claims.get_mut(&prefix) {
            *count -= 1;
            if *count == 0 {
                self.claims.remove(&prefix);
            }
        }
    }

    /// Allocate and claim a missile label for `difficulty`.
    pub fn allocate(&mut self, difficulty: u32, rng: &mut impl Rng) -> String {
        for _ in 0..self.attempts {
            let candidate = missile_candidate(difficulty, rng);
            if self.can_claim(&candidate) {
                self.claim(&candidate);
                return candidate;
            }
        }
        let fallback = missile_candidate(difficulty, rng);
        debug!(label = %fallback, "label attempts exhausted, accepting prefix conflict");
        self.claim(&fallback);
        fallback
    }

    /// Allocate and claim a label from a fixed word list: random picks first,
    /// then an in-order scan, then any word.
    pub fn allocate_from(&mut self, words: &[&str], rng: &mut impl Rng) -> String {
        let label = self.pick_from(words, rng);
        self.claim(&label);
        label
    }

    fn pick_from(&self, words: &[&str], rng: &mut impl Rng) -> String {
        for _ in 0..self.attempts {
            if let Some(word) = words.choose(rng) {
                if self.can_claim(word) {
                    return word.to_string();
                }
            }
        }
        if let Some(word) = words.iter().find(|w| self.can_claim(w)) {
            return word.to_string();
        }
        debug!("word list exhausted, accepting prefix conflict");
        words.choose(rng).map(|w| w.to_string()).unwrap_or_default()
    }
}
