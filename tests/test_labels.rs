use std::collections::HashSet;

use keyblaster::labels::*;
use keyblaster::matcher::ALLOWED_KEYS;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── Prefix uniqueness ─────────────────────────────────────────────────────────

#[test]
fn single_key_labels_never_share_a_prefix() {
    let mut rng = seeded_rng();
    let mut alloc = LabelAllocator::default();
    let mut seen = HashSet::new();
    for _ in 0..10 {
        let label = alloc.allocate(1, &mut rng);
        assert_eq!(label.chars().count(), 1);
        assert!(seen.insert(prefix_of(&label)), "prefix of {label:?} reused");
    }
}

#[test]
fn word_labels_never_share_a_prefix() {
    let mut rng = seeded_rng();
    let mut alloc = LabelAllocator::default();
    let mut seen = HashSet::new();
    for _ in 0..5 {
        let label = alloc.allocate(FIRST_WORD_LEVEL, &mut rng);
        assert!(label.chars().count() >= 3);
        assert!(seen.insert(prefix_of(&label)), "prefix of {label:?} reused");
    }
}

#[test]
fn released_prefix_can_be_reused() {
    let mut alloc = LabelAllocator::default();
    alloc.claim("dog");
    assert!(!alloc.can_claim("door"));
    alloc.release("dog");
    assert!(alloc.can_claim("door"));
    assert_eq!(alloc.holders("do"), 0);
}

// ── Forced exhaustion ─────────────────────────────────────────────────────────

#[test]
fn exhausted_single_keys_fall_back_to_a_conflict() {
    let mut rng = seeded_rng();
    let mut alloc = LabelAllocator::new(5);
    for key in ALLOWED_KEYS.chars() {
        alloc.claim(&key.to_string());
    }

    let label = alloc.allocate(1, &mut rng);
    assert_eq!(alloc.holders(&label), 2);
}

#[test]
fn exhausted_word_list_falls_back_to_a_conflict() {
    let mut rng = seeded_rng();
    let mut alloc = LabelAllocator::new(3);
    let words = ["zap", "zip", "quiz"];

    let first = alloc.allocate_from(&words, &mut rng);
    let second = alloc.allocate_from(&words, &mut rng);
    // Three words, three distinct prefixes
    assert_ne!(prefix_of(&first), prefix_of(&second));

    let _third = alloc.allocate_from(&words, &mut rng);
    let fourth = alloc.allocate_from(&words, &mut rng);
    assert_eq!(alloc.holders(&fourth), 2);
}

#[test]
fn word_list_scan_finds_the_last_free_word() {
    let mut rng = seeded_rng();
    // No random attempts at all: only the in-order scan can succeed
    let mut alloc = LabelAllocator::new(0);
    alloc.claim("fizz");
    alloc.claim("jazz");
    let label = alloc.allocate_from(&["fizz", "jazz", "buzz"], &mut rng);
    assert_eq!(label, "buzz");
}

// ── Vocabulary ────────────────────────────────────────────────────────────────

#[test]
fn early_levels_use_typing_keys() {
    let mut rng = seeded_rng();
    for _ in 0..100 {
        let label = missile_candidate(1, &mut rng);
        let c = label.chars().next().expect("non-empty label");
        assert!(ALLOWED_KEYS.contains(c));
    }
}

#[test]
fn word_tiers_lengthen_with_difficulty() {
    let shortest = |level| word_tier(level).iter().map(|w| w.len()).min().unwrap_or(0);
    assert_eq!(shortest(3), 3);
    assert!(shortest(10) >= 4);
    assert!(shortest(14) >= 5);
    assert!(shortest(30) >= 6);
}

#[test]
fn powerup_words_are_typeable() {
    for word in POWERUP_WORDS {
        assert!(word.chars().all(|c| ALLOWED_KEYS.contains(c)), "{word}");
    }
}
