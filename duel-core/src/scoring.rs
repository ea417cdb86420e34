use duel_types::{LetterStatus, ScoredLetter};
use std::collections::HashMap;

/// Score a guess against the target word with the standard two-pass coloring.
///
/// Pass 1 marks exact position matches Correct and consumes those target
/// letters. Pass 2 walks the remaining guess letters and marks each Present if
/// an unconsumed copy of it is left in the target, else Absent. Works for any
/// word length; both inputs are compared case-insensitively.
///
/// This is the only copy of the algorithm in the codebase. The store-side
/// match evaluator and every client-facing color come from here.
pub fn score_guess(guess: &str, target: &str) -> Vec<ScoredLetter> {
    let guess_chars: Vec<char> = guess.to_lowercase().chars().collect();
    let target_chars: Vec<char> = target.to_lowercase().chars().collect();

    // Unconsumed letter counts in the target
    let mut remaining: HashMap<char, usize> = HashMap::new();
    for &ch in &target_chars {
        *remaining.entry(ch).or_insert(0) += 1;
    }

    let mut letters: Vec<ScoredLetter> = guess_chars
        .iter()
        .enumerate()
        .map(|(i, &ch)| ScoredLetter {
            letter: ch.to_string(),
            status: LetterStatus::Absent,
            position: i as i32,
        })
        .collect();

    // First pass: exact positions
    for (i, &ch) in guess_chars.iter().enumerate() {
        if i < target_chars.len() && target_chars[i] == ch {
            letters[i].status = LetterStatus::Correct;
            if let Some(count) = remaining.get_mut(&ch) {
                *count -= 1;
            }
        }
    }

    // Second pass: misplaced letters, bounded by what pass 1 left unconsumed
    for (i, &ch) in guess_chars.iter().enumerate() {
        if letters[i].status == LetterStatus::Correct {
            continue;
        }
        if let Some(count) = remaining.get_mut(&ch) {
            if *count > 0 {
                *count -= 1;
                letters[i].status = LetterStatus::Present;
            }
        }
    }

    letters
}

/// A guess wins when it equals the target, ignoring case.
pub fn is_winning_guess(guess: &str, target: &str) -> bool {
    guess.to_lowercase() == target.to_lowercase()
}
