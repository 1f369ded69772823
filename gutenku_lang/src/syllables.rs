// English syllable counter.
//
// A vowel-group heuristic with a handful of suffix corrections and an
// exceptions table (`wordlists::SYLLABLE_EXCEPTIONS`). It is deliberately the
// ONLY counter in the project: verse-pool extraction and chromosome
// validation both call `count_text_syllables`, so a verse admitted as five
// syllables is always re-validated as five syllables.
//
// Rules, applied to the lower-cased ASCII letters of a word:
// 1. Exceptions table wins.
// 2. Words of three letters or fewer are one syllable.
// 3. Count maximal vowel groups (a, e, i, o, u, and y when not word-initial).
// 4. Silent final `e` (not `-le` after a consonant, not `-ee`) drops one.
// 5. Final `-es`/`-ed` after a consonant drops one, except after the
//    sibilant or dental endings that keep the extra syllable (wanted, horses).
// 6. `io`/`ia` not preceded by t, s, c, g, or x splits into two syllables
//    (violet, giant).
// 7. `-ing` after a vowel adds one (going, being).
// Every alphabetic word counts at least one syllable.

use crate::text::tokenize_words;
use crate::wordlists::syllable_exception;

fn is_vowel(letters: &[u8], i: usize) -> bool {
    match letters[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => true,
        b'y' => i > 0,
        _ => false,
    }
}

/// Count the syllables in a single word. Non-alphabetic tokens (numbers,
/// punctuation) count zero.
pub fn count_syllables(word: &str) -> u32 {
    let lower = word.to_lowercase();
    let ascii: String = lower.chars().filter(char::is_ascii_lowercase).collect();
    if ascii.is_empty() {
        return 0;
    }
    if let Some(n) = syllable_exception(&ascii) {
        return n;
    }
    let letters = ascii.as_bytes();
    let n = letters.len();
    if n <= 3 {
        return 1;
    }

    let mut count: i32 = 0;
    let mut in_group = false;
    for i in 0..n {
        let v = is_vowel(letters, i);
        if v && !in_group {
            count += 1;
        }
        in_group = v;
    }

    let last = letters[n - 1];
    let prev = letters[n - 2];
    let before_prev = letters[n - 3];

    if last == b'e' {
        let consonant_le = prev == b'l' && !is_vowel(letters, n - 3);
        if !consonant_le && !is_vowel(letters, n - 2) {
            count -= 1;
        }
    } else if (last == b's' || last == b'd') && prev == b'e' && !is_vowel(letters, n - 3) {
        let keeps_syllable = match last {
            b'd' => matches!(before_prev, b't' | b'd'),
            _ => {
                matches!(before_prev, b's' | b'z' | b'x' | b'c' | b'g')
                    || (before_prev == b'h' && n >= 4 && matches!(letters[n - 4], b's' | b'c'))
            }
        };
        if !keeps_syllable {
            count -= 1;
        }
    }

    for i in 1..n - 1 {
        let split_pair = letters[i] == b'i' && matches!(letters[i + 1], b'o' | b'a');
        if split_pair && !matches!(letters[i - 1], b't' | b's' | b'c' | b'g' | b'x') {
            count += 1;
        }
    }

    if lower.ends_with("ing") && n >= 5 && is_vowel(letters, n - 4) {
        count += 1;
    }

    count.max(1) as u32
}

/// Total syllables over every word in a text.
pub fn count_text_syllables(text: &str) -> u32 {
    tokenize_words(text).iter().map(|w| count_syllables(w)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_words_are_one_syllable() {
        for w in ["a", "the", "sky", "sun", "old"] {
            assert_eq!(count_syllables(w), 1, "{w}");
        }
    }

    #[test]
    fn vowel_groups() {
        assert_eq!(count_syllables("river"), 2);
        assert_eq!(count_syllables("yellow"), 2);
        assert_eq!(count_syllables("butterfly"), 3);
        assert_eq!(count_syllables("tree"), 1);
        assert_eq!(count_syllables("autumn"), 2);
    }

    #[test]
    fn silent_e_and_le() {
        assert_eq!(count_syllables("stone"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("gentle"), 2);
    }

    #[test]
    fn past_tense_and_plurals() {
        assert_eq!(count_syllables("walked"), 1);
        assert_eq!(count_syllables("wanted"), 2);
        assert_eq!(count_syllables("leaves"), 1);
        assert_eq!(count_syllables("horses"), 2);
        assert_eq!(count_syllables("trees"), 1);
        assert_eq!(count_syllables("branches"), 2);
    }

    #[test]
    fn split_vowel_pairs_and_ing() {
        assert_eq!(count_syllables("violet"), 3);
        assert_eq!(count_syllables("nation"), 2);
        assert_eq!(count_syllables("going"), 2);
        assert_eq!(count_syllables("singing"), 2);
    }

    #[test]
    fn exceptions_and_non_words() {
        assert_eq!(count_syllables("quiet"), 2);
        assert_eq!(count_syllables("Evening"), 2);
        assert_eq!(count_syllables("1865"), 0);
        assert_eq!(count_syllables("--"), 0);
    }

    #[test]
    fn text_totals() {
        assert_eq!(count_text_syllables("An old silent pond"), 5);
        assert_eq!(count_text_syllables("A frog jumps into the pond"), 7);
        assert_eq!(count_text_syllables("Splash! Silence again."), 5);
    }
}
