//! Lexical classifier for free-text ordering requests.
//!
//! Russian guest phrasing is matched against a fixed lexicon; nothing here is
//! probabilistic. Parsing never fails: any field that is not detected keeps
//! its default, so the output is always a usable [`GuestIntent`].

use smartmenu_core::{Category, GuestIntent, Tag};

/// Words that may follow a digit to mark it as a party size.
const PERSON_WORDS: [&str; 6] = ["человек", "чел", "людей", "нас", "гост", "персон"];

/// Spelled-out party sizes. Applied after the digit scan, so a number word
/// later in the text overrides a digit match.
const NUMBER_WORDS: [(&str, u32); 5] =
    [("двое", 2), ("трое", 3), ("четверо", 4), ("пятеро", 5), ("шестеро", 6)];

/// Maps a free-form request to a structured intent. Detection order matters:
/// digit-plus-person-word first, then the explicit "нас N" form, then the
/// number-word lexicon, each overriding the previous when both fire.
pub fn parse_request(text: &str) -> GuestIntent {
    let lower = text.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();

    let mut intent = GuestIntent::default();

    if let Some(people) = scan_people(&chars) {
        intent.people = people;
    }
    if let Some(people) = scan_explicit_party(&chars) {
        intent.people = people;
    }
    for (word, value) in NUMBER_WORDS {
        if lower.contains(word) {
            intent.people = value;
        }
    }

    if let Some(budget) = scan_budget(&chars) {
        intent.budget_kzt = budget;
    }

    if lower.contains("кальян") {
        intent.must_have.push(Category::Hookah);
    }
    if lower.contains("центр") || lower.contains("сет") {
        intent.must_have.push(Category::Sets);
    }

    if lower.contains("без алкоголя") || lower.contains("безалкоголь") {
        intent.exclude_tags.push(Tag::NoAlcohol);
    }
    if lower.contains("без свинины") || lower.contains("халяль") {
        intent.exclude_tags.push(Tag::Halal);
    }
    if lower.contains("не остр") || lower.contains("без остр") {
        intent.exclude_tags.push(Tag::NotSpicy);
    }
    if lower.contains("веган") {
        intent.exclude_tags.push(Tag::Vegan);
    }

    if lower.contains("сладк") {
        intent.preference_tags.push(Tag::Sweet);
    }
    if lower.contains("под кальян") {
        intent.preference_tags.push(Tag::ForHookah);
    }

    intent
}

/// First one- or two-digit number directly followed by a person word.
fn scan_people(chars: &[char]) -> Option<u32> {
    let mut index = 0;
    while index < chars.len() {
        if !chars[index].is_ascii_digit() {
            index += 1;
            continue;
        }

        let run_end = digit_run_end(chars, index);
        let run_len = run_end - index;
        let mut after = run_end;
        while after < chars.len() && chars[after].is_whitespace() {
            after += 1;
        }

        if run_len <= 2 && PERSON_WORDS.iter().any(|word| starts_with(chars, after, word)) {
            return parse_digits(&chars[index..run_end]).map(|value| value as u32);
        }

        index = run_end;
    }
    None
}

/// The explicit "нас N" form, which outranks a plain digit match.
fn scan_explicit_party(chars: &[char]) -> Option<u32> {
    let marker: Vec<char> = "нас".chars().collect();
    for index in 0..chars.len() {
        if !starts_with(chars, index, "нас") {
            continue;
        }

        let mut cursor = index + marker.len();
        let whitespace_start = cursor;
        while cursor < chars.len() && chars[cursor].is_whitespace() {
            cursor += 1;
        }
        if cursor == whitespace_start || cursor >= chars.len() || !chars[cursor].is_ascii_digit() {
            continue;
        }

        let run_end = digit_run_end(chars, cursor);
        return parse_digits(&chars[cursor..run_end]).map(|value| value as u32);
    }
    None
}

/// First currency-tagged amount: `N ₸`, `бюджет N`, `N тенге`, or `N тг`,
/// tried in that order at each position. Digits may embed spaces as thousand
/// separators; they are stripped before parsing.
fn scan_budget(chars: &[char]) -> Option<i64> {
    for index in 0..chars.len() {
        if chars[index].is_ascii_digit() {
            let (amount, after) = take_spaced_number(chars, index);
            if after < chars.len() && chars[after] == '₸' {
                if let Some(value) = amount {
                    return Some(value);
                }
            }
            if starts_with(chars, after, "тенге") || starts_with(chars, after, "тг") {
                if let Some(value) = amount {
                    return Some(value);
                }
            }
        }

        if starts_with(chars, index, "бюджет") {
            let mut cursor = index + "бюджет".chars().count();
            while cursor < chars.len() && chars[cursor].is_whitespace() {
                cursor += 1;
            }
            if cursor < chars.len() && chars[cursor].is_ascii_digit() {
                let (amount, _) = take_spaced_number(chars, cursor);
                if let Some(value) = amount {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Consumes a digit run that may continue across single spaces, returning the
/// parsed value and the index just past the run.
fn take_spaced_number(chars: &[char], start: usize) -> (Option<i64>, usize) {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == ' ') {
        end += 1;
    }
    (parse_digits(&chars[start..end]), end)
}

fn parse_digits(run: &[char]) -> Option<i64> {
    let digits: String = run.iter().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn starts_with(chars: &[char], index: usize, word: &str) -> bool {
    let mut cursor = index;
    for expected in word.chars() {
        if chars.get(cursor) != Some(&expected) {
            return false;
        }
        cursor += 1;
    }
    true
}
