use std::collections::{HashMap, HashSet};

use crate::analyzers::classify::DEFAULT_LABEL;
use crate::analyzers::types::SummaryRow;

const MAX_SUGGESTIONS: usize = 20;

/// Labels whose titles are mined for new keywords.
static GENERIC_LABELS: &[&str] = &[DEFAULT_LABEL, "Graphic"];

static STOP_WORDS: &[&str] = &[
    "dan", "the", "for", "a", "of", "in", "with", "on", "template", "effect", "set", "pack", "and",
    "or", "is", "are", "to",
];

/// Proposes keywords from titles that only landed in generic labels.
///
/// Words must be longer than two letters, appear more than once, and not
/// already be part of an existing keyword. Most frequent first.
pub fn suggest_keywords<S: AsRef<str>>(summary: &[SummaryRow], existing: &[S]) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let known_parts: HashSet<String> = existing
        .iter()
        .flat_map(|k| {
            k.as_ref()
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let titles = summary
        .iter()
        .filter(|row| GENERIC_LABELS.contains(&row.label.as_str()))
        .flat_map(|row| &row.items)
        .map(|item| item.title.to_lowercase());

    for title in titles {
        for word in title.split_whitespace() {
            let word: String = word.chars().filter(|c| c.is_ascii_lowercase()).collect();
            if word.len() <= 2 || stop_words.contains(word.as_str()) {
                continue;
            }
            let count = counts.entry(word.clone()).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }
    }

    let mut words: Vec<String> = order
        .into_iter()
        .filter(|w| counts[w] > 1 && !known_parts.contains(w))
        .collect();
    words.sort_by(|a, b| counts[b].cmp(&counts[a]));
    words.truncate(MAX_SUGGESTIONS);
    words
}
