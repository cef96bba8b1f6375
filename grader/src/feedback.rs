//! Templated feedback messages.
//!
//! A [`FeedbackMessage`] is a base template plus conditional clauses. Each
//! clause is tied to a slot and is rendered only when that slot was set.
//! Placeholders look like `${name}`; unknown placeholders stay verbatim.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::{Captures, Regex};
use serde::Serialize;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

/// Student-facing result of a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: String,
    /// Line of the student construct the message is about, if any.
    pub line: Option<usize>,
}

impl Feedback {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Feedback {
            message: message.into(),
            line,
        }
    }
}

/// Outcome of a check that did not hit an authoring error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(Feedback),
}

impl Outcome {
    pub fn fail(message: impl Into<String>, line: Option<usize>) -> Self {
        Outcome::Fail(Feedback::new(message, line))
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackMessage {
    template: String,
    slots: IndexMap<String, String>,
    clauses: Vec<(String, String)>,
    rendered: OnceCell<String>,
}

impl FeedbackMessage {
    pub fn new(template: impl Into<String>) -> Self {
        FeedbackMessage {
            template: template.into(),
            slots: IndexMap::new(),
            clauses: Vec::new(),
            rendered: OnceCell::new(),
        }
    }

    pub fn set_slot(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(name.into(), value.into());
        self.rendered = OnceCell::new();
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_slot(name, value);
        self
    }

    /// Registers `clause`, rendered after the base template iff `slot` is set.
    pub fn cond_append(&mut self, slot: impl Into<String>, clause: impl Into<String>) {
        self.clauses.push((slot.into(), clause.into()));
        self.rendered = OnceCell::new();
    }

    /// The rendered text. Computed once until a slot or clause changes.
    pub fn render(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut text = self.template.clone();
            for (slot, clause) in &self.clauses {
                if self.slots.contains_key(slot) {
                    text.push_str(clause);
                }
            }
            PLACEHOLDER
                .replace_all(&text, |caps: &Captures| match self.slots.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                })
                .into_owned()
        })
    }

    pub fn into_feedback(self, line: Option<usize>) -> Feedback {
        let message = self.render().to_string();
        Feedback { message, line }
    }
}

/// English ordinal of a 1-based position.
pub fn ordinal(n: usize) -> String {
    const WORDS: [&str; 10] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
        "tenth",
    ];
    if (1..=WORDS.len()).contains(&n) {
        return WORDS[n - 1].to_string();
    }
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Lower-cases the first character, for messages embedded mid-sentence.
pub fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call_message() -> FeedbackMessage {
        let mut msg = FeedbackMessage::new("Did you call `${name}()` with the correct arguments?");
        msg.cond_append("line", " The call on line ${line} has wrong arguments.");
        msg.cond_append("keyword", " Keyword `${keyword}` seems to be incorrect.");
        msg.set_slot("name", "round");
        msg
    }

    #[test]
    fn clauses_render_only_for_set_slots() {
        let mut msg = call_message();
        msg.set_slot("line", "3");
        assert_eq!(
            msg.render(),
            "Did you call `round()` with the correct arguments? The call on line 3 has wrong arguments."
        );
        assert!(!msg.render().contains("Keyword"));
    }

    #[test]
    fn setting_a_slot_invalidates_the_render() {
        let mut msg = call_message();
        let before = msg.render().to_string();
        msg.set_slot("keyword", "ndigits");
        assert_ne!(msg.render(), before);
        assert!(msg.render().ends_with(" Keyword `ndigits` seems to be incorrect."));
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        let msg = FeedbackMessage::new("${name} and ${missing}").with_slot("name", "f");
        assert_eq!(msg.render(), "f and ${missing}");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "first");
        assert_eq!(ordinal(10), "tenth");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(103), "103rd");
        assert_eq!(lowercase_first("Did you"), "did you");
    }
}
