//! Deterministic formatting rules: the fixed voice-command vocabulary,
//! filler removal, sentence capitalization and dictionary replacement.
//!
//! These implement the exact substitution semantics the formatter
//! guarantees; the model-based formatter is prompted with the same
//! vocabulary, and dictionary replacement always runs through
//! [`apply_dictionary`] regardless of which path produced the text.

use crate::settings::Dictionary;

/// What a matched voice command inserts.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Punctuation attached to the preceding word (".", ",", "?", "!",
    /// ")", ":").
    Punct(char),
    /// A line break ("\n") or paragraph break ("\n\n").
    Break(&'static str),
    /// An opening bracket; the following word attaches to it.
    Open(char),
}

/// Fixed vocabulary, longest phrases first so they win over prefixes.
const COMMANDS: &[(&[&str], Command)] = &[
    (&["new", "paragraph"], Command::Break("\n\n")),
    (&["new", "line"], Command::Break("\n")),
    (&["newline"], Command::Break("\n")),
    (&["full", "stop"], Command::Punct('.')),
    (&["period"], Command::Punct('.')),
    (&["comma"], Command::Punct(',')),
    (&["question", "mark"], Command::Punct('?')),
    (&["exclamation", "mark"], Command::Punct('!')),
    (&["exclamation", "point"], Command::Punct('!')),
    (&["open", "bracket"], Command::Open('(')),
    (&["close", "bracket"], Command::Punct(')')),
    (&["colon"], Command::Punct(':')),
];

/// Filler words/phrases removed wherever they appear as standalone words.
///
/// Filler-usage "like" is deliberately absent: telling filler "like" from
/// the verb/preposition needs the model, so only the model removes it.
const FILLERS: &[&[&str]] = &[
    &["you", "know"],
    &["sort", "of"],
    &["kind", "of"],
    &["um"],
    &["uh"],
];

fn phrase_matches(words: &[&str], phrase: &[&str]) -> bool {
    words.len() >= phrase.len()
        && phrase
            .iter()
            .zip(words)
            .all(|(p, w)| w.eq_ignore_ascii_case(p))
}

fn match_command(words: &[&str]) -> Option<(usize, Command)> {
    COMMANDS
        .iter()
        .find(|(phrase, _)| phrase_matches(words, phrase))
        .map(|(phrase, command)| (phrase.len(), *command))
}

/// Remove standalone filler words and phrases.
pub fn remove_fillers(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        if let Some(phrase) = FILLERS.iter().find(|p| phrase_matches(&words[i..], p)) {
            i += phrase.len();
        } else {
            kept.push(words[i]);
            i += 1;
        }
    }

    kept.join(" ")
}

/// Substitute spoken voice commands with their characters.
pub fn apply_voice_commands(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out = String::new();
    let mut glue_next = false; // suppress the space after an opening bracket

    let mut i = 0;
    while i < words.len() {
        if let Some((consumed, command)) = match_command(&words[i..]) {
            match command {
                Command::Punct(c) => out.push(c),
                Command::Break(s) => out.push_str(s),
                Command::Open(c) => {
                    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                        out.push(' ');
                    }
                    out.push(c);
                    glue_next = true;
                }
            }
            i += consumed;
        } else {
            if !out.is_empty() && !out.ends_with('\n') && !glue_next {
                out.push(' ');
            }
            out.push_str(words[i]);
            glue_next = false;
            i += 1;
        }
    }

    out
}

/// Capitalize the first letter of the text and of each sentence.
pub fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_sentence_start = true;

    for c in text.chars() {
        if at_sentence_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            at_sentence_start = false;
        } else {
            if matches!(c, '.' | '?' | '!' | '\n') {
                at_sentence_start = true;
            } else if !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | '\'') {
                at_sentence_start = false;
            }
            out.push(c);
        }
    }

    out
}

/// Full local formatting pass: fillers, voice commands, capitalization.
pub fn format_locally(text: &str) -> String {
    capitalize_sentences(&apply_voice_commands(&remove_fillers(text)))
}

/// Apply dictionary replacements exactly as configured: term-for-term,
/// case-sensitive literal match per entry.
pub fn apply_dictionary(text: &str, dictionary: &Dictionary) -> String {
    let mut out = text.to_string();
    for (term, replacement) in dictionary {
        if term.is_empty() {
            continue;
        }
        out = out.replace(term, replacement);
    }
    out
}
