//! Prompt templates with validated named placeholders.
//!
//! A template is parsed once when it is created. `{name}` is a placeholder,
//! `{{` and `}}` are literal braces, and any other brace is rejected up front
//! so a typo can never reach a model as a half-rendered prompt.

use std::collections::BTreeMap;

use crate::error::TemplateError;

/// Named values bound into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of `self` with every entry of `overrides` layered on top.
    #[must_use]
    pub fn merged(&self, overrides: &Bindings) -> Bindings {
        let mut merged = self.clone();
        merged
            .0
            .extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// An immutable prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `text` into a template. `name` only appears in error messages.
    pub fn new(name: impl Into<String>, text: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let segments = parse_segments(&name, text)?;
        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name.as_str())
            {
                names.push(name);
            }
        }
        names
    }

    /// Verify that `bindings` covers every placeholder, without rendering.
    pub fn check(&self, bindings: &Bindings) -> Result<(), TemplateError> {
        match self.placeholders().into_iter().find(|p| !bindings.contains(p)) {
            Some(missing) => Err(self.missing(missing)),
            None => Ok(()),
        }
    }

    /// Substitute every placeholder with its bound value.
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = bindings.get(name).ok_or_else(|| self.missing(name))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn missing(&self, placeholder: &str) -> TemplateError {
        TemplateError::MissingBinding {
            template: self.name.clone(),
            placeholder: placeholder.to_string(),
        }
    }
}

/// Render `template` with `bindings`.
pub fn render(template: &PromptTemplate, bindings: &Bindings) -> Result<String, TemplateError> {
    template.render(bindings)
}

fn parse_segments(name: &str, text: &str) -> Result<Vec<Segment>, TemplateError> {
    let malformed = |position: usize, reason: &'static str| TemplateError::Malformed {
        template: name.to_string(),
        position,
        reason,
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().is_some_and(|(_, next)| *next == '}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(malformed(idx, "unmatched '}' (use '}}' for a literal brace)")),
            '{' => {
                let rest = &text[idx + 1..];
                let end = rest
                    .find('}')
                    .ok_or_else(|| malformed(idx, "unclosed placeholder"))?;
                let placeholder = &rest[..end];
                if !is_identifier(placeholder) {
                    return Err(malformed(
                        idx,
                        "placeholder must be an identifier (use '{{' for a literal brace)",
                    ));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(placeholder.to_string()));
                // Skip the placeholder body and its closing brace.
                for _ in 0..=placeholder.chars().count() {
                    chars.next();
                }
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Sanitize untrusted text (scraped pages, user payloads) before it is
/// embedded in a prompt.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("```", "'''")
        .replace("##", "//")
        .lines()
        .take(MAX_PROMPT_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line cap applied by [`sanitize_for_prompt`].
const MAX_PROMPT_LINES: usize = 400;
