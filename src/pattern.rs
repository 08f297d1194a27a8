// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Filename templates (e.g. `{artist} - {title}`) and the parser that applies them.
//!
//! A template is compiled once into a [`Pattern`], i.e. a sequence of literal separators and
//! named field placeholders. Parsing a filename is a greedy left-to-right scan: every literal is
//! searched for starting at the end of the previous one and the text in between becomes the
//! value of the field that precedes the literal.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::mem;
use std::str::FromStr;
use thiserror::Error;

/// Encountered when a template cannot be compiled into a [`Pattern`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The template does not contain a single `{field}` placeholder.
    #[error("Pattern contains no field placeholders")]
    NoFields,
    /// The same field name is used by two placeholders.
    #[error("Field '{0}' occurs more than once")]
    DuplicateField(String),
    /// Two placeholders follow each other without a literal separator in between.
    #[error("Fields '{0}' and '{1}' are not separated by any literal text")]
    AdjacentFields(String, String),
    /// A `{` is never closed.
    #[error("Placeholder at offset {0} is not closed")]
    UnclosedPlaceholder(usize),
    /// A `{}` placeholder without a name.
    #[error("Placeholder at offset {0} has no field name")]
    EmptyFieldName(usize),
    /// A `}` without a matching `{`.
    #[error("Unexpected '}}' at offset {0}")]
    UnexpectedClosingBrace(usize),
    /// A field that is needed for tagging is not part of the pattern.
    #[error("Pattern does not contain the required field '{0}'")]
    MissingField(String),
}

/// Encountered when a filename does not fit a [`Pattern`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoMatch {
    /// The literal separator could not be found at the expected position.
    #[error("Separator {0:?} not found")]
    LiteralNotFound(String),
    /// The field would be empty after trimming.
    #[error("Field '{0}' would be empty")]
    EmptyField(String),
}

/// A single element of a compiled [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text that has to appear verbatim in the filename.
    Literal(String),
    /// A named placeholder.
    Field(String),
}

/// Field values extracted from a filename, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields(BTreeMap<String, String>);

impl ParsedFields {
    /// Returns the value of the field with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate over all `(name, value)` pairs in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of extracted fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no fields were extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A compiled filename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The template this pattern was compiled from.
    template: String,
    /// Literals and fields, in order. Adjacent literal text is merged into a single token.
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a template such as `{artist} - {title}`.
    ///
    /// Field names are trimmed and lowercased. Any name is accepted here; whether a field is
    /// actually written to a tag is decided later.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] if the template has no placeholders, reuses a field name,
    /// puts two placeholders next to each other or has unbalanced braces.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut seen = HashSet::new();

        let mut chars = template.char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(PatternError::UnclosedPlaceholder(offset));
                    }

                    let name = name.trim().to_lowercase();
                    if name.is_empty() {
                        return Err(PatternError::EmptyFieldName(offset));
                    }

                    if !literal.is_empty() {
                        tokens.push(Token::Literal(mem::take(&mut literal)));
                    }
                    if let Some(Token::Field(previous)) = tokens.last() {
                        return Err(PatternError::AdjacentFields(previous.clone(), name));
                    }
                    if !seen.insert(name.clone()) {
                        return Err(PatternError::DuplicateField(name));
                    }
                    tokens.push(Token::Field(name));
                }
                '}' => return Err(PatternError::UnexpectedClosingBrace(offset)),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        if seen.is_empty() {
            return Err(PatternError::NoFields);
        }

        Ok(Self {
            template: template.to_string(),
            tokens,
        })
    }

    /// The template string this pattern was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled tokens.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Names of all fields in this pattern, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Field(name) => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }

    /// Check that all of the given fields are part of this pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MissingField`] for the first field that is missing.
    pub fn require_fields(&self, names: &[&str]) -> Result<(), PatternError> {
        match names
            .iter()
            .find(|&&name| !self.fields().any(|field| field == name))
        {
            Some(name) => Err(PatternError::MissingField((*name).to_string())),
            None => Ok(()),
        }
    }

    /// Extract field values from a filename stem (i.e. without extension).
    ///
    /// Literals are matched ASCII case-insensitively. An interior literal that occurs several
    /// times is split at its *first* occurrence after the previous separator, so that
    /// `Pink Floyd - Comfortably Numb - Live` parsed with `{artist} - {title}` yields the title
    /// `Comfortably Numb - Live`. A literal at the start (end) of the pattern has to match at
    /// the start (end) of the stem. Values are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`NoMatch`] if a separator cannot be found or if a field value would be empty.
    pub fn parse(&self, stem: &str) -> Result<ParsedFields, NoMatch> {
        // ASCII lowercasing keeps all byte offsets valid for the original string.
        let haystack = stem.to_ascii_lowercase();
        let last_index = self.tokens.len().saturating_sub(1);

        let mut fields = BTreeMap::new();
        let mut cursor = 0;
        let mut pending_field: Option<&str> = None;
        for (index, token) in self.tokens.iter().enumerate() {
            let literal = match token {
                Token::Field(name) => {
                    pending_field = Some(name);
                    continue;
                }
                Token::Literal(literal) => literal,
            };

            let needle = literal.to_ascii_lowercase();
            let start = match pending_field {
                None => haystack[cursor..].starts_with(&needle).then_some(cursor),
                Some(_) if index == last_index => haystack
                    .ends_with(&needle)
                    .then(|| haystack.len() - needle.len())
                    .filter(|&start| start >= cursor),
                Some(_) => haystack[cursor..]
                    .find(&needle)
                    .map(|offset| cursor + offset),
            }
            .ok_or_else(|| NoMatch::LiteralNotFound(literal.clone()))?;

            if let Some(name) = pending_field.take() {
                insert_field(&mut fields, name, &stem[cursor..start])?;
            }
            cursor = start + needle.len();
        }

        if let Some(name) = pending_field {
            insert_field(&mut fields, name, &stem[cursor..])?;
        }

        Ok(ParsedFields(fields))
    }
}

/// Trim the value and insert it, rejecting empty values.
fn insert_field(
    fields: &mut BTreeMap<String, String>,
    name: &str,
    value: &str,
) -> Result<(), NoMatch> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NoMatch::EmptyField(name.to_string()));
    }

    let _previous = fields.insert(name.to_string(), value.to_string());
    Ok(())
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
