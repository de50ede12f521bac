//! Position-tracking scanner over stored DDL text.

use regex::Regex;

use super::ParseError;

/// A cursor over a statement or a slice of one.
///
/// Positions reported in errors are offsets into the whole statement, so a
/// cursor over a column definition carries the offset of that definition.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self::with_offset(input, 0)
    }

    /// Creates a cursor over a slice starting at `offset` in its statement.
    #[must_use]
    pub const fn with_offset(input: &'a str, offset: usize) -> Self {
        Self {
            input,
            pos: 0,
            offset,
        }
    }

    /// Returns the absolute position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset + self.pos
    }

    /// Returns a mark to rewind to.
    #[must_use]
    pub const fn mark(&self) -> usize {
        self.pos
    }

    /// Rewinds to a mark.
    pub fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Returns the unconsumed input.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Returns `true` once only whitespace is left.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.rest().trim_start().is_empty()
    }

    /// Builds an error at the current position.
    #[must_use]
    pub fn error(&self, matcher: &'static str, message: impl Into<String>) -> ParseError {
        ParseError::new(matcher, message, self.position())
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace.
    pub fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Returns `true` if the next non-space character is `c`.
    pub fn peek_char(&mut self, c: char) -> bool {
        self.skip_spaces();
        self.peek() == Some(c)
    }

    /// Consumes a bare word (`[A-Za-z_][A-Za-z0-9_]*`), possibly empty.
    pub fn word(&mut self) -> &'a str {
        self.skip_spaces();
        let start = self.pos;
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.advance();
            }
        }
        &self.input[start..self.pos]
    }

    /// Returns the next bare word without consuming it.
    pub fn peek_word(&mut self) -> &'a str {
        let mark = self.mark();
        let word = self.word();
        self.reset(mark);
        word
    }

    /// Consumes `keyword` (case-insensitive) or fails.
    ///
    /// # Errors
    ///
    /// Returns an error naming `matcher` if the next word differs.
    pub fn expect_keyword(
        &mut self,
        keyword: &str,
        matcher: &'static str,
    ) -> Result<(), ParseError> {
        let mark = self.mark();
        let word = self.word();
        if word.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            self.reset(mark);
            Err(self.error(matcher, format!("expected {keyword}, found '{word}'")))
        }
    }

    /// Consumes `keyword` if it is next.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        let mark = self.mark();
        if self.word().eq_ignore_ascii_case(keyword) {
            true
        } else {
            self.reset(mark);
            false
        }
    }

    /// Consumes an identifier, bare or double-quoted.
    ///
    /// Quoted names are returned verbatim without unescaping.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier is next or a quote is unterminated.
    pub fn name(&mut self, matcher: &'static str) -> Result<String, ParseError> {
        self.skip_spaces();
        if self.peek() == Some('"') {
            self.advance();
            let start = self.pos;
            while self.peek().is_some_and(|c| c != '"') {
                self.advance();
            }
            if self.peek().is_none() {
                return Err(self.error(matcher, "unterminated quoted identifier"));
            }
            let name = &self.input[start..self.pos];
            self.advance();
            return Ok(name.to_string());
        }
        let word = self.word();
        if word.is_empty() {
            return Err(self.error(matcher, "expected identifier"));
        }
        Ok(word.to_string())
    }

    /// Consumes a balanced `open`…`close` span and returns its inner text
    /// with the absolute offset of that text.
    ///
    /// Returns `None` without moving if the next character is not `open`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends before the span is closed.
    pub fn enclosed(
        &mut self,
        open: char,
        close: char,
    ) -> Result<Option<(usize, &'a str)>, ParseError> {
        let mark = self.mark();
        self.skip_spaces();
        if self.peek() != Some(open) {
            self.reset(mark);
            return Ok(None);
        }
        self.advance();
        let start = self.pos;
        let mut depth = 1usize;
        let mut quote = None;
        while let Some(c) = self.advance() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, c) if c == open => depth += 1,
                (None, c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.pos - c.len_utf8();
                        return Ok(Some((self.offset + start, &self.input[start..end])));
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::new(
            "enclosed span",
            format!("unbalanced '{open}'"),
            self.offset + start - open.len_utf8(),
        ))
    }

    /// Consumes text matching `pattern` anchored at the current position.
    ///
    /// The pattern must start with `^`.
    pub fn regex(&mut self, pattern: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        let found = pattern.find(rest)?;
        if found.start() != 0 {
            return None;
        }
        self.pos += found.end();
        Some(found.as_str())
    }

    /// Consumes a default value: a parenthesized expression, a quoted
    /// string or a bare token.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing usable follows.
    pub fn value(&mut self) -> Result<String, ParseError> {
        self.skip_spaces();
        match self.peek() {
            Some('(') => {
                let (_, inner) = self
                    .enclosed('(', ')')?
                    .ok_or_else(|| self.error("default value", "expected '('"))?;
                Ok(format!("({inner})"))
            }
            Some('\'') => {
                let start = self.pos;
                self.advance();
                loop {
                    match self.advance() {
                        Some('\'') if self.peek() == Some('\'') => {
                            self.advance();
                        }
                        Some('\'') => break,
                        Some(_) => {}
                        None => return Err(self.error("default value", "unterminated string")),
                    }
                }
                Ok(self.input[start..self.pos].to_string())
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && c != ',' && c != ')')
                {
                    self.advance();
                }
                if start == self.pos {
                    return Err(self.error("default value", "expected a value after DEFAULT"));
                }
                Ok(self.input[start..self.pos].to_string())
            }
        }
    }
}

/// Splits `input` on commas that are not nested in parentheses or quotes.
///
/// Each part is returned with its byte offset in `input`.
#[must_use]
pub fn split_top_level(input: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push((start, &input[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, &input[start..]));
    parts
}
