// Composite-weight text format: configuration, writer, reader.
//
// Composite weights print their components joined by a single separator
// character, the whole optionally wrapped in an open/close parenthesis
// pair. Nested composites recurse with the same writer/reader so every
// level shares one configuration; with parentheses configured the nesting
// is unambiguous, without them only non-left-nested composites parse.

use std::fmt;
use std::str::FromStr;

use crate::WeightError;

/// Validated text-format settings: one separator character and an optional
/// parenthesis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTextConfig {
    separator: char,
    parentheses: Option<(char, char)>,
}

impl Default for WeightTextConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            parentheses: None,
        }
    }
}

impl WeightTextConfig {
    /// Build a configuration from raw settings strings.
    ///
    /// The separator must be exactly one character and the parenthesis
    /// setting empty (no wrapping) or exactly two characters (open then
    /// close). Anything else is a configuration error reported here, at
    /// construction, never at first use.
    pub fn new(separator: &str, parentheses: &str) -> Result<Self, WeightError> {
        let mut sep_chars = separator.chars();
        let separator = match (sep_chars.next(), sep_chars.next()) {
            (Some(c), None) => c,
            _ => return Err(WeightError::BadSeparator(separator.to_string())),
        };
        let mut paren_chars = parentheses.chars();
        let parentheses = match (paren_chars.next(), paren_chars.next(), paren_chars.next()) {
            (None, _, _) => None,
            (Some(open), Some(close), None) => Some((open, close)),
            _ => return Err(WeightError::BadParentheses(parentheses.to_string())),
        };
        Ok(Self {
            separator,
            parentheses,
        })
    }

    /// Configuration with a parenthesis pair, for nested composite weights.
    pub fn with_parens(separator: char, open: char, close: char) -> Self {
        Self {
            separator,
            parentheses: Some((open, close)),
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn parentheses(&self) -> Option<(char, char)> {
        self.parentheses
    }
}

/// Writes composite weights to a `fmt::Write` sink.
///
/// One writer serves all nesting levels: `write_begin`/`write_end` bracket
/// each composite and a separator is emitted before every component after
/// the first of its level.
pub struct CompositeWeightWriter<S: fmt::Write> {
    sink: S,
    config: WeightTextConfig,
    /// Components written so far at each open nesting level.
    counts: Vec<usize>,
}

impl<S: fmt::Write> CompositeWeightWriter<S> {
    pub fn new(sink: S, config: WeightTextConfig) -> Self {
        Self {
            sink,
            config,
            counts: vec![0],
        }
    }

    /// Open a composite: separator bookkeeping for the enclosing level,
    /// then the open parenthesis when configured.
    pub fn write_begin(&mut self) -> fmt::Result {
        self.begin_component()?;
        if let Some((open, _)) = self.config.parentheses {
            self.sink.write_char(open)?;
        }
        self.counts.push(0);
        Ok(())
    }

    /// Write one leaf component via its `Display` form.
    pub fn write_element<T: fmt::Display + ?Sized>(&mut self, value: &T) -> fmt::Result {
        self.begin_component()?;
        write!(self.sink, "{value}")
    }

    /// Close the innermost composite.
    pub fn write_end(&mut self) -> fmt::Result {
        if let Some((_, close)) = self.config.parentheses {
            self.sink.write_char(close)?;
        }
        self.counts.pop();
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn begin_component(&mut self) -> fmt::Result {
        if let Some(count) = self.counts.last_mut() {
            if *count > 0 {
                self.sink.write_char(self.config.separator)?;
            }
            *count += 1;
        }
        Ok(())
    }
}

/// Reads composite weights from a string.
///
/// Mirrors [`CompositeWeightWriter`]: `read_begin` skips leading whitespace
/// and consumes the open parenthesis (an error when configured but absent),
/// leaf components are collected up to the next separator, close
/// parenthesis or whitespace, and `finish` rejects trailing garbage.
///
/// After any failure the reader is bad: every later call short-circuits
/// with the original error.
pub struct CompositeWeightReader {
    chars: Vec<char>,
    pos: usize,
    config: WeightTextConfig,
    counts: Vec<usize>,
    error: Option<WeightError>,
}

impl CompositeWeightReader {
    pub fn new(input: &str, config: WeightTextConfig) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        Self {
            chars,
            pos,
            config,
            counts: vec![0],
            error: None,
        }
    }

    /// Open a composite: consume the separator owed to the enclosing level,
    /// then the open parenthesis when configured.
    pub fn read_begin(&mut self) -> Result<(), WeightError> {
        self.check()?;
        self.begin_component()?;
        if let Some((open, _)) = self.config.parentheses {
            if self.current() == Some(open) {
                self.pos += 1;
            } else {
                return Err(self.fail(WeightError::MissingOpenParen));
            }
        }
        self.counts.push(0);
        Ok(())
    }

    /// Read one leaf component and parse it.
    pub fn read_leaf<T>(&mut self) -> Result<T, WeightError>
    where
        T: FromStr<Err = WeightError>,
    {
        self.check()?;
        self.begin_component()?;
        let start = self.pos;
        while let Some(c) = self.current() {
            if c == self.config.separator || c.is_whitespace() {
                break;
            }
            if let Some((_, close)) = self.config.parentheses {
                if c == close {
                    break;
                }
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.fail(WeightError::EmptyComponent));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match T::from_str(&text) {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Close the innermost composite, consuming the close parenthesis when
    /// configured. A missing close parenthesis is an error.
    pub fn read_end(&mut self) -> Result<(), WeightError> {
        self.check()?;
        if let Some((_, close)) = self.config.parentheses {
            if self.current() == Some(close) {
                self.pos += 1;
            } else {
                return Err(self.fail(WeightError::MissingCloseParen));
            }
        }
        self.counts.pop();
        Ok(())
    }

    /// Require that nothing but whitespace remains.
    pub fn finish(&mut self) -> Result<(), WeightError> {
        self.check()?;
        while let Some(c) = self.current() {
            if !c.is_whitespace() {
                return Err(self.fail(WeightError::TrailingGarbage(c)));
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn begin_component(&mut self) -> Result<(), WeightError> {
        let owed = self.counts.last().copied().unwrap_or(0) > 0;
        if owed {
            if self.current() == Some(self.config.separator) {
                self.pos += 1;
            } else {
                return Err(self.fail(WeightError::MissingSeparator));
            }
        }
        if let Some(count) = self.counts.last_mut() {
            *count += 1;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), WeightError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: WeightError) -> WeightError {
        tracing::error!(
            error = %err,
            separator = %self.config.separator,
            "composite weight parse failed; separator/parenthesis settings may not match the input"
        );
        self.error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tropical::TropicalWeight;

    fn parens() -> WeightTextConfig {
        WeightTextConfig::with_parens(',', '(', ')')
    }

    #[test]
    fn config_accepts_valid_settings() {
        let cfg = WeightTextConfig::new(";", "[]").unwrap();
        assert_eq!(cfg.separator(), ';');
        assert_eq!(cfg.parentheses(), Some(('[', ']')));
        let bare = WeightTextConfig::new(",", "").unwrap();
        assert_eq!(bare.parentheses(), None);
    }

    #[test]
    fn config_rejects_bad_separator() {
        assert!(matches!(
            WeightTextConfig::new("", ""),
            Err(WeightError::BadSeparator(_))
        ));
        assert!(matches!(
            WeightTextConfig::new(",,", ""),
            Err(WeightError::BadSeparator(_))
        ));
    }

    #[test]
    fn config_rejects_unpaired_parentheses() {
        assert!(matches!(
            WeightTextConfig::new(",", "("),
            Err(WeightError::BadParentheses(_))
        ));
        assert!(matches!(
            WeightTextConfig::new(",", "()]"),
            Err(WeightError::BadParentheses(_))
        ));
    }

    #[test]
    fn writer_joins_elements() {
        let mut out = String::new();
        let mut w = CompositeWeightWriter::new(&mut out, WeightTextConfig::default());
        w.write_begin().unwrap();
        w.write_element(&1.5f32).unwrap();
        w.write_element(&2f32).unwrap();
        w.write_end().unwrap();
        assert_eq!(out, "1.5,2");
    }

    #[test]
    fn writer_wraps_with_parens() {
        let mut out = String::new();
        let mut w = CompositeWeightWriter::new(&mut out, parens());
        w.write_begin().unwrap();
        w.write_element(&1f32).unwrap();
        w.write_element(&2f32).unwrap();
        w.write_end().unwrap();
        assert_eq!(out, "(1,2)");
    }

    #[test]
    fn reader_reads_elements() {
        let mut r = CompositeWeightReader::new(" 1.5,2", WeightTextConfig::default());
        r.read_begin().unwrap();
        let a: TropicalWeight = r.read_leaf().unwrap();
        let b: TropicalWeight = r.read_leaf().unwrap();
        r.read_end().unwrap();
        r.finish().unwrap();
        assert_eq!(a, TropicalWeight::new(1.5));
        assert_eq!(b, TropicalWeight::new(2.0));
    }

    #[test]
    fn reader_requires_open_paren() {
        let mut r = CompositeWeightReader::new("1,2)", parens());
        assert_eq!(r.read_begin(), Err(WeightError::MissingOpenParen));
    }

    #[test]
    fn reader_requires_close_paren() {
        let mut r = CompositeWeightReader::new("(1,2", parens());
        r.read_begin().unwrap();
        let _: TropicalWeight = r.read_leaf().unwrap();
        let _: TropicalWeight = r.read_leaf().unwrap();
        assert_eq!(r.read_end(), Err(WeightError::MissingCloseParen));
    }

    #[test]
    fn reader_rejects_trailing_garbage() {
        let mut r = CompositeWeightReader::new("(1,2)x", parens());
        r.read_begin().unwrap();
        let _: TropicalWeight = r.read_leaf().unwrap();
        let _: TropicalWeight = r.read_leaf().unwrap();
        r.read_end().unwrap();
        assert_eq!(r.finish(), Err(WeightError::TrailingGarbage('x')));
    }

    #[test]
    fn reader_allows_trailing_whitespace() {
        let mut r = CompositeWeightReader::new("3 \t", WeightTextConfig::default());
        r.read_begin().unwrap();
        let _: TropicalWeight = r.read_leaf().unwrap();
        r.read_end().unwrap();
        assert!(r.finish().is_ok());
    }

    #[test]
    fn bad_reader_short_circuits() {
        let mut r = CompositeWeightReader::new("1,2", parens());
        assert_eq!(r.read_begin(), Err(WeightError::MissingOpenParen));
        // every later operation reports the original failure
        assert_eq!(
            r.read_leaf::<TropicalWeight>(),
            Err(WeightError::MissingOpenParen)
        );
        assert_eq!(r.finish(), Err(WeightError::MissingOpenParen));
    }
}
