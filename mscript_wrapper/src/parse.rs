use std::{iter::Peekable, str::CharIndices};

use crate::ClassifyError::{self, ParseError};

/// Return true if `text` is a single `'...'` string literal.
pub fn is_quoted(text: &str) -> bool {
    is_enclosed_with(text, '\'', '\'') && !text[1..text.len() - 1].contains('\'')
}

/// Return true if `text` is a single `{...}` set literal.
pub fn is_braced(text: &str) -> bool {
    is_enclosed_with(text, '{', '}')
}

fn is_enclosed_with(text: &str, open: char, close: char) -> bool {
    text.len() >= 2 && text.starts_with(open) && text.ends_with(close)
}

/// Remove the quotes from a `'...'` literal, or return the text unchanged.
pub fn remove_quotes(text: &str) -> &str {
    if is_quoted(text) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Return true if `text` has an odd number of single quotes.
pub fn has_unbalanced_quote(text: &str) -> bool {
    text.matches('\'').count() % 2 == 1
}

/// Strip parentheses that enclose the entire text, e.g. `((a + b))` becomes `a + b`.
pub fn remove_extra_paren(text: &str) -> &str {
    let mut text = text.trim();
    while text.starts_with('(') && matching_paren(text, 0) == Some(text.len() - 1) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// The byte offset of the `)` matching the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut in_quotes = false;
    for (i, c) in text[open..].char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a real number literal such as `3`, `-0.5`, `.25` or `1.2e-3`.
///
/// Words that Rust would accept as floats, like `inf` or `NaN`, are not numbers here since they
/// are valid identifiers.
pub fn to_real(text: &str) -> Option<f64> {
    let text = text.trim();
    let body = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    match body.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '.' => {}
        _ => return None,
    }
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `true` or `false`, ignoring case.
pub fn to_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse `On` or `Off`, ignoring case.
pub fn to_on_off(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("on") {
        Some(true)
    } else if text.eq_ignore_ascii_case("off") {
        Some(false)
    } else {
        None
    }
}

/// The parts of an array element reference `name(row, column)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayIndex {
    /// The array name.
    pub name: String,
    /// The row index text. `1` when only one index is given.
    pub row: String,
    /// The column index text.
    pub column: String,
}

/// Split `A(i, 2)` into its name and index texts.
///
/// Returns `Ok(None)` if the text is not of the form `name(...)`. Indices may themselves be
/// array references, e.g. `A(B(1,1), 2)`. A single index addresses a column of the first row,
/// so `V(3)` is `V(1,3)`.
pub fn parse_array_index(text: &str) -> Result<Option<ArrayIndex>, ClassifyError> {
    let text = text.trim();
    match text.find('(') {
        Some(open) if open > 0 && text.ends_with(')') => {
            let name = text[..open].trim();
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Ok(None);
            }
            IndexParser::new(text, open).parse(name).map(Some)
        }
        _ => Ok(None),
    }
}

struct IndexParser<'s> {
    source: &'s str,
    chars: Peekable<CharIndices<'s>>,
}

impl<'s> IndexParser<'s> {
    fn new(source: &'s str, open: usize) -> Self {
        let mut chars = source.char_indices().peekable();
        while chars.next_if(|&(i, _)| i < open).is_some() {}
        IndexParser { source, chars }
    }

    fn parse(mut self, name: &str) -> Result<ArrayIndex, ClassifyError> {
        self.char('(')?;
        let mut indices = vec![self.index()?];
        while self.chars.peek().map(|&(_, c)| c) == Some(',') {
            self.chars.next();
            indices.push(self.index()?);
        }
        self.char(')')?;
        if self.chars.peek().is_some() {
            return Err(self.expected("end of array reference"));
        }

        let mut indices = indices.into_iter();
        let (row, column) = match (indices.next(), indices.next(), indices.next()) {
            (Some(column), None, None) => ("1".to_string(), column),
            (Some(row), Some(column), None) => (row, column),
            _ => {
                return Err(ParseError(format!(
                    "too many indices in \"{}\", expected at most 2",
                    self.source
                )))
            }
        };
        Ok(ArrayIndex {
            name: name.to_string(),
            row,
            column,
        })
    }

    /// An index expression, up to the next `,` or `)` at the top level.
    fn index(&mut self) -> Result<String, ClassifyError> {
        let start = match self.chars.peek() {
            Some(&(i, _)) => i,
            None => return Err(self.expected("an index")),
        };
        let mut depth = 0_usize;
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                ',' if depth == 0 => break,
                _ => {}
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        let index = self.source[start..end].trim();
        if index.is_empty() {
            return Err(self.expected("an index"));
        }
        Ok(index.to_string())
    }

    fn char(&mut self, c: char) -> Result<(), ClassifyError> {
        if self.chars.peek().map(|&(_, p)| p) == Some(c) {
            self.chars.next();
            Ok(())
        } else {
            Err(self.expected(format!("`{}`", c)))
        }
    }

    fn expected(&mut self, expected: impl Into<String>) -> ClassifyError {
        match self.chars.peek() {
            Some((_, c)) => ParseError(format!(
                "expected {} in \"{}\", found `{}`",
                expected.into(),
                self.source,
                c
            )),
            None => ParseError(format!(
                "expected {} in \"{}\", reached end of string",
                expected.into(),
                self.source
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert!(is_quoted("'3.14'"));
        assert!(!is_quoted("'a' + 'b'"));
        assert!(is_braced("{Earth, Luna}"));
        assert_eq!(remove_quotes("'abc'"), "abc");
        assert!(has_unbalanced_quote("'abc"));
    }

    #[test]
    fn test_to_real() {
        assert_eq!(to_real("3"), Some(3.0));
        assert_eq!(to_real("-.5"), Some(-0.5));
        assert_eq!(to_real("1.2e-3"), Some(1.2e-3));
        assert_eq!(to_real("inf"), None);
        assert_eq!(to_real("e5"), None);
        assert_eq!(to_real("1.2.3"), None);
        assert_eq!(to_real("sat1.X"), None);
    }

    #[test]
    fn test_remove_extra_paren() {
        assert_eq!(remove_extra_paren(" ((a + b)) "), "a + b");
        assert_eq!(remove_extra_paren("(a) + (b)"), "(a) + (b)");
        assert_eq!(remove_extra_paren("A(1,2)"), "A(1,2)");
    }

    #[test]
    fn test_parse_array_index() {
        let index = parse_array_index("Arr(I, b(2,c(x,y)))").unwrap().unwrap();
        assert_eq!(index.name, "Arr");
        assert_eq!(index.row, "I");
        assert_eq!(index.column, "b(2,c(x,y))");

        let index = parse_array_index("Arr(10)").unwrap().unwrap();
        assert_eq!((index.row.as_str(), index.column.as_str()), ("1", "10"));

        assert_eq!(parse_array_index("sat1.X").unwrap(), None);
        assert_eq!(parse_array_index("(a + b)").unwrap(), None);
        assert!(parse_array_index("A(1,2,3)").is_err());
        assert!(parse_array_index("A(,2)").is_err());
    }
}
