//! Permissive parser for list and dict literals stored in text cells.
//!
//! Directory exports serialize nested values either as JSON or as
//! Python-style reprs (`[{'id': '1', 'text': 'Be kind'}]`). Both dialects
//! are accepted: single or double quoted strings, integers, floats,
//! `True`/`False`/`None`, `true`/`false`/`null`, lists, tuples and dicts.
//! Tuples become lists; dicts become records keyed by the string form of
//! their keys.

use std::collections::BTreeMap;

use commlens_model::CellValue;

use crate::error::LiteralError;

/// Deepest list/dict nesting accepted in one cell.
pub const MAX_DEPTH: usize = 64;

/// Parses a whole cell as one literal value.
pub fn parse_literal(input: &str) -> Result<CellValue, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(LiteralError::TrailingInput { offset: parser.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn descend(&mut self) -> Result<(), LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        Ok(())
    }

    fn value(&mut self) -> Result<CellValue, LiteralError> {
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some('{') => self.mapping(),
            Some(quote @ ('\'' | '"')) => self.string(quote).map(CellValue::Text),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => self.number(),
            Some(ch) if ch.is_ascii_alphabetic() => self.keyword(),
            Some(found) => Err(LiteralError::Unexpected {
                found,
                offset: self.pos,
            }),
        }
    }

    /// Comma separated values up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: char) -> Result<CellValue, LiteralError> {
        self.descend()?;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(ch) if ch == close => {
                    self.bump();
                    break;
                }
                Some(_) => {}
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.separator(close)? {
                break;
            }
        }
        self.depth -= 1;
        Ok(CellValue::List(items))
    }

    fn mapping(&mut self) -> Result<CellValue, LiteralError> {
        self.descend()?;
        self.bump();
        let mut fields = BTreeMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(_) => {}
            }
            let key = match self.value()? {
                CellValue::Text(s) => s,
                other => other.to_string(),
            };
            self.skip_ws();
            match self.bump() {
                Some(':') => {}
                Some(found) => {
                    return Err(LiteralError::Unexpected {
                        found,
                        offset: self.pos - found.len_utf8(),
                    });
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
            self.skip_ws();
            let value = self.value()?;
            fields.insert(key, value);
            self.skip_ws();
            if self.separator('}')? {
                break;
            }
        }
        self.depth -= 1;
        Ok(CellValue::Record(fields))
    }

    /// Consumes `,` (returns false) or `close` (returns true).
    fn separator(&mut self, close: char) -> Result<bool, LiteralError> {
        match self.bump() {
            Some(',') => Ok(false),
            Some(ch) if ch == close => Ok(true),
            Some(found) => Err(LiteralError::Unexpected {
                found,
                offset: self.pos - found.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(LiteralError::UnterminatedString { offset: start });
            };
            if ch == quote {
                return Ok(out);
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let escape_at = self.pos - 1;
            let Some(escaped) = self.bump() else {
                return Err(LiteralError::UnterminatedString { offset: start });
            };
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' | '\'' | '"' | '/' => out.push(escaped),
                '\n' => {}
                'x' => out.push(self.hex_escape(2, escape_at)?),
                'u' => out.push(self.hex_escape(4, escape_at)?),
                'U' => out.push(self.hex_escape(8, escape_at)?),
                other => {
                    // Unknown escapes keep their backslash.
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn hex_escape(&mut self, digits: usize, escape_at: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or(LiteralError::InvalidEscape { offset: escape_at })?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| LiteralError::InvalidEscape { offset: escape_at })?;
        let ch = char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset: escape_at })?;
        self.pos = end;
        Ok(ch)
    }

    fn number(&mut self) -> Result<CellValue, LiteralError> {
        let start = self.pos;
        let numeric =
            |ch: char| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E' | '_');
        while self.peek().is_some_and(numeric) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        let cleaned = text.replace('_', "");
        let invalid = || LiteralError::InvalidNumber {
            text: text.to_string(),
        };
        if cleaned.contains(['.', 'e', 'E']) {
            cleaned.parse::<f64>().map(CellValue::Float).map_err(|_| invalid())
        } else {
            cleaned.parse::<i64>().map(CellValue::Int).map_err(|_| invalid())
        }
    }

    fn keyword(&mut self) -> Result<CellValue, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(CellValue::Bool(true)),
            "False" | "false" => Ok(CellValue::Bool(false)),
            "None" | "null" => Ok(CellValue::Missing),
            word => Err(LiteralError::Unexpected {
                found: word.chars().next().unwrap_or('?'),
                offset: start,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn parses_python_rule_records() {
        let parsed = parse_literal(
            "[{'id': '1', 'text': 'No spam', 'hint': ''}, {'id': 2, 'text': \"Don't\"}]",
        )
        .unwrap();
        let items = parsed.as_list().unwrap();
        assert_eq!(items.len(), 2);
        let first = items[0].as_record().unwrap();
        assert_eq!(first["id"], text("1"));
        assert_eq!(first["hint"], text(""));
        let second = items[1].as_record().unwrap();
        assert_eq!(second["id"], CellValue::Int(2));
        assert_eq!(second["text"], text("Don't"));
    }

    #[test]
    fn parses_json_keywords_and_python_keywords() {
        assert_eq!(
            parse_literal("[true, False, null, None]").unwrap(),
            CellValue::List(vec![
                CellValue::Bool(true),
                CellValue::Bool(false),
                CellValue::Missing,
                CellValue::Missing,
            ])
        );
    }

    #[test]
    fn parses_numbers_and_tuples() {
        assert_eq!(
            parse_literal("(1, -2.5, 3e2,)").unwrap(),
            CellValue::List(vec![
                CellValue::Int(1),
                CellValue::Float(-2.5),
                CellValue::Float(300.0),
            ])
        );
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(parse_literal(r"'a\nbé\d'").unwrap(), text("a\nbé\\d"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_literal(""), Err(LiteralError::UnexpectedEnd));
        assert_eq!(parse_literal("[1, 2"), Err(LiteralError::UnexpectedEnd));
        assert!(matches!(
            parse_literal("['a' 'b']"),
            Err(LiteralError::Unexpected { found: '\'', .. })
        ));
        assert!(matches!(
            parse_literal("'open"),
            Err(LiteralError::UnterminatedString { offset: 0 })
        ));
        assert!(matches!(
            parse_literal("[1] x"),
            Err(LiteralError::TrailingInput { offset: 4 })
        ));
        assert!(matches!(
            parse_literal("nan"),
            Err(LiteralError::Unexpected { .. })
        ));
    }

    #[test]
    fn nesting_is_bounded() {
        assert_eq!(
            parse_literal(&"[".repeat(500_000)),
            Err(LiteralError::TooDeep { offset: MAX_DEPTH })
        );
        assert!(matches!(
            parse_literal(&"{'a': ".repeat(1_000)),
            Err(LiteralError::TooDeep { .. })
        ));

        let at_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&at_limit).is_ok());
        let past_limit = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(parse_literal(&past_limit).is_err());
    }
}
