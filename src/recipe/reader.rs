// src/recipe/reader.rs

//! Minimal reader for the recipe expression grammar
//!
//! Supports exactly what recipes and package descriptor files use:
//!
//! - Atoms: symbols, keywords (`:fetcher`), numbers (kept as symbols)
//! - Double-quoted strings with `\"` and `\\` escapes
//! - Lists
//! - The `'x` quote shorthand
//! - `;` line comments
//!
//! [`read`] takes one form per input and rejects anything after it other
//! than whitespace and comments, as well as stray `)` and unterminated lists
//! or strings. [`read_first`] stops after the first form.

use crate::error::{Error, Result};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A read expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    /// Symbol or keyword, stored verbatim
    Symbol(String),
    /// String contents without the surrounding quotes
    Str(String),
    /// Parenthesized list
    List(Vec<Sexp>),
    /// `'form`
    Quote(Box<Sexp>),
}

impl Sexp {
    /// Convenience constructor for symbols
    pub fn symbol(name: impl Into<String>) -> Self {
        Sexp::Symbol(name.into())
    }

    /// Convenience constructor for strings
    pub fn string(value: impl Into<String>) -> Self {
        Sexp::Str(value.into())
    }

    /// Whether this is a keyword symbol such as `:files`
    pub fn is_keyword(&self) -> bool {
        matches!(self, Sexp::Symbol(s) if s.starts_with(':'))
    }

    /// The symbol name, if this is a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// The string contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexp::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The list items, if this is a list
    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Append this expression's tokens to `out`
    ///
    /// Parentheses and the quote mark are separate tokens. Strings keep their
    /// quotes and escapes, so joining the tokens with spaces reads back to
    /// the same expression.
    pub fn push_tokens(&self, out: &mut Vec<String>) {
        match self {
            Sexp::Symbol(s) => out.push(s.clone()),
            Sexp::Str(s) => out.push(quote_string(s)),
            Sexp::List(items) => {
                out.push("(".to_string());
                for item in items {
                    item.push_tokens(out);
                }
                out.push(")".to_string());
            }
            Sexp::Quote(inner) => {
                out.push("'".to_string());
                inner.push_tokens(out);
            }
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(s) => write!(f, "{}", s),
            Sexp::Str(s) => write!(f, "{}", quote_string(s)),
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Sexp::Quote(inner) => write!(f, "'{}", inner),
        }
    }
}

/// Print a string the way the reader expects to read it back
fn quote_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Read exactly one expression from `text`
pub fn read(text: &str) -> Result<Sexp> {
    let mut reader = Reader::new(text);
    let form = reader.read_leading()?;

    reader.skip_atmosphere();
    if let Some(&(pos, c)) = reader.chars.peek() {
        return Err(Error::MalformedRecipe(format!(
            "unexpected '{}' at offset {} after the first expression",
            c, pos
        )));
    }

    Ok(form)
}

/// Read the first expression of `text`, ignoring whatever follows it
///
/// ```
/// use melpazoid::recipe::reader::{read_first, Sexp};
///
/// let form = read_first("(define-package \"x\")\n(provide 'x-pkg)").unwrap();
/// assert_eq!(form.as_list().map(<[Sexp]>::len), Some(2));
/// ```
pub fn read_first(text: &str) -> Result<Sexp> {
    Reader::new(text).read_leading()
}

struct Reader<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
        }
    }

    fn read_leading(&mut self) -> Result<Sexp> {
        self.skip_atmosphere();
        if self.chars.peek().is_none() {
            return Err(Error::MalformedRecipe("empty expression".to_string()));
        }
        self.read_form()
    }

    /// Skip whitespace and `;` comments
    fn skip_atmosphere(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if c == ';' {
                for (_, c) in self.chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_form(&mut self) -> Result<Sexp> {
        self.skip_atmosphere();
        let Some(&(pos, c)) = self.chars.peek() else {
            return Err(Error::MalformedRecipe("unexpected end of input".to_string()));
        };

        match c {
            '(' => {
                self.chars.next();
                self.read_list(pos)
            }
            ')' => Err(Error::MalformedRecipe(format!("unexpected ')' at offset {}", pos))),
            '"' => {
                self.chars.next();
                self.read_string(pos)
            }
            '\'' => {
                self.chars.next();
                Ok(Sexp::Quote(Box::new(self.read_form()?)))
            }
            '`' | ',' | '#' => Err(Error::MalformedRecipe(format!(
                "unsupported syntax '{}' at offset {}",
                c, pos
            ))),
            _ => Ok(self.read_atom()),
        }
    }

    fn read_list(&mut self, open: usize) -> Result<Sexp> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.chars.peek() {
                None => {
                    return Err(Error::MalformedRecipe(format!(
                        "unclosed '(' at offset {}",
                        open
                    )));
                }
                Some(&(_, ')')) => {
                    self.chars.next();
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    fn read_string(&mut self, open: usize) -> Result<Sexp> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(Sexp::Str(value)),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    // escaped newline is a line continuation
                    Some((_, '\n')) => {}
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                _ => value.push(c),
            }
        }
        Err(Error::MalformedRecipe(format!(
            "unterminated string starting at offset {}",
            open
        )))
    }

    fn read_atom(&mut self) -> Sexp {
        let mut atom = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\'') {
                break;
            }
            self.chars.next();
            if c == '\\' {
                // keep escaped characters as part of the symbol
                atom.push(c);
                if let Some((_, escaped)) = self.chars.next() {
                    atom.push(escaped);
                }
                continue;
            }
            atom.push(c);
        }
        Sexp::Symbol(atom)
    }
}
