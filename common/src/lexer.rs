//! Tokenizer for deck scripts.
//!
//! Decks are written in a small Python subset: `#` comments, numeric and
//! string literals, names, lists, calls with keyword arguments and the four
//! arithmetic operators plus `**`. Newlines are not tokens; the parser uses
//! the line recorded on every token instead.

use logos::{Lexer, Logos, Span};

use crate::error::{LexError, LexErrorKind};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'src> {
    #[token("import")]
    Import,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    NoneLit,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexErrorKind::IntegerTooLarge))]
    Int(i64),

    /// `2.`, `.5`, `1.e-6` and `3e8` are all floats
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, unquote)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, unquote)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
}

/// Strips the quotes and resolves the usual backslash escapes.
fn unquote<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<String> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            other => out.push(other),
        }
    }
    Some(out)
}

/// A token together with where it starts in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

/// Tokenize a deck script.
pub fn lex(source: &str) -> Result<Vec<Spanned<Token<'_>>>, LexError> {
    let line_starts = line_starts(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, column) = line_col(&line_starts, span.start);
        match result {
            Ok(token) => tokens.push(Spanned {
                token,
                span,
                line,
                column,
            }),
            Err(kind) => {
                return Err(LexError {
                    line,
                    column,
                    fragment: lexer.slice().to_string(),
                    kind,
                })
            }
        }
    }

    Ok(tokens)
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// 1-based line and column of a byte offset.
fn line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&offset) {
        Ok(exact) => exact,
        Err(next) => next - 1,
    };
    (line + 1, offset - line_starts[line] + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        lex(source).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 2. .5 1.e-6 3e8 0.00001"),
            vec![
                Token::Int(42),
                Token::Float(2.0),
                Token::Float(0.5),
                Token::Float(1e-6),
                Token::Float(3e8),
                Token::Float(0.00001),
            ]
        );
    }

    #[test]
    fn test_attribute_access_is_not_a_float() {
        assert_eq!(
            tokens("2.*math.pi"),
            vec![
                Token::Float(2.0),
                Token::Star,
                Token::Ident("math"),
                Token::Dot,
                Token::Ident("pi"),
            ]
        );
    }

    #[test]
    fn test_strings_and_keywords() {
        assert_eq!(
            tokens(r#"import "1d3v" 'logscale' True False None"#),
            vec![
                Token::Import,
                Token::Str("1d3v".to_string()),
                Token::Str("logscale".to_string()),
                Token::True,
                Token::False,
                Token::NoneLit,
            ]
        );
        assert_eq!(tokens(r#""a\"b""#), vec![Token::Str("a\"b".to_string())]);
    }

    #[test]
    fn test_comments_and_power() {
        assert_eq!(
            tokens("mass = 10., #1836.0,\nx**2"),
            vec![
                Token::Ident("mass"),
                Token::Equals,
                Token::Float(10.0),
                Token::Comma,
                Token::Ident("x"),
                Token::StarStar,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let spanned = lex("a = 1\n\tMain(").unwrap();
        assert_eq!((spanned[0].line, spanned[0].column), (1, 1));
        assert_eq!((spanned[3].line, spanned[3].column), (2, 2));
        assert_eq!(spanned[4].token, Token::ParenOpen);
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex("x = 1\ny = 2 $ 3").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 7);
        assert_eq!(err.fragment, "$");
        assert_eq!(err.kind, LexErrorKind::UnexpectedInput);
    }

    #[test]
    fn test_integer_literal_too_large() {
        assert_eq!(tokens("9223372036854775807"), vec![Token::Int(i64::MAX)]);
        let err = lex("n = 9223372036854775808").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerTooLarge);
        assert_eq!(err.column, 5);
        assert!(err.to_string().contains("too large"), "{err}");
    }
}
