// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lexer for learner-written SQL
//!
//! The lexer never fails. Learner input is frequently broken, so anything
//! the grammar does not recognize becomes a [`Token::Unknown`] and an
//! unclosed quote becomes a [`Token::UnterminatedString`] covering the rest
//! of the input. Later stages turn those into findings.
//!
//! Every token carries the byte [`Span`] it was read from, so findings can
//! quote the exact fragment the learner wrote.
//!
//! Every parser must either consume input or return an error; the main loop
//! stops if a parser reports success without advancing.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit0, digit1, one_of},
    combinator::{map, opt, recognize, rest},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// SQL keywords the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Query clauses
    Select,
    From,
    Where,
    Group,
    Having,
    Order,
    By,
    Limit,
    Offset,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    On,
    Using,

    // Expressions
    As,
    And,
    Or,
    Not,
    Distinct,
    All,
    Asc,
    Desc,
    In,
    Is,
    Null,
    Like,
    Between,
    Exists,
    Case,
    When,
    Then,
    Else,
    End,
    True,
    False,
    Union,
    Intersect,
    Except,

    // Statements other than SELECT
    With,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Drop,
    Alter,
    Create,
    Truncate,
    Replace,
    Merge,
    Grant,
    Revoke,
    Table,
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    use Keyword::*;
    let all = [
        Select, From, Where, Group, Having, Order, By, Limit, Offset, Join, Inner, Left, Right,
        Full, Outer, Cross, Natural, On, Using, As, And, Or, Not, Distinct, All, Asc, Desc, In,
        Is, Null, Like, Between, Exists, Case, When, Then, Else, End, True, False, Union,
        Intersect, Except, With, Insert, Into, Values, Update, Set, Delete, Drop, Alter, Create,
        Truncate, Replace, Merge, Grant, Revoke, Table,
    ];
    all.into_iter().map(|k| (k.as_str(), k)).collect()
});

impl Keyword {
    /// Case-insensitive keyword lookup
    pub fn from_word(word: &str) -> Option<Keyword> {
        KEYWORDS.get(word.to_ascii_uppercase().as_str()).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Group => "GROUP",
            Keyword::Having => "HAVING",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Limit => "LIMIT",
            Keyword::Offset => "OFFSET",
            Keyword::Join => "JOIN",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Full => "FULL",
            Keyword::Outer => "OUTER",
            Keyword::Cross => "CROSS",
            Keyword::Natural => "NATURAL",
            Keyword::On => "ON",
            Keyword::Using => "USING",
            Keyword::As => "AS",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Distinct => "DISTINCT",
            Keyword::All => "ALL",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::In => "IN",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::Like => "LIKE",
            Keyword::Between => "BETWEEN",
            Keyword::Exists => "EXISTS",
            Keyword::Case => "CASE",
            Keyword::When => "WHEN",
            Keyword::Then => "THEN",
            Keyword::Else => "ELSE",
            Keyword::End => "END",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Union => "UNION",
            Keyword::Intersect => "INTERSECT",
            Keyword::Except => "EXCEPT",
            Keyword::With => "WITH",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Drop => "DROP",
            Keyword::Alter => "ALTER",
            Keyword::Create => "CREATE",
            Keyword::Truncate => "TRUNCATE",
            Keyword::Replace => "REPLACE",
            Keyword::Merge => "MERGE",
            Keyword::Grant => "GRANT",
            Keyword::Revoke => "REVOKE",
            Keyword::Table => "TABLE",
        }
    }

    /// Modifiers that may precede JOIN
    pub fn is_join_modifier(&self) -> bool {
        matches!(
            self,
            Keyword::Inner
                | Keyword::Left
                | Keyword::Right
                | Keyword::Full
                | Keyword::Outer
                | Keyword::Cross
                | Keyword::Natural
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token types for SQL
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    /// `"name"` or `` `name` ``
    QuotedIdentifier(String),
    /// `'text'` with `''` escapes resolved
    String(String),
    /// Quote opened but never closed; holds the text after the quote
    UnterminatedString(String),
    Number(String),
    Operator(String),
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Star,
    Semicolon,
    Unknown(char),
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    /// Identifier text for plain and quoted identifiers
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

/// Byte range of a token in the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize SQL text, skipping whitespace and comments
pub fn tokenize(input: &str) -> Vec<SpannedToken> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    while !remaining.is_empty() {
        let start = input.len() - remaining.len();
        match lexeme(remaining) {
            Ok((next_remaining, lexeme)) => {
                if next_remaining.len() == remaining.len() {
                    log::warn!("Lexer made no progress at byte {}", start);
                    break;
                }
                let end = input.len() - next_remaining.len();
                if let Some(token) = lexeme {
                    tokens.push(SpannedToken {
                        token,
                        span: Span::new(start, end),
                    });
                }
                remaining = next_remaining;
            }
            Err(e) => {
                log::warn!("Lexer stopped at byte {}: {:?}", start, e);
                break;
            }
        }
    }
    tokens
}

/// One lexeme; trivia (whitespace, comments) yields `None`
fn lexeme(input: &str) -> IResult<&str, Option<Token>> {
    alt((
        map(trivia, |_| None),
        map(token, Some),
    ))(input)
}

fn trivia(input: &str) -> IResult<&str, &str> {
    alt((
        take_while1(|c: char| c.is_whitespace()),
        recognize(pair(tag("--"), take_while(|c: char| c != '\n'))),
        recognize(tuple((tag("/*"), take_until("*/"), tag("*/")))),
        // Unclosed block comment swallows the rest of the input
        recognize(preceded(tag("/*"), rest)),
    ))(input)
}

/// Parse a single token
///
/// Literals come before words so `'select'` stays a string, and numbers
/// come before punctuation so `.5` is not read as a dot.
fn token(input: &str) -> IResult<&str, Token> {
    alt((
        string_literal,
        quoted_identifier,
        map(number, |n| Token::Number(n.to_string())),
        word,
        map(operator, |op| Token::Operator(op.to_string())),
        punctuation,
        map(anychar, Token::Unknown),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, Token> {
    let (body, _) = char('\'')(input)?;
    let mut content = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c == '\'' {
            // '' is an escaped quote inside the literal
            if matches!(chars.peek(), Some((_, '\''))) {
                content.push('\'');
                chars.next();
                continue;
            }
            return Ok((&body[idx + 1..], Token::String(content)));
        }
        content.push(c);
    }
    Ok(("", Token::UnterminatedString(content)))
}

fn quoted_identifier(input: &str) -> IResult<&str, Token> {
    let (body, quote) = one_of("\"`")(input)?;
    match body.find(quote) {
        Some(end) => Ok((
            &body[end + 1..],
            Token::QuotedIdentifier(body[..end].to_string()),
        )),
        None => Ok(("", Token::UnterminatedString(body.to_string()))),
    }
}

fn number(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ))(input)
}

fn word(input: &str) -> IResult<&str, Token> {
    let (remaining, text) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;

    let token = match Keyword::from_word(text) {
        Some(keyword) => Token::Keyword(keyword),
        None => Token::Identifier(text.to_string()),
    };
    Ok((remaining, token))
}

/// Multi-character operators first so `<=` is not read as `<` then `=`
fn operator(input: &str) -> IResult<&str, &str> {
    alt((
        tag("<="),
        tag(">="),
        tag("<>"),
        tag("!="),
        tag("=="),
        tag("||"),
        recognize(one_of("=<>+-/%")),
    ))(input)
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        map(char('('), |_| Token::LeftParen),
        map(char(')'), |_| Token::RightParen),
        map(char(','), |_| Token::Comma),
        map(char('.'), |_| Token::Dot),
        map(char('*'), |_| Token::Star),
        map(char(';'), |_| Token::Semicolon),
    ))(input)
}
