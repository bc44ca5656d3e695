// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Clause map
//!
//! Locates the top-level clauses of the first statement in a token stream.
//! Only tokens at parenthesis depth 0 start a clause, so subqueries stay part
//! of the clause that contains them. The map stops at the first top-level
//! `;` and at a set operator (`UNION`, `INTERSECT`, `EXCEPT`); only the first
//! query block is analyzed.

use super::lexer::{Keyword, Span, SpannedToken, Token};
use std::fmt;
use std::ops::Range;

/// Top-level clause kinds, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKind {
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
}

impl ClauseKind {
    /// Position in the canonical clause order
    pub fn rank(&self) -> u8 {
        match self {
            ClauseKind::Select => 0,
            ClauseKind::From => 1,
            ClauseKind::Join => 2,
            ClauseKind::Where => 3,
            ClauseKind::GroupBy => 4,
            ClauseKind::Having => 5,
            ClauseKind::OrderBy => 6,
            ClauseKind::Limit => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Select => "SELECT",
            ClauseKind::From => "FROM",
            ClauseKind::Join => "JOIN",
            ClauseKind::Where => "WHERE",
            ClauseKind::GroupBy => "GROUP BY",
            ClauseKind::Having => "HAVING",
            ClauseKind::OrderBy => "ORDER BY",
            ClauseKind::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One top-level clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    /// Span of the introducing keywords, e.g. `LEFT OUTER JOIN`
    pub keyword: Span,
    /// Token indices of the clause body, after the keywords
    pub body: Range<usize>,
    /// Span of keywords plus body
    pub span: Span,
}

impl Clause {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Ordered list of the clauses of the first statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseMap {
    clauses: Vec<Clause>,
    /// Index of the first token after the first statement
    statement_end: usize,
}

impl ClauseMap {
    pub fn build(tokens: &[SpannedToken]) -> Self {
        let statement_end = first_statement_end(tokens);
        let mut starts: Vec<(ClauseKind, usize, usize)> = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;

        while i < statement_end {
            match &tokens[i].token {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                Token::Keyword(keyword) if depth == 0 => {
                    if let Some((kind, keyword_tokens)) =
                        clause_start(tokens, i, statement_end, *keyword)
                    {
                        starts.push((kind, i, i + keyword_tokens));
                        i += keyword_tokens;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let clauses = starts
            .iter()
            .enumerate()
            .map(|(n, &(kind, start, body_start))| {
                let end = starts
                    .get(n + 1)
                    .map(|&(_, next, _)| next)
                    .unwrap_or(statement_end);
                let keyword = tokens[start].span.merge(tokens[body_start - 1].span);
                let span = keyword.merge(tokens[end.max(body_start) - 1].span);
                Clause {
                    kind,
                    keyword,
                    body: body_start..end.max(body_start),
                    span,
                }
            })
            .collect();

        Self {
            clauses,
            statement_end,
        }
    }

    /// First clause of the given kind
    pub fn first(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.kind == kind)
    }

    pub fn has(&self, kind: ClauseKind) -> bool {
        self.first(kind).is_some()
    }

    /// All clauses of the given kind, in order
    pub fn all(&self, kind: ClauseKind) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn statement_end(&self) -> usize {
        self.statement_end
    }
}

/// Index of the first top-level `;` or set operator, or the token count
fn first_statement_end(tokens: &[SpannedToken]) -> usize {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate() {
        match &t.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            Token::Semicolon if depth == 0 => return i,
            Token::Keyword(Keyword::Union | Keyword::Intersect | Keyword::Except) if depth == 0 => {
                return i
            }
            _ => {}
        }
    }
    tokens.len()
}

/// Clause kind and number of keyword tokens if a clause starts at `i`
fn clause_start(
    tokens: &[SpannedToken],
    i: usize,
    end: usize,
    keyword: Keyword,
) -> Option<(ClauseKind, usize)> {
    let next_is = |offset: usize, expected: Keyword| {
        i + offset < end && tokens[i + offset].token.is_keyword(expected)
    };

    match keyword {
        Keyword::Select => Some((ClauseKind::Select, 1)),
        Keyword::From => Some((ClauseKind::From, 1)),
        Keyword::Where => Some((ClauseKind::Where, 1)),
        Keyword::Having => Some((ClauseKind::Having, 1)),
        Keyword::Limit => Some((ClauseKind::Limit, 1)),
        Keyword::Join => Some((ClauseKind::Join, 1)),
        Keyword::Group if next_is(1, Keyword::By) => Some((ClauseKind::GroupBy, 2)),
        Keyword::Group => Some((ClauseKind::GroupBy, 1)),
        Keyword::Order if next_is(1, Keyword::By) => Some((ClauseKind::OrderBy, 2)),
        Keyword::Order => Some((ClauseKind::OrderBy, 1)),
        k if k.is_join_modifier() => {
            let mut j = i;
            while j < end {
                match &tokens[j].token {
                    Token::Keyword(Keyword::Join) => return Some((ClauseKind::Join, j - i + 1)),
                    Token::Keyword(m) if m.is_join_modifier() => j += 1,
                    _ => return None,
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lexer::tokenize;

    fn kinds(sql: &str) -> Vec<ClauseKind> {
        ClauseMap::build(&tokenize(sql)).iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_basic_clauses() {
        assert_eq!(
            kinds("SELECT a FROM t WHERE a > 1 GROUP BY a HAVING COUNT(*) > 1 ORDER BY a LIMIT 5"),
            vec![
                ClauseKind::Select,
                ClauseKind::From,
                ClauseKind::Where,
                ClauseKind::GroupBy,
                ClauseKind::Having,
                ClauseKind::OrderBy,
                ClauseKind::Limit,
            ]
        );
    }

    #[test]
    fn test_subquery_clauses_are_ignored() {
        assert_eq!(
            kinds("SELECT a FROM t WHERE a IN (SELECT b FROM u WHERE c = 1)"),
            vec![ClauseKind::Select, ClauseKind::From, ClauseKind::Where]
        );
    }

    #[test]
    fn test_join_modifiers_belong_to_join() {
        let sql = "SELECT * FROM e LEFT OUTER JOIN d ON e.x = d.x";
        let tokens = tokenize(sql);
        let map = ClauseMap::build(&tokens);
        let join = map.first(ClauseKind::Join).unwrap();
        assert_eq!(join.keyword.text(sql), "LEFT OUTER JOIN");
        assert_eq!(join.text(sql), "LEFT OUTER JOIN d ON e.x = d.x");
    }

    #[test]
    fn test_clause_text_and_first_statement() {
        let sql = "SELECT dept_name FROM departments HAVING budget > 100000; DROP TABLE x";
        let tokens = tokenize(sql);
        let map = ClauseMap::build(&tokens);
        assert_eq!(
            map.first(ClauseKind::Having).unwrap().text(sql),
            "HAVING budget > 100000"
        );
        assert_eq!(map.len(), 3);
        assert!(matches!(tokens[map.statement_end()].token, Token::Semicolon));
    }

    #[test]
    fn test_out_of_order_clauses_are_recorded() {
        assert_eq!(
            kinds("SELECT a WHERE a = 1 FROM t"),
            vec![ClauseKind::Select, ClauseKind::Where, ClauseKind::From]
        );
    }

    #[test]
    fn test_empty_clause_body() {
        let tokens = tokenize("SELECT a FROM");
        let map = ClauseMap::build(&tokens);
        assert!(map.first(ClauseKind::From).unwrap().body.is_empty());
    }
}
