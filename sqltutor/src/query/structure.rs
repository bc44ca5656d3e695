// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Recovered query structure
//!
//! [`ParsedQuery`] pairs the token stream with its clause map and answers the
//! structural questions the checks ask: which tables are in scope, what the
//! select list contains, which columns and aggregate calls an expression
//! uses. Everything here is best effort over possibly broken input.

use super::clauses::{Clause, ClauseKind, ClauseMap};
use super::lexer::{tokenize, Keyword, Span, SpannedToken, Token};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

static AGGREGATES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["COUNT", "SUM", "AVG", "MIN", "MAX", "GROUP_CONCAT", "TOTAL"]
        .into_iter()
        .collect()
});

/// Identifiers that are values rather than column references
static VALUE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP"]
        .into_iter()
        .collect()
});

pub fn is_aggregate(name: &str) -> bool {
    AGGREGATES.contains(name.to_ascii_uppercase().as_str())
}

/// A table named in FROM or JOIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    /// `schema` in `schema.table`
    pub schema: Option<String>,
    pub alias: Option<String>,
    /// `(SELECT ...) alias`; `name` is empty
    pub derived: bool,
    pub span: Span,
}

impl TableRef {
    /// Name the table is referred to by in column qualifiers
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One entry of the select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    /// Tokens of the expression, without the alias
    pub expression: Range<usize>,
    pub alias: Option<String>,
    /// `*` or `t.*`
    pub is_star: bool,
    pub span: Span,
}

/// A column reference inside an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
    /// Inside the arguments of an aggregate call
    pub in_aggregate: bool,
    pub span: Span,
}

impl ColumnRef {
    pub fn display_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q, self.name),
            None => self.name.clone(),
        }
    }
}

/// An aggregate function call, e.g. `AVG(salary)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    /// Uppercased function name
    pub function: String,
    pub span: Span,
}

/// Tokens and clause map of one query text
#[derive(Debug, Clone)]
pub struct ParsedQuery<'a> {
    pub source: &'a str,
    pub tokens: Vec<SpannedToken>,
    pub clauses: ClauseMap,
}

impl<'a> ParsedQuery<'a> {
    pub fn parse(source: &'a str) -> Self {
        let tokens = tokenize(source);
        let clauses = ClauseMap::build(&tokens);
        Self {
            source,
            tokens,
            clauses,
        }
    }

    /// No tokens at all (blank or comment-only input)
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clause(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.first(kind)
    }

    pub fn clause_text(&self, clause: &Clause) -> &'a str {
        clause.text(self.source)
    }

    /// Source text covered by a token range
    pub fn text_of(&self, range: &Range<usize>) -> &'a str {
        match (self.tokens.get(range.start), range.end.checked_sub(1)) {
            (Some(first), Some(last)) if range.start < range.end => {
                let last = self.tokens.get(last).map(|t| t.span).unwrap_or(first.span);
                first.span.merge(last).text(self.source)
            }
            _ => "",
        }
    }

    /// Tables in scope: FROM items then JOIN targets, without derived tables
    pub fn table_refs(&self) -> Vec<TableRef> {
        let mut refs = Vec::new();
        for clause in self.clauses.all(ClauseKind::From) {
            for item in split_top_level(&self.tokens, clause.body.clone()) {
                if let Some(table) = self.table_ref(item) {
                    refs.push(table);
                }
            }
        }
        for clause in self.clauses.all(ClauseKind::Join) {
            let end = self.tokens[clause.body.clone()]
                .iter()
                .position(|t| t.token.is_keyword(Keyword::On) || t.token.is_keyword(Keyword::Using))
                .map(|p| clause.body.start + p)
                .unwrap_or(clause.body.end);
            if let Some(table) = self.table_ref(clause.body.start..end) {
                refs.push(table);
            }
        }
        refs
    }

    /// Number of comma-separated items in the FROM clause
    pub fn from_item_count(&self) -> usize {
        self.clause(ClauseKind::From)
            .map(|c| {
                split_top_level(&self.tokens, c.body.clone())
                    .into_iter()
                    .filter(|r| !r.is_empty())
                    .count()
            })
            .unwrap_or(0)
    }

    fn table_ref(&self, range: Range<usize>) -> Option<TableRef> {
        let tokens = self.tokens.get(range.clone())?;
        let first = tokens.first()?;
        let span = first.span.merge(tokens[tokens.len() - 1].span);

        if first.token == Token::LeftParen {
            let close = matching_paren(&self.tokens, range.start, range.end)
                .map(|c| c - range.start)
                .unwrap_or(tokens.len() - 1);
            return Some(TableRef {
                name: String::new(),
                schema: None,
                alias: alias_after(&tokens[close + 1..]),
                derived: true,
                span,
            });
        }

        let first_name = first.token.identifier()?.to_string();
        let (schema, name, rest) = match (tokens.get(1), tokens.get(2)) {
            (Some(dot), Some(table)) if dot.token == Token::Dot => match table.token.identifier() {
                Some(table) => (Some(first_name), table.to_string(), &tokens[3..]),
                None => (None, first_name, &tokens[1..]),
            },
            _ => (None, first_name, &tokens[1..]),
        };

        Some(TableRef {
            name,
            schema,
            alias: alias_after(rest),
            derived: false,
            span,
        })
    }

    /// Entries of the select list, `DISTINCT`/`ALL` skipped
    pub fn select_items(&self) -> Vec<SelectItem> {
        let Some(select) = self.clause(ClauseKind::Select) else {
            return Vec::new();
        };
        let mut body = select.body.clone();
        while body.start < body.end
            && (self.tokens[body.start].token.is_keyword(Keyword::Distinct)
                || self.tokens[body.start].token.is_keyword(Keyword::All))
        {
            body.start += 1;
        }

        split_top_level(&self.tokens, body)
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|range| self.select_item(range))
            .collect()
    }

    fn select_item(&self, range: Range<usize>) -> SelectItem {
        let tokens = &self.tokens[range.clone()];
        let span = tokens[0].span.merge(tokens[tokens.len() - 1].span);
        let is_star = match tokens {
            [t] => t.token == Token::Star,
            [q, dot, star] => {
                q.token.identifier().is_some()
                    && dot.token == Token::Dot
                    && star.token == Token::Star
            }
            _ => false,
        };

        let mut expression = range.clone();
        let mut alias = None;
        let n = tokens.len();
        if n >= 2 {
            if let Some(name) = tokens[n - 1].token.identifier() {
                let before = &tokens[n - 2].token;
                if before.is_keyword(Keyword::As) {
                    alias = Some(name.to_string());
                    expression.end -= 2;
                } else if ends_expression(before) {
                    alias = Some(name.to_string());
                    expression.end -= 1;
                }
            }
        }

        SelectItem {
            expression,
            alias,
            is_star,
            span,
        }
    }

    /// Select-list aliases, lowercased
    pub fn aliases(&self) -> BTreeSet<String> {
        self.select_items()
            .into_iter()
            .filter_map(|item| item.alias.map(|a| a.to_lowercase()))
            .collect()
    }

    /// Column references in a token range, subqueries skipped
    pub fn column_refs(&self, range: Range<usize>) -> Vec<ColumnRef> {
        let mut scan = ExpressionScan::default();
        scan.run(&self.tokens, range.start, range.end.min(self.tokens.len()), false);
        scan.columns
    }

    /// Aggregate calls in a token range, subqueries skipped
    pub fn aggregate_calls(&self, range: Range<usize>) -> Vec<AggregateCall> {
        let mut scan = ExpressionScan::default();
        scan.run(&self.tokens, range.start, range.end.min(self.tokens.len()), false);
        scan.aggregates
    }

    /// Column references of every select item expression
    pub fn select_columns(&self) -> Vec<ColumnRef> {
        self.select_items()
            .into_iter()
            .flat_map(|item| self.column_refs(item.expression))
            .collect()
    }

    /// Aggregate calls of every select item expression
    pub fn select_aggregates(&self) -> Vec<AggregateCall> {
        self.select_items()
            .into_iter()
            .flat_map(|item| self.aggregate_calls(item.expression))
            .collect()
    }
}

#[derive(Default)]
struct ExpressionScan {
    columns: Vec<ColumnRef>,
    aggregates: Vec<AggregateCall>,
}

impl ExpressionScan {
    fn run(&mut self, tokens: &[SpannedToken], start: usize, end: usize, in_aggregate: bool) {
        let mut i = start;
        while i < end {
            let token = &tokens[i].token;

            if *token == Token::LeftParen {
                let opens_subquery = tokens
                    .get(i + 1)
                    .map(|t| {
                        t.token.is_keyword(Keyword::Select) || t.token.is_keyword(Keyword::With)
                    })
                    .unwrap_or(false);
                if opens_subquery {
                    i = matching_paren(tokens, i, end).unwrap_or(end) + 1;
                    continue;
                }
                i += 1;
                continue;
            }

            let Some(name) = token.identifier() else {
                i += 1;
                continue;
            };

            let next = tokens.get(i + 1).filter(|_| i + 1 < end).map(|t| &t.token);
            match next {
                Some(Token::LeftParen) => {
                    let close = matching_paren(tokens, i + 1, end).unwrap_or(end);
                    let aggregate = is_aggregate(name);
                    if aggregate {
                        let last = tokens
                            .get(close.min(end - 1))
                            .map(|t| t.span)
                            .unwrap_or(tokens[i].span);
                        self.aggregates.push(AggregateCall {
                            function: name.to_ascii_uppercase(),
                            span: tokens[i].span.merge(last),
                        });
                    }
                    self.run(tokens, i + 2, close, in_aggregate || aggregate);
                    i = close + 1;
                }
                Some(Token::Dot) => {
                    let column = tokens
                        .get(i + 2)
                        .filter(|_| i + 2 < end)
                        .and_then(|t| t.token.identifier().map(|n| (n, t.span)));
                    if let Some((column, column_span)) = column {
                        self.columns.push(ColumnRef {
                            qualifier: Some(name.to_string()),
                            name: column.to_string(),
                            in_aggregate,
                            span: tokens[i].span.merge(column_span),
                        });
                    }
                    // `t.*` and a dangling `t.` need no handling of their own
                    i += 3;
                }
                _ => {
                    let after_as = i > start && tokens[i - 1].token.is_keyword(Keyword::As);
                    let value_word = VALUE_WORDS.contains(name.to_ascii_uppercase().as_str());
                    if !after_as && !value_word {
                        self.columns.push(ColumnRef {
                            qualifier: None,
                            name: name.to_string(),
                            in_aggregate,
                            span: tokens[i].span,
                        });
                    }
                    i += 1;
                }
            }
        }
    }
}

/// Tokens that can end an expression, so a following identifier is an alias
fn ends_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::QuotedIdentifier(_)
            | Token::RightParen
            | Token::Number(_)
            | Token::String(_)
            | Token::Star
            | Token::Keyword(Keyword::End | Keyword::Null | Keyword::True | Keyword::False)
    )
}

/// `[AS] alias` at the start of `tokens`
fn alias_after(tokens: &[SpannedToken]) -> Option<String> {
    let candidate = match tokens.first() {
        Some(t) if t.token.is_keyword(Keyword::As) => tokens.get(1),
        other => other,
    };
    candidate
        .and_then(|t| t.token.identifier())
        .map(|a| a.to_string())
}

/// Index of the parenthesis closing the one at `open`, searched before `end`
pub fn matching_paren(tokens: &[SpannedToken], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().take(end).skip(open) {
        match t.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a token range at commas of parenthesis depth 0
fn split_top_level(tokens: &[SpannedToken], range: Range<usize>) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = range.start;
    for i in range.clone() {
        match tokens[i].token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < range.end || !parts.is_empty() {
        parts.push(start..range.end);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(refs: &[ColumnRef]) -> Vec<String> {
        refs.iter().map(|c| c.display_name()).collect()
    }

    #[test]
    fn test_table_refs_with_aliases() {
        let query = ParsedQuery::parse(
            "SELECT e.first_name FROM employees AS e JOIN departments d ON e.department = d.dept_name",
        );
        let tables = query.table_refs();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "employees");
        assert_eq!(tables[0].visible_name(), "e");
        assert_eq!(tables[1].name, "departments");
        assert_eq!(tables[1].alias.as_deref(), Some("d"));
    }

    #[test]
    fn test_comma_separated_from() {
        let query = ParsedQuery::parse("SELECT * FROM employees, departments WHERE 1 = 1");
        assert_eq!(query.from_item_count(), 2);
        assert_eq!(query.table_refs().len(), 2);
    }

    #[test]
    fn test_derived_table() {
        let query = ParsedQuery::parse("SELECT x FROM (SELECT salary AS x FROM employees) sub");
        let tables = query.table_refs();
        assert_eq!(tables.len(), 1);
        assert!(tables[0].derived);
        assert_eq!(tables[0].alias.as_deref(), Some("sub"));
    }

    #[test]
    fn test_schema_qualified_table() {
        let query = ParsedQuery::parse("SELECT a FROM main.employees");
        let tables = query.table_refs();
        assert_eq!(tables[0].schema.as_deref(), Some("main"));
        assert_eq!(tables[0].name, "employees");
    }

    #[test]
    fn test_select_items_and_aliases() {
        let query = ParsedQuery::parse(
            "SELECT DISTINCT department, AVG(salary) AS avg_salary, COUNT(*) n FROM employees",
        );
        let items = query.select_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].alias, None);
        assert_eq!(items[1].alias.as_deref(), Some("avg_salary"));
        assert_eq!(items[2].alias.as_deref(), Some("n"));
        assert_eq!(
            query.aliases(),
            ["avg_salary", "n"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_alias_after_keyword_values() {
        let query = ParsedQuery::parse(
            "SELECT CASE WHEN salary > 50000 THEN 'high' ELSE 'low' END band, NULL n, TRUE flag FROM employees",
        );
        let items = query.select_items();
        assert_eq!(items[0].alias.as_deref(), Some("band"));
        assert_eq!(items[1].alias.as_deref(), Some("n"));
        assert_eq!(items[2].alias.as_deref(), Some("flag"));

        let names: Vec<String> = query.select_columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["salary".to_string()]);
    }

    #[test]
    fn test_select_star() {
        let query = ParsedQuery::parse("SELECT e.*, COUNT(*) FROM employees e");
        let items = query.select_items();
        assert!(items[0].is_star);
        assert!(!items[1].is_star);
    }

    #[test]
    fn test_column_refs_mark_aggregate_arguments() {
        let query = ParsedQuery::parse("SELECT department, AVG(e.salary) FROM employees e");
        let columns = query.select_columns();
        assert_eq!(names(&columns), vec!["department", "e.salary"]);
        assert!(!columns[0].in_aggregate);
        assert!(columns[1].in_aggregate);

        let aggregates = query.select_aggregates();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].function, "AVG");
        assert_eq!(aggregates[0].span.text(query.source), "AVG(e.salary)");
    }

    #[test]
    fn test_subqueries_and_functions() {
        let query = ParsedQuery::parse(
            "SELECT UPPER(last_name) FROM employees WHERE salary > (SELECT AVG(salary) FROM employees)",
        );
        assert_eq!(names(&query.select_columns()), vec!["last_name"]);

        let filter = query.clause(ClauseKind::Where).unwrap().body.clone();
        assert_eq!(names(&query.column_refs(filter.clone())), vec!["salary"]);
        assert!(query.aggregate_calls(filter).is_empty());
    }

    #[test]
    fn test_value_words_and_cast_types_are_not_columns() {
        let query =
            ParsedQuery::parse("SELECT CAST(salary AS INTEGER), CURRENT_DATE FROM employees");
        assert_eq!(names(&query.select_columns()), vec!["salary"]);
    }

    #[test]
    fn test_matching_paren() {
        let tokens = tokenize("(a (b) c) d");
        assert_eq!(matching_paren(&tokens, 0, tokens.len()), Some(5));
        let open = tokenize("(a (b)");
        assert_eq!(matching_paren(&open, 0, open.len()), None);
    }
}
