// Clause tree for the read-only query dialect
//
// Lexes a candidate query with the sqlparser tokenizer and groups the tokens
// into clauses (clause kind → operand list). Identifier extraction for the
// table and column whitelists runs over this structure instead of scanning
// raw text.

use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace, Word};
use std::collections::HashMap;

use super::keywords::{self, CAST_FUNCTIONS, FIELD_FUNCTIONS, STRUCTURAL_KEYWORDS, TYPED_LITERAL_PREFIXES};
use super::sql_validator::Rejection;

/// Clause kinds of the accepted dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    With,
    Select,
    From,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
}

/// One identifier part, tied back to its token for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub value: String,
    pub quoted: bool,
    pub token_index: usize,
}

/// Dotted identifier such as `Spend`, `c.Spend` or `c.*`
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub parts: Vec<Ident>,
    pub wildcard: bool,
}

impl Identifier {
    /// Qualifier parts (everything before the column name)
    pub fn qualifier(&self) -> &[Ident] {
        if self.wildcard {
            &self.parts
        } else {
            &self.parts[..self.parts.len() - 1]
        }
    }

    /// Column part; `None` for `t.*`
    pub fn column(&self) -> Option<&Ident> {
        if self.wildcard {
            None
        } else {
            self.parts.last()
        }
    }

    pub fn dotted(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.value.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Column,
    Table,
    Cte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Table reference in a FROM/JOIN item position
    Table(Identifier),
    /// Column reference in an expression position
    Identifier(Identifier),
    /// Name introduced by the query itself
    Alias { name: Ident, kind: AliasKind },
    Function(String),
    Keyword(String),
    Literal,
    Wildcard,
    Operator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub kind: ClauseKind,
    /// Parenthesis nesting depth the clause starts at
    pub depth: usize,
    pub operands: Vec<Operand>,
}

impl Clause {
    fn new(kind: ClauseKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            operands: Vec::new(),
        }
    }
}

/// Parsed candidate query
#[derive(Debug, Clone)]
pub struct ClauseTree {
    tokens: Vec<Token>,
    clauses: Vec<Clause>,
    has_top_level_limit: bool,
}

impl ClauseTree {
    pub fn parse(sql: &str) -> Result<Self, Rejection> {
        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|e| Rejection::Unparseable(e.to_string()))?;

        let (clauses, has_top_level_limit) = ClauseParser::new(&tokens)?.run()?;

        Ok(Self {
            tokens,
            clauses,
            has_top_level_limit,
        })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.clauses.iter().flat_map(|clause| clause.operands.iter())
    }

    /// LIMIT or FETCH outside any parentheses
    pub fn has_top_level_limit(&self) -> bool {
        self.has_top_level_limit
    }

    /// Render the query back to text, double-quoting the identifier tokens in
    /// `replacements` with the given spelling. A trailing `;` is dropped.
    pub fn render(&self, replacements: &HashMap<usize, String>) -> String {
        let last_significant = self
            .tokens
            .iter()
            .rposition(|token| !matches!(token, Token::Whitespace(_) | Token::EOF));

        let mut sql = String::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            if let Some(name) = replacements.get(&idx) {
                sql.push('"');
                sql.push_str(&name.replace('"', "\"\""));
                sql.push('"');
                continue;
            }
            match token {
                Token::SemiColon if Some(idx) == last_significant => {}
                Token::EOF => {}
                Token::SingleQuotedString(value) => {
                    sql.push('\'');
                    sql.push_str(&value.replace('\'', "''"));
                    sql.push('\'');
                }
                other => sql.push_str(&other.to_string()),
            }
        }
        sql.trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemState {
    Expression,
    /// Expecting a table reference or derived table
    Start,
    AfterTable,
    AfterAs,
    AfterAlias,
    /// Expecting a CTE name
    CteStart,
    AfterCteName,
    CteColumns,
    AfterCteAs,
    AfterCteBody,
}

#[derive(Debug)]
enum FrameKind {
    Group,
    Function {
        name: String,
        type_position: bool,
        field_position: bool,
    },
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    resume_kind: ClauseKind,
    resume_item: ItemState,
}

struct ClauseParser<'a> {
    tokens: &'a [Token],
    /// Indices of non-whitespace tokens
    sig: Vec<usize>,
    clauses: Vec<Clause>,
    current: Clause,
    frames: Vec<Frame>,
    item: ItemState,
    prev_ends_expr: bool,
    after_as: bool,
    next_is_type: bool,
    pending_function: Option<String>,
    top_level_limit: bool,
}

impl<'a> ClauseParser<'a> {
    fn new(tokens: &'a [Token]) -> Result<Self, Rejection> {
        let mut sig = Vec::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            match token {
                Token::Whitespace(Whitespace::SingleLineComment { prefix, .. }) => {
                    return Err(Rejection::ForbiddenKeyword(prefix.clone()));
                }
                Token::Whitespace(Whitespace::MultiLineComment(_)) => {
                    return Err(Rejection::ForbiddenKeyword("/*".to_string()));
                }
                Token::Whitespace(_) | Token::EOF => {}
                _ => sig.push(idx),
            }
        }

        Ok(Self {
            tokens,
            sig,
            clauses: Vec::new(),
            current: Clause::new(ClauseKind::Select, 0),
            frames: Vec::new(),
            item: ItemState::Expression,
            prev_ends_expr: false,
            after_as: false,
            next_is_type: false,
            pending_function: None,
            top_level_limit: false,
        })
    }

    fn run(mut self) -> Result<(Vec<Clause>, bool), Rejection> {
        let tokens = self.tokens;
        let mut p = 0;
        while p < self.sig.len() {
            p = match &tokens[self.sig[p]] {
                Token::Word(word) => self.on_word(p, word)?,
                Token::LParen => {
                    self.on_open_paren();
                    p + 1
                }
                Token::RParen => {
                    self.on_close_paren()?;
                    p + 1
                }
                Token::Comma => {
                    self.on_comma();
                    p + 1
                }
                Token::Mul => {
                    if self.prev_ends_expr {
                        self.push(Operand::Operator);
                        self.prev_ends_expr = false;
                    } else {
                        self.push(Operand::Wildcard);
                        self.prev_ends_expr = true;
                    }
                    p + 1
                }
                Token::DoubleColon => {
                    self.push(Operand::Operator);
                    self.next_is_type = true;
                    self.prev_ends_expr = false;
                    p + 1
                }
                Token::SemiColon => p + 1,
                token if is_literal(token) => {
                    self.push(Operand::Literal);
                    self.prev_ends_expr = true;
                    p + 1
                }
                _ => {
                    self.push(Operand::Operator);
                    self.prev_ends_expr = false;
                    p + 1
                }
            };
        }

        if !self.frames.is_empty() {
            return Err(Rejection::Unparseable("unbalanced parentheses".to_string()));
        }

        let last = std::mem::replace(&mut self.current, Clause::new(ClauseKind::Select, 0));
        if !last.operands.is_empty() {
            self.clauses.push(last);
        }
        Ok((self.clauses, self.top_level_limit))
    }

    fn on_word(&mut self, p: usize, word: &'a Word) -> Result<usize, Rejection> {
        let next = self.peek(p + 1);
        let upper = word.value.to_ascii_uppercase();
        let unquoted = word.quote_style.is_none();

        if unquoted {
            if !self.in_function() {
                if let Some(next_p) = self.try_clause_keyword(p, &upper) {
                    return Ok(next_p);
                }
            }

            if self.next_is_type || self.in_type_position() {
                self.next_is_type = false;
                self.push(Operand::Keyword(upper));
                self.prev_ends_expr = true;
                return Ok(p + 1);
            }

            if self.in_field_position() {
                if upper == "FROM" {
                    self.end_field_position();
                }
                self.push(Operand::Keyword(upper));
                self.prev_ends_expr = false;
                return Ok(p + 1);
            }

            if upper == "AS" {
                self.on_as();
                return Ok(p + 1);
            }

            // Typed literal prefix; any other word before a string is an identifier
            if matches!(next, Some(Token::SingleQuotedString(_)))
                && !self.after_as
                && keywords::contains(TYPED_LITERAL_PREFIXES, &upper)
            {
                self.push(Operand::Keyword(upper));
                self.prev_ends_expr = false;
                return Ok(p + 1);
            }

            if keywords::contains(STRUCTURAL_KEYWORDS, &upper) {
                self.prev_ends_expr = matches!(upper.as_str(), "END" | "NULL" | "TRUE" | "FALSE");
                self.push(Operand::Keyword(upper));
                return Ok(p + 1);
            }
        }

        match (self.current.kind, self.item) {
            (ClauseKind::From | ClauseKind::Join, ItemState::Start) => {
                let (identifier, next_p) = self.read_identifier(p, word);
                self.push(Operand::Table(identifier));
                self.item = ItemState::AfterTable;
                self.prev_ends_expr = true;
                return Ok(next_p);
            }
            (ClauseKind::From | ClauseKind::Join, ItemState::AfterTable | ItemState::AfterAs) => {
                self.push_alias(p, word, AliasKind::Table);
                self.item = ItemState::AfterAlias;
                return Ok(p + 1);
            }
            (ClauseKind::With, ItemState::CteStart) => {
                self.push_alias(p, word, AliasKind::Cte);
                self.item = ItemState::AfterCteName;
                return Ok(p + 1);
            }
            (ClauseKind::With, ItemState::CteColumns) => {
                self.push_alias(p, word, AliasKind::Column);
                return Ok(p + 1);
            }
            _ => {}
        }

        if self.after_as {
            self.after_as = false;
            self.push_alias(p, word, AliasKind::Column);
            self.prev_ends_expr = false;
            return Ok(p + 1);
        }

        if unquoted && matches!(next, Some(Token::LParen)) {
            self.pending_function = Some(upper.clone());
            self.push(Operand::Function(upper));
            self.prev_ends_expr = false;
            return Ok(p + 1);
        }

        // Implicit alias: SUM(Spend) total
        if self.current.kind == ClauseKind::Select
            && self.prev_ends_expr
            && !self.in_function()
            && !matches!(next, Some(Token::Period))
        {
            self.push_alias(p, word, AliasKind::Column);
            self.prev_ends_expr = false;
            return Ok(p + 1);
        }

        let (identifier, next_p) = self.read_identifier(p, word);
        self.push(Operand::Identifier(identifier));
        self.prev_ends_expr = true;
        Ok(next_p)
    }

    fn try_clause_keyword(&mut self, p: usize, upper: &str) -> Option<usize> {
        let followed_by_by = matches!(
            self.peek(p + 1),
            Some(Token::Word(next)) if next.value.eq_ignore_ascii_case("BY")
        );

        match upper {
            "WITH" => {
                self.start_clause(ClauseKind::With);
                Some(p + 1)
            }
            "RECURSIVE" if self.current.kind == ClauseKind::With => {
                self.push(Operand::Keyword(upper.to_string()));
                Some(p + 1)
            }
            "SELECT" => {
                self.start_clause(ClauseKind::Select);
                Some(p + 1)
            }
            "FROM" => {
                self.start_clause(ClauseKind::From);
                Some(p + 1)
            }
            "JOIN" => {
                self.start_clause(ClauseKind::Join);
                Some(p + 1)
            }
            "ON" | "USING" if matches!(self.current.kind, ClauseKind::Join | ClauseKind::From) => {
                self.start_clause(ClauseKind::On);
                self.push(Operand::Keyword(upper.to_string()));
                Some(p + 1)
            }
            "WHERE" => {
                self.start_clause(ClauseKind::Where);
                Some(p + 1)
            }
            "GROUP" if followed_by_by => {
                self.start_clause(ClauseKind::GroupBy);
                Some(p + 2)
            }
            "ORDER" if followed_by_by => {
                self.start_clause(ClauseKind::OrderBy);
                Some(p + 2)
            }
            "HAVING" => {
                self.start_clause(ClauseKind::Having);
                Some(p + 1)
            }
            "LIMIT" => {
                if self.frames.is_empty() {
                    self.top_level_limit = true;
                }
                self.start_clause(ClauseKind::Limit);
                Some(p + 1)
            }
            "OFFSET" => {
                self.start_clause(ClauseKind::Offset);
                Some(p + 1)
            }
            "FETCH" => {
                if self.frames.is_empty() {
                    self.top_level_limit = true;
                }
                None
            }
            _ => None,
        }
    }

    fn on_as(&mut self) {
        if let Some(Frame {
            kind: FrameKind::Function {
                name, type_position, ..
            },
            ..
        }) = self.frames.last_mut()
        {
            if keywords::contains(CAST_FUNCTIONS, name) {
                *type_position = true;
                self.push(Operand::Keyword("AS".to_string()));
                return;
            }
        }

        match (self.current.kind, self.item) {
            (ClauseKind::From | ClauseKind::Join, ItemState::AfterTable) => {
                self.item = ItemState::AfterAs;
            }
            (ClauseKind::With, ItemState::AfterCteName) => {
                self.item = ItemState::AfterCteAs;
            }
            _ => self.after_as = true,
        }
        self.push(Operand::Keyword("AS".to_string()));
        self.prev_ends_expr = false;
    }

    fn on_open_paren(&mut self) {
        let kind = match self.pending_function.take() {
            Some(name) => FrameKind::Function {
                field_position: keywords::contains(FIELD_FUNCTIONS, &name),
                type_position: false,
                name,
            },
            None => FrameKind::Group,
        };

        let resume_item = match (self.current.kind, self.item) {
            (ClauseKind::From | ClauseKind::Join, ItemState::Start) => ItemState::AfterTable,
            (ClauseKind::With, ItemState::AfterCteAs) => ItemState::AfterCteBody,
            (_, item) => item,
        };
        let column_list = matches!(kind, FrameKind::Group)
            && self.current.kind == ClauseKind::With
            && self.item == ItemState::AfterCteName;

        self.frames.push(Frame {
            kind,
            resume_kind: self.current.kind,
            resume_item,
        });

        if column_list {
            self.item = ItemState::CteColumns;
        }
        self.prev_ends_expr = false;
        self.after_as = false;
    }

    fn on_close_paren(&mut self) -> Result<(), Rejection> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Rejection::Unparseable("unbalanced parentheses".to_string()))?;

        // A closed group never shares a segment with what precedes it, so a
        // derived-table alias is not attached to the inner FROM
        if matches!(frame.kind, FrameKind::Group) || self.current.kind != frame.resume_kind {
            self.start_clause(frame.resume_kind);
        }
        self.item = frame.resume_item;
        self.prev_ends_expr = true;
        self.after_as = false;
        Ok(())
    }

    fn on_comma(&mut self) {
        if !self.in_function() {
            match (self.current.kind, self.item) {
                (ClauseKind::From | ClauseKind::Join, _) => self.item = ItemState::Start,
                (ClauseKind::With, ItemState::AfterCteBody) => self.item = ItemState::CteStart,
                _ => {}
            }
        }
        self.prev_ends_expr = false;
        self.after_as = false;
    }

    fn start_clause(&mut self, kind: ClauseKind) {
        let finished = std::mem::replace(&mut self.current, Clause::new(kind, self.frames.len()));
        if !finished.operands.is_empty() {
            self.clauses.push(finished);
        }
        self.item = match kind {
            ClauseKind::From | ClauseKind::Join => ItemState::Start,
            ClauseKind::With => ItemState::CteStart,
            _ => ItemState::Expression,
        };
        self.prev_ends_expr = false;
        self.after_as = false;
    }

    fn read_identifier(&self, p: usize, word: &Word) -> (Identifier, usize) {
        let mut parts = vec![self.ident(p, word)];
        let mut wildcard = false;
        let mut q = p;
        loop {
            match (self.peek(q + 1), self.peek(q + 2)) {
                (Some(Token::Period), Some(Token::Word(part))) => {
                    parts.push(self.ident(q + 2, part));
                    q += 2;
                }
                (Some(Token::Period), Some(Token::Mul)) => {
                    wildcard = true;
                    q += 2;
                    break;
                }
                _ => break,
            }
        }
        (Identifier { parts, wildcard }, q + 1)
    }

    fn ident(&self, p: usize, word: &Word) -> Ident {
        Ident {
            value: word.value.clone(),
            quoted: word.quote_style.is_some(),
            token_index: self.sig[p],
        }
    }

    fn push_alias(&mut self, p: usize, word: &Word, kind: AliasKind) {
        let name = self.ident(p, word);
        self.push(Operand::Alias { name, kind });
    }

    fn push(&mut self, operand: Operand) {
        self.current.operands.push(operand);
    }

    fn peek(&self, p: usize) -> Option<&'a Token> {
        let tokens = self.tokens;
        self.sig.get(p).map(|&idx| &tokens[idx])
    }

    fn in_function(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame {
                kind: FrameKind::Function { .. },
                ..
            })
        )
    }

    fn in_type_position(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame {
                kind: FrameKind::Function {
                    type_position: true,
                    ..
                },
                ..
            })
        )
    }

    fn in_field_position(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame {
                kind: FrameKind::Function {
                    field_position: true,
                    ..
                },
                ..
            })
        )
    }

    fn end_field_position(&mut self) {
        if let Some(Frame {
            kind: FrameKind::Function { field_position, .. },
            ..
        }) = self.frames.last_mut()
        {
            *field_position = false;
        }
    }
}

fn is_literal(token: &Token) -> bool {
    matches!(
        token,
        Token::Number(..)
            | Token::SingleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::HexStringLiteral(_)
            | Token::EscapedStringLiteral(_)
            | Token::Placeholder(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(tree: &ClauseTree) -> Vec<String> {
        tree.operands()
            .filter_map(|op| match op {
                Operand::Table(identifier) => Some(identifier.dotted()),
                _ => None,
            })
            .collect()
    }

    fn identifiers(tree: &ClauseTree) -> Vec<String> {
        tree.operands()
            .filter_map(|op| match op {
                Operand::Identifier(identifier) => Some(identifier.dotted()),
                _ => None,
            })
            .collect()
    }

    fn aliases(tree: &ClauseTree, wanted: AliasKind) -> Vec<String> {
        tree.operands()
            .filter_map(|op| match op {
                Operand::Alias { name, kind } if *kind == wanted => Some(name.value.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_clause_segmentation() {
        let tree = ClauseTree::parse(
            "SELECT Platform, SUM(Spend) AS total FROM campaigns WHERE Clicks > 10 \
             GROUP BY Platform ORDER BY total DESC LIMIT 5",
        )
        .unwrap();

        let kinds: Vec<ClauseKind> = tree.clauses().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ClauseKind::Select,
                ClauseKind::From,
                ClauseKind::Where,
                ClauseKind::GroupBy,
                ClauseKind::OrderBy,
                ClauseKind::Limit,
            ]
        );
        assert_eq!(tables(&tree), vec!["campaigns"]);
        assert_eq!(identifiers(&tree), vec!["Platform", "Spend", "Clicks", "Platform", "total"]);
        assert_eq!(aliases(&tree, AliasKind::Column), vec!["total"]);
        assert!(tree.has_top_level_limit());
    }

    #[test]
    fn test_functions_are_not_identifiers() {
        let tree = ClauseTree::parse("SELECT COUNT(*), ROUND(AVG(Spend), 2) FROM campaigns").unwrap();
        assert_eq!(identifiers(&tree), vec!["Spend"]);
        assert!(tree.operands().any(|op| *op == Operand::Function("ROUND".to_string())));
        assert!(tree.operands().any(|op| *op == Operand::Wildcard));
    }

    #[test]
    fn test_table_aliases_and_qualified_columns() {
        let tree = ClauseTree::parse("SELECT c.Spend, c.* FROM campaigns AS c").unwrap();
        assert_eq!(identifiers(&tree), vec!["c.Spend", "c"]);
        assert_eq!(aliases(&tree, AliasKind::Table), vec!["c"]);
        assert_eq!(tables(&tree), vec!["campaigns"]);
    }

    #[test]
    fn test_implicit_aliases() {
        let tree = ClauseTree::parse("SELECT SUM(Spend) total FROM campaigns c").unwrap();
        assert_eq!(aliases(&tree, AliasKind::Column), vec!["total"]);
        assert_eq!(aliases(&tree, AliasKind::Table), vec!["c"]);
    }

    #[test]
    fn test_cte_names_and_subqueries() {
        let tree = ClauseTree::parse(
            "WITH totals AS (SELECT Platform, SUM(Spend) AS spend FROM campaigns GROUP BY Platform) \
             SELECT Platform FROM totals WHERE spend > (SELECT AVG(Spend) FROM campaigns)",
        )
        .unwrap();
        assert_eq!(aliases(&tree, AliasKind::Cte), vec!["totals"]);
        assert_eq!(tables(&tree), vec!["campaigns", "totals", "campaigns"]);
        assert!(!tree.has_top_level_limit());
    }

    #[test]
    fn test_derived_table_alias() {
        let tree = ClauseTree::parse("SELECT t.Platform FROM (SELECT Platform FROM campaigns) t").unwrap();
        assert_eq!(tables(&tree), vec!["campaigns"]);
        assert_eq!(aliases(&tree, AliasKind::Table), vec!["t"]);
    }

    #[test]
    fn test_cast_types_and_typed_literals_are_keywords() {
        let tree = ClauseTree::parse(
            "SELECT CAST(Clicks AS DOUBLE), Spend::BIGINT FROM campaigns \
             WHERE Date >= DATE '2024-01-01' AND EXTRACT(YEAR FROM Date) = 2024",
        )
        .unwrap();
        assert_eq!(identifiers(&tree), vec!["Clicks", "Spend", "Date", "Date"]);
        assert!(aliases(&tree, AliasKind::Column).is_empty());
    }

    #[test]
    fn test_joins_and_on_clause() {
        let tree = ClauseTree::parse(
            "SELECT a.Platform FROM campaigns a LEFT JOIN campaigns b ON a.Platform = b.Platform",
        )
        .unwrap();
        assert_eq!(tables(&tree), vec!["campaigns", "campaigns"]);
        assert_eq!(aliases(&tree, AliasKind::Table), vec!["a", "b"]);
        assert!(tree.clauses().iter().any(|c| c.kind == ClauseKind::On));
    }

    #[test]
    fn test_nested_limit_is_not_top_level() {
        let tree = ClauseTree::parse("SELECT * FROM (SELECT * FROM campaigns LIMIT 3) t").unwrap();
        assert!(!tree.has_top_level_limit());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let result = ClauseTree::parse("SELECT COUNT(* FROM campaigns");
        assert!(matches!(result, Err(Rejection::Unparseable(_))));
    }

    #[test]
    fn test_comment_tokens_rejected() {
        let result = ClauseTree::parse("SELECT Spend FROM campaigns -- tail");
        assert_eq!(result.unwrap_err(), Rejection::ForbiddenKeyword("--".to_string()));
    }

    #[test]
    fn test_render_quotes_replacements() {
        let tree = ClauseTree::parse("SELECT spend FROM campaigns WHERE Platform = 'O''Brien';").unwrap();
        let mut replacements = HashMap::new();
        for op in tree.operands() {
            if let Operand::Identifier(identifier) = op {
                let part = &identifier.parts[0];
                let canonical = if part.value == "spend" { "Spend" } else { "Platform" };
                replacements.insert(part.token_index, canonical.to_string());
            }
        }
        assert_eq!(
            tree.render(&replacements),
            "SELECT \"Spend\" FROM campaigns WHERE \"Platform\" = 'O''Brien'"
        );
    }
}
