use std::collections::HashMap;
use thiserror::Error;

use super::clause_tree::{AliasKind, ClauseTree, Ident, Identifier, Operand};
use super::keywords::{
    self, COMMENT_DELIMITERS, ENTRY_KEYWORDS, EXCLUDED_IDENTIFIERS, FORBIDDEN_KEYWORDS,
};
use crate::models::SchemaDescriptor;

/// Why a candidate query was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("forbidden keyword: {0}")]
    ForbiddenKeyword(String),

    #[error("multiple statements")]
    MultipleStatements,

    #[error("unrecognized table: {0}")]
    UnrecognizedTable(String),

    #[error("unrecognized column: {0}")]
    UnrecognizedColumn(String),

    #[error("malformed entry point")]
    MalformedEntryPoint,

    #[error("unparseable query: {0}")]
    Unparseable(String),
}

/// A candidate query that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    /// Query text as generated
    pub original: String,
    /// Rendering with schema identifiers quoted in their canonical spelling
    pub canonical: String,
    /// Schema tables the query reads
    pub tables: Vec<String>,
    has_limit: bool,
}

impl ValidatedQuery {
    pub fn has_limit(&self) -> bool {
        self.has_limit
    }

    /// Canonical SQL with `LIMIT default_limit` appended when the query has
    /// no top-level limit. Returns the SQL and whether the limit was applied.
    pub fn with_default_limit(&self, default_limit: u64) -> (String, bool) {
        if self.has_limit {
            (self.canonical.clone(), false)
        } else {
            (format!("{} LIMIT {}", self.canonical, default_limit), true)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationVerdict {
    Accepted(ValidatedQuery),
    Rejected(Rejection),
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted(_))
    }

    pub fn into_result(self) -> Result<ValidatedQuery, Rejection> {
        match self {
            ValidationVerdict::Accepted(query) => Ok(query),
            ValidationVerdict::Rejected(reason) => Err(reason),
        }
    }
}

/// Target of a table alias or qualifier
#[derive(Debug, Clone)]
enum Relation {
    /// A schema table, by canonical name
    Table(String),
    /// A CTE or derived table whose columns come from the query itself
    Derived,
}

/// Names visible to the column check
#[derive(Debug, Default)]
struct Scope {
    tables: Vec<String>,
    relations: HashMap<String, (String, Relation)>,
    column_aliases: HashMap<String, String>,
}

impl Scope {
    fn relation(&self, name: &str) -> Option<&(String, Relation)> {
        self.relations.get(&name.to_ascii_lowercase())
    }
}

/// SQL validation service for ensuring generated queries are safe and
/// schema-consistent before execution
pub struct SqlValidator;

impl SqlValidator {
    /// Run every check in order; the first failure wins
    pub fn validate(candidate: &str, schema: &SchemaDescriptor) -> ValidationVerdict {
        match Self::run_checks(candidate, schema) {
            Ok(query) => ValidationVerdict::Accepted(query),
            Err(reason) => {
                tracing::debug!("Rejected candidate query ({}): {}", reason, candidate);
                ValidationVerdict::Rejected(reason)
            }
        }
    }

    fn run_checks(candidate: &str, schema: &SchemaDescriptor) -> Result<ValidatedQuery, Rejection> {
        let query = candidate.trim();

        Self::check_entry_point(query)?;
        Self::check_single_statement(query)?;
        Self::check_forbidden_keywords(query)?;

        let tree = ClauseTree::parse(query)?;
        let mut replacements = HashMap::new();
        let scope = Self::check_tables(&tree, schema, &mut replacements)?;
        Self::check_columns(&tree, schema, &scope, &mut replacements)?;

        Ok(ValidatedQuery {
            original: query.to_string(),
            canonical: tree.render(&replacements),
            tables: scope.tables,
            has_limit: tree.has_top_level_limit(),
        })
    }

    /// The query must open with a read-only clause keyword
    fn check_entry_point(query: &str) -> Result<(), Rejection> {
        let first_word: String = query
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();

        if keywords::contains(ENTRY_KEYWORDS, &first_word) {
            Ok(())
        } else if keywords::contains(FORBIDDEN_KEYWORDS, &first_word) {
            Err(Rejection::ForbiddenKeyword(first_word))
        } else {
            Err(Rejection::MalformedEntryPoint)
        }
    }

    /// A separator is tolerated only as the final character
    fn check_single_statement(query: &str) -> Result<(), Rejection> {
        let body = query.strip_suffix(';').unwrap_or(query);
        if body.contains(';') {
            Err(Rejection::MultipleStatements)
        } else {
            Ok(())
        }
    }

    /// Whole-word, case-insensitive deny-list scan over the raw text
    fn check_forbidden_keywords(query: &str) -> Result<(), Rejection> {
        let forbidden = query
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty())
            .map(|word| word.to_ascii_uppercase())
            .find(|word| keywords::contains(FORBIDDEN_KEYWORDS, word));
        if let Some(word) = forbidden {
            return Err(Rejection::ForbiddenKeyword(word));
        }

        if let Some(delimiter) = COMMENT_DELIMITERS.iter().find(|d| query.contains(**d)) {
            return Err(Rejection::ForbiddenKeyword(delimiter.to_string()));
        }

        Ok(())
    }

    /// Every FROM/JOIN table and every qualifier must name a schema table or a
    /// relation the query introduces itself
    fn check_tables(
        tree: &ClauseTree,
        schema: &SchemaDescriptor,
        replacements: &mut HashMap<usize, String>,
    ) -> Result<Scope, Rejection> {
        let mut scope = Scope::default();

        // Names the query introduces: CTEs first so FROM can reference them
        for operand in tree.operands() {
            if let Operand::Alias { name, kind } = operand {
                match kind {
                    AliasKind::Cte => {
                        scope
                            .relations
                            .insert(name.value.to_ascii_lowercase(), (name.value.clone(), Relation::Derived));
                        replacements.insert(name.token_index, name.value.clone());
                    }
                    AliasKind::Column => {
                        scope
                            .column_aliases
                            .entry(name.value.to_ascii_lowercase())
                            .or_insert_with(|| name.value.clone());
                        replacements.insert(name.token_index, name.value.clone());
                    }
                    AliasKind::Table => {}
                }
            }
        }

        for clause in tree.clauses() {
            let mut last_table: Option<Relation> = None;
            for operand in &clause.operands {
                match operand {
                    Operand::Table(identifier) => {
                        let relation = Self::resolve_table(identifier, schema, &mut scope, replacements)?;
                        last_table = Some(relation);
                    }
                    Operand::Alias {
                        name,
                        kind: AliasKind::Table,
                    } => {
                        let target = last_table.take().unwrap_or(Relation::Derived);
                        scope
                            .relations
                            .insert(name.value.to_ascii_lowercase(), (name.value.clone(), target));
                        replacements.insert(name.token_index, name.value.clone());
                    }
                    _ => {}
                }
            }
        }

        for operand in tree.operands() {
            if let Operand::Identifier(identifier) = operand {
                let qualifier = identifier.qualifier();
                match qualifier {
                    [] => {}
                    [name] => {
                        let canonical = Self::resolve_qualifier(name, schema, &scope)?;
                        replacements.insert(name.token_index, canonical);
                    }
                    parts => {
                        let dotted = parts
                            .iter()
                            .map(|part| part.value.as_str())
                            .collect::<Vec<_>>()
                            .join(".");
                        return Err(Rejection::UnrecognizedTable(dotted));
                    }
                }
            }
        }

        Ok(scope)
    }

    fn resolve_table(
        identifier: &Identifier,
        schema: &SchemaDescriptor,
        scope: &mut Scope,
        replacements: &mut HashMap<usize, String>,
    ) -> Result<Relation, Rejection> {
        let [name] = identifier.parts.as_slice() else {
            return Err(Rejection::UnrecognizedTable(identifier.dotted()));
        };

        if let Some(table) = schema.resolve_table(&name.value) {
            if !scope.tables.contains(&table.name) {
                scope.tables.push(table.name.clone());
            }
            replacements.insert(name.token_index, table.name.clone());
            return Ok(Relation::Table(table.name.clone()));
        }

        if let Some((spelling, _)) = scope.relation(&name.value) {
            replacements.insert(name.token_index, spelling.clone());
            return Ok(Relation::Derived);
        }

        Err(Rejection::UnrecognizedTable(name.value.clone()))
    }

    fn resolve_qualifier(name: &Ident, schema: &SchemaDescriptor, scope: &Scope) -> Result<String, Rejection> {
        if let Some((spelling, _)) = scope.relation(&name.value) {
            return Ok(spelling.clone());
        }
        schema
            .resolve_table(&name.value)
            .map(|table| table.name.clone())
            .ok_or_else(|| Rejection::UnrecognizedTable(name.value.clone()))
    }

    /// Every expression identifier must be a column of a referenced table, an
    /// alias the query defines, or an excluded keyword
    fn check_columns(
        tree: &ClauseTree,
        schema: &SchemaDescriptor,
        scope: &Scope,
        replacements: &mut HashMap<usize, String>,
    ) -> Result<(), Rejection> {
        for operand in tree.operands() {
            let Operand::Identifier(identifier) = operand else {
                continue;
            };
            let Some(column) = identifier.column() else {
                continue;
            };

            let relation = match identifier.qualifier() {
                [] => None,
                [name] => match scope.relation(&name.value) {
                    Some((_, relation)) => Some(relation.clone()),
                    None => schema
                        .resolve_table(&name.value)
                        .map(|table| Relation::Table(table.name.clone())),
                },
                _ => continue,
            };

            let resolved = match relation {
                Some(Relation::Table(table)) => schema
                    .resolve_column(&table, &column.value)
                    .map(|c| c.name.clone()),
                Some(Relation::Derived) => Self::resolve_unqualified(column, schema, scope),
                None => Self::resolve_unqualified(column, schema, scope),
            };

            match resolved {
                Some(canonical) => {
                    replacements.insert(column.token_index, canonical);
                }
                None if identifier.parts.len() == 1
                    && !column.quoted
                    && keywords::contains(EXCLUDED_IDENTIFIERS, &column.value.to_ascii_uppercase()) => {}
                None => return Err(Rejection::UnrecognizedColumn(column.value.clone())),
            }
        }
        Ok(())
    }

    /// Exact-spelling alias, then schema column, then alias ignoring case
    fn resolve_unqualified(column: &Ident, schema: &SchemaDescriptor, scope: &Scope) -> Option<String> {
        if scope.column_aliases.values().any(|alias| *alias == column.value) {
            return Some(column.value.clone());
        }
        scope
            .tables
            .iter()
            .find_map(|table| schema.resolve_column(table, &column.value))
            .map(|c| c.name.clone())
            .or_else(|| {
                scope
                    .column_aliases
                    .get(&column.value.to_ascii_lowercase())
                    .cloned()
            })
    }
}
