use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Semantic type inferred for a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Text,
    Date,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Text => "text",
            SemanticType::Date => "date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Find a column by name (ASCII case-insensitive)
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Whitelist of tables and columns for the loaded dataset.
///
/// Immutable once built; loading a new dataset produces a new descriptor with
/// its own fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    tables: Vec<TableDescriptor>,
    fingerprint: String,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        let fingerprint = Self::compute_fingerprint(&tables);
        Self { tables, fingerprint }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Stable SHA-256 digest of table and column names
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn resolve_table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.resolve_table(name).is_some()
    }

    pub fn resolve_column(&self, table: &str, name: &str) -> Option<&ColumnDescriptor> {
        self.resolve_table(table).and_then(|table| table.column(name))
    }

    /// Render the schema as prompt context for query generation
    pub fn describe(&self) -> String {
        let mut context = String::from("Tables:\n");
        for table in &self.tables {
            context.push_str(&format!("  - {}\n", table.name));
            context.push_str("    Columns:\n");
            for column in &table.columns {
                context.push_str(&format!(
                    "      * {} ({})\n",
                    column.name,
                    column.semantic_type.as_str()
                ));
            }
        }
        context
    }

    fn compute_fingerprint(tables: &[TableDescriptor]) -> String {
        let mut hasher = Sha256::new();
        for table in tables {
            hasher.update(table.name.as_bytes());
            hasher.update([0u8]);
            for column in &table.columns {
                hasher.update(column.name.as_bytes());
                hasher.update([0x1fu8]);
            }
            hasher.update([0x1eu8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
