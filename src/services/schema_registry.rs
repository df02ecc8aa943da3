// Schema Registry
//
// Builds the table/column whitelist for a loaded dataset and infers a
// semantic type per column from all of its values.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::models::{ColumnDescriptor, Dataset, SchemaDescriptor, SemanticType, TableDescriptor};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Build the schema descriptor for a dataset
    pub fn build(dataset: &Dataset) -> SchemaDescriptor {
        let columns = dataset
            .columns
            .iter()
            .map(|name| ColumnDescriptor {
                name: name.clone(),
                semantic_type: Self::infer_type(dataset.column_values(name)),
            })
            .collect();

        let schema = SchemaDescriptor::new(vec![TableDescriptor {
            name: dataset.table_name.clone(),
            columns,
        }]);

        tracing::debug!(
            "Built schema for table {} ({} columns, fingerprint {})",
            dataset.table_name,
            dataset.columns.len(),
            schema.fingerprint()
        );
        schema
    }

    /// Numeric if every non-null value is a number, date if every non-null
    /// value parses as a date, text otherwise (including all-null columns)
    fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> SemanticType {
        let samples: Vec<&Value> = values.filter(|v| !v.is_null()).collect();
        if samples.is_empty() {
            return SemanticType::Text;
        }

        if samples.iter().all(|v| is_numeric(v)) {
            SemanticType::Numeric
        } else if samples.iter().all(|v| v.as_str().and_then(parse_date).is_some()) {
            SemanticType::Date
        } else {
            SemanticType::Text
        }
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().map(|n| n.is_finite()).unwrap_or(false),
        _ => false,
    }
}

/// Parse a calendar date in one of the accepted layouts or an RFC 3339 timestamp
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(records: Vec<Value>) -> Dataset {
        Dataset::from_records("campaigns", records).unwrap()
    }

    fn types(schema: &SchemaDescriptor) -> Vec<(String, SemanticType)> {
        schema.tables()[0]
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.semantic_type))
            .collect()
    }

    #[test]
    fn test_infers_semantic_types() {
        let schema = SchemaRegistry::build(&dataset(vec![
            json!({"Date": "2024-01-01", "Platform": "Google", "Spend": 120.5, "Clicks": "40"}),
            json!({"Date": "2024/01/02", "Platform": "Meta", "Spend": 80, "Clicks": null}),
            json!({"Date": "01/03/2024", "Platform": "TikTok", "Spend": null, "Clicks": "12"}),
        ]));

        assert_eq!(
            types(&schema),
            vec![
                ("Date".to_string(), SemanticType::Date),
                ("Platform".to_string(), SemanticType::Text),
                ("Spend".to_string(), SemanticType::Numeric),
                ("Clicks".to_string(), SemanticType::Numeric),
            ]
        );
    }

    #[test]
    fn test_mixed_values_fall_back_to_text() {
        let schema = SchemaRegistry::build(&dataset(vec![
            json!({"Campaign": "2024-01-01", "Budget": 10}),
            json!({"Campaign": "Spring sale", "Budget": "n/a"}),
        ]));
        assert_eq!(schema.tables()[0].columns[0].semantic_type, SemanticType::Text);
        assert_eq!(schema.tables()[0].columns[1].semantic_type, SemanticType::Text);
    }

    #[test]
    fn test_late_misfit_value_decides_type() {
        let mut records: Vec<_> = (0..1000).map(|i| json!({"Spend": i})).collect();
        records.push(json!({"Spend": "1,200"}));
        let schema = SchemaRegistry::build(&dataset(records));
        assert_eq!(schema.tables()[0].columns[0].semantic_type, SemanticType::Text);
    }

    #[test]
    fn test_all_null_column_is_text() {
        let schema = SchemaRegistry::build(&dataset(vec![json!({"Notes": null})]));
        assert_eq!(schema.tables()[0].columns[0].semantic_type, SemanticType::Text);
    }

    #[test]
    fn test_empty_dataset_has_no_columns() {
        let schema = SchemaRegistry::build(&Dataset::new("campaigns", vec![], vec![]));
        assert!(schema.has_table("campaigns"));
        assert!(schema.tables()[0].columns.is_empty());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date("2024-03-09"), expected);
        assert_eq!(parse_date("2024/03/09"), expected);
        assert_eq!(parse_date("03/09/2024"), expected);
        assert_eq!(parse_date("2024-03-09T10:00:00Z"), expected);
        assert_eq!(parse_date("March 9"), None);
    }
}
