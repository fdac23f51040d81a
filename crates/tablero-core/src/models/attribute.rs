use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Declared type of a custom field. Immutable after creation: changing it
/// would orphan existing typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "attribute_data_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AttributeDataType {
    Text,
    Longtext,
    Integer,
    Decimal,
    Boolean,
    Date,
    TextArray,
    NumberArray,
}

impl AttributeDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeDataType::Text => "text",
            AttributeDataType::Longtext => "longtext",
            AttributeDataType::Integer => "integer",
            AttributeDataType::Decimal => "decimal",
            AttributeDataType::Boolean => "boolean",
            AttributeDataType::Date => "date",
            AttributeDataType::TextArray => "text_array",
            AttributeDataType::NumberArray => "number_array",
        }
    }

    /// Parse a data type cell from the spreadsheet import. Accepts the
    /// machine names and a few human spellings seen in exported templates.
    pub fn parse_import(s: &str) -> Option<AttributeDataType> {
        match s.trim().to_lowercase().as_str() {
            "text" | "texto" => Some(AttributeDataType::Text),
            "longtext" | "texto largo" => Some(AttributeDataType::Longtext),
            "integer" | "entero" => Some(AttributeDataType::Integer),
            "decimal" => Some(AttributeDataType::Decimal),
            "boolean" | "booleano" => Some(AttributeDataType::Boolean),
            "date" | "fecha" => Some(AttributeDataType::Date),
            "text_array" | "lista de texto" => Some(AttributeDataType::TextArray),
            "number_array" | "lista de numeros" | "lista de números" => {
                Some(AttributeDataType::NumberArray)
            }
            _ => None,
        }
    }
}

/// One custom-field definition for a (company, item_type) scope.
/// `key` is derived from `label` at creation time and immutable afterward;
/// uniqueness of `key` within the scope is enforced by the database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AttributeDefinition {
    pub id: Uuid,
    pub company_id: Uuid,
    pub item_type: String,
    pub key: String,
    pub label: String,
    pub data_type: AttributeDataType,
    pub is_required: bool,
    pub is_filterable: bool,
    /// Optional constraints, e.g. `{"options": ["a", "b"]}`.
    pub validation_rules: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation shape for a definition; `key` is derived, not supplied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewAttributeDefinition {
    pub label: String,
    pub data_type: AttributeDataType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_filterable: bool,
    #[serde(default)]
    pub validation_rules: Option<JsonValue>,
}

/// Database row for attribute_values: column-per-type storage with exactly
/// one populated according to the owning definition's data_type.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AttributeValueRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub attribute_id: Uuid,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    pub value_boolean: Option<bool>,
    pub value_date: Option<NaiveDate>,
    pub value_text_array: Option<Vec<String>>,
    pub value_number_array: Option<Vec<f64>>,
}

/// Typed attribute value. The variant is selected by the owning definition's
/// `data_type`; integer and decimal both ride the `Number` variant, matching
/// the shared `value_number` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    TextArray(Vec<String>),
    NumberArray(Vec<f64>),
}

/// Per-type column bindings for an upsert; exactly one field is Some.
#[derive(Debug, Clone, Default)]
pub struct TypedColumns {
    pub text: Option<String>,
    pub number: Option<f64>,
    pub boolean: Option<bool>,
    pub date: Option<NaiveDate>,
    pub text_array: Option<Vec<String>>,
    pub number_array: Option<Vec<f64>>,
}

impl AttributeValue {
    /// Reconstruct the typed value from a row, selecting the column by the
    /// definition's data_type. Returns None when the routed column is null.
    pub fn from_row(row: &AttributeValueRow, data_type: AttributeDataType) -> Option<Self> {
        match data_type {
            AttributeDataType::Text | AttributeDataType::Longtext => {
                row.value_text.clone().map(AttributeValue::Text)
            }
            AttributeDataType::Integer | AttributeDataType::Decimal => {
                row.value_number.map(AttributeValue::Number)
            }
            AttributeDataType::Boolean => row.value_boolean.map(AttributeValue::Boolean),
            AttributeDataType::Date => row.value_date.map(AttributeValue::Date),
            AttributeDataType::TextArray => {
                row.value_text_array.clone().map(AttributeValue::TextArray)
            }
            AttributeDataType::NumberArray => row
                .value_number_array
                .clone()
                .map(AttributeValue::NumberArray),
        }
    }

    /// Coerce a raw JSON value into the typed variant dictated by `data_type`.
    ///
    /// `Ok(None)` means "clear the value" (JSON null). Booleans arriving as
    /// the strings "true"/"false" (HTML form controls serialize them that
    /// way) are normalized before the typed write.
    pub fn from_json(
        raw: &JsonValue,
        data_type: AttributeDataType,
    ) -> Result<Option<Self>, AppError> {
        if raw.is_null() {
            return Ok(None);
        }
        let value = match data_type {
            AttributeDataType::Text | AttributeDataType::Longtext => match raw.as_str() {
                Some(s) => AttributeValue::Text(s.to_string()),
                None => return Err(type_mismatch(data_type, raw)),
            },
            AttributeDataType::Integer => match raw.as_i64() {
                Some(n) => AttributeValue::Number(n as f64),
                None => match raw.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
                    Some(n) => AttributeValue::Number(n as f64),
                    None => return Err(type_mismatch(data_type, raw)),
                },
            },
            AttributeDataType::Decimal => match raw.as_f64() {
                Some(n) => AttributeValue::Number(n),
                None => match raw.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                    Some(n) => AttributeValue::Number(n),
                    None => return Err(type_mismatch(data_type, raw)),
                },
            },
            AttributeDataType::Boolean => match raw {
                JsonValue::Bool(b) => AttributeValue::Boolean(*b),
                JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" => AttributeValue::Boolean(true),
                    "false" => AttributeValue::Boolean(false),
                    _ => return Err(type_mismatch(data_type, raw)),
                },
                _ => return Err(type_mismatch(data_type, raw)),
            },
            AttributeDataType::Date => match raw.as_str() {
                Some(s) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                    Ok(d) => AttributeValue::Date(d),
                    Err(_) => {
                        return Err(AppError::InvalidInput(format!(
                            "Invalid date '{}', expected YYYY-MM-DD",
                            s
                        )))
                    }
                },
                None => return Err(type_mismatch(data_type, raw)),
            },
            // Array types are whole-value replace-on-write.
            AttributeDataType::TextArray => match raw.as_array() {
                Some(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for v in items {
                        match v.as_str() {
                            Some(s) => out.push(s.to_string()),
                            None => return Err(type_mismatch(data_type, raw)),
                        }
                    }
                    AttributeValue::TextArray(out)
                }
                None => return Err(type_mismatch(data_type, raw)),
            },
            AttributeDataType::NumberArray => match raw.as_array() {
                Some(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for v in items {
                        match v.as_f64() {
                            Some(n) => out.push(n),
                            None => return Err(type_mismatch(data_type, raw)),
                        }
                    }
                    AttributeValue::NumberArray(out)
                }
                None => return Err(type_mismatch(data_type, raw)),
            },
        };
        Ok(Some(value))
    }

    /// Spread the value into per-type column bindings for the upsert.
    pub fn into_columns(self) -> TypedColumns {
        let mut cols = TypedColumns::default();
        match self {
            AttributeValue::Text(v) => cols.text = Some(v),
            AttributeValue::Number(v) => cols.number = Some(v),
            AttributeValue::Boolean(v) => cols.boolean = Some(v),
            AttributeValue::Date(v) => cols.date = Some(v),
            AttributeValue::TextArray(v) => cols.text_array = Some(v),
            AttributeValue::NumberArray(v) => cols.number_array = Some(v),
        }
        cols
    }

    /// Advanced-filter match: array-contains for array types, exact string
    /// match (against the display form) otherwise.
    pub fn matches_filter(&self, wanted: &str) -> bool {
        match self {
            AttributeValue::TextArray(items) => items.iter().any(|s| s == wanted),
            AttributeValue::NumberArray(items) => {
                items.iter().any(|n| format_number(*n) == wanted)
            }
            AttributeValue::Text(s) => s == wanted,
            AttributeValue::Number(n) => format_number(*n) == wanted,
            AttributeValue::Boolean(b) => b.to_string() == wanted,
            AttributeValue::Date(d) => d.format("%Y-%m-%d").to_string() == wanted,
        }
    }
}

/// Integers round-trip without a trailing ".0" so filter values match what
/// the original form controls submitted.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn type_mismatch(data_type: AttributeDataType, raw: &JsonValue) -> AppError {
    AppError::InvalidInput(format!(
        "Value {} is not valid for data type '{}'",
        raw,
        data_type.as_str()
    ))
}

/// Joined read DTO: one definition plus the item's typed value for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemAttribute {
    pub attribute_id: Uuid,
    pub key: String,
    pub label: String,
    pub data_type: AttributeDataType,
    pub is_required: bool,
    pub is_filterable: bool,
    pub value: Option<AttributeValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_string_normalized() {
        let v = AttributeValue::from_json(&json!("true"), AttributeDataType::Boolean)
            .unwrap()
            .unwrap();
        assert_eq!(v, AttributeValue::Boolean(true));
        let v = AttributeValue::from_json(&json!("false"), AttributeDataType::Boolean)
            .unwrap()
            .unwrap();
        assert_eq!(v, AttributeValue::Boolean(false));
        assert!(AttributeValue::from_json(&json!("yes"), AttributeDataType::Boolean).is_err());
    }

    #[test]
    fn test_null_clears_value() {
        let v = AttributeValue::from_json(&JsonValue::Null, AttributeDataType::Text).unwrap();
        assert!(v.is_none());
    }

    #[test]
    fn test_integer_routing() {
        let v = AttributeValue::from_json(&json!(3), AttributeDataType::Integer)
            .unwrap()
            .unwrap();
        assert_eq!(v, AttributeValue::Number(3.0));
        // form controls submit numbers as strings
        let v = AttributeValue::from_json(&json!("42"), AttributeDataType::Integer)
            .unwrap()
            .unwrap();
        assert_eq!(v, AttributeValue::Number(42.0));
        assert!(AttributeValue::from_json(&json!(2.5), AttributeDataType::Integer).is_err());
    }

    #[test]
    fn test_date_parse() {
        let v = AttributeValue::from_json(&json!("2024-03-01"), AttributeDataType::Date)
            .unwrap()
            .unwrap();
        assert_eq!(
            v,
            AttributeValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(AttributeValue::from_json(&json!("01/03/2024"), AttributeDataType::Date).is_err());
    }

    #[test]
    fn test_array_whole_value() {
        let v = AttributeValue::from_json(&json!(["a", "b"]), AttributeDataType::TextArray)
            .unwrap()
            .unwrap();
        assert_eq!(
            v,
            AttributeValue::TextArray(vec!["a".to_string(), "b".to_string()])
        );
        assert!(
            AttributeValue::from_json(&json!(["a", 1]), AttributeDataType::TextArray).is_err()
        );
    }

    #[test]
    fn test_row_roundtrip_selects_column_by_type() {
        let row = AttributeValueRow {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            attribute_id: Uuid::new_v4(),
            value_text: Some("ignored".to_string()),
            value_number: Some(7.0),
            value_boolean: None,
            value_date: None,
            value_text_array: None,
            value_number_array: None,
        };
        // The definition's type picks value_number even though value_text is set.
        assert_eq!(
            AttributeValue::from_row(&row, AttributeDataType::Integer),
            Some(AttributeValue::Number(7.0))
        );
        assert_eq!(
            AttributeValue::from_row(&row, AttributeDataType::Boolean),
            None
        );
    }

    #[test]
    fn test_filter_match_semantics() {
        assert!(AttributeValue::Text("rojo".into()).matches_filter("rojo"));
        assert!(!AttributeValue::Text("rojo".into()).matches_filter("azul"));
        assert!(
            AttributeValue::TextArray(vec!["a".into(), "b".into()]).matches_filter("b")
        );
        assert!(AttributeValue::Number(3.0).matches_filter("3"));
        assert!(AttributeValue::Number(3.5).matches_filter("3.5"));
        assert!(AttributeValue::Boolean(true).matches_filter("true"));
    }

    #[test]
    fn test_data_type_import_parse() {
        assert_eq!(
            AttributeDataType::parse_import("Entero"),
            Some(AttributeDataType::Integer)
        );
        assert_eq!(
            AttributeDataType::parse_import("text_array"),
            Some(AttributeDataType::TextArray)
        );
        assert_eq!(AttributeDataType::parse_import("fantasy"), None);
    }
}
