use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres};
use tablero_core::{
    models::{
        AttributeDataType, AttributeDefinition, AttributeValue, AttributeValueRow, ItemAttribute,
        NewAttributeDefinition,
    },
    validation::derive_key,
    AppError,
};
use uuid::Uuid;

const DEFINITION_COLUMNS: &str = "id, company_id, item_type, key, label, data_type, is_required, \
     is_filterable, validation_rules, created_at, updated_at";

const VALUE_COLUMNS: &str = "id, item_id, attribute_id, value_text, value_number, value_boolean, \
     value_date, value_text_array, value_number_array";

/// Repository for the custom-field schema per (company, item_type).
#[derive(Clone)]
pub struct AttributeDefinitionRepository {
    pool: PgPool,
}

impl AttributeDefinitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk-insert definitions for one (company, item_type) scope.
    ///
    /// Keys are derived from labels here; empty labels and duplicate keys
    /// (within the batch or against existing rows) fail the whole batch
    /// before anything is written. The inserts run in one transaction.
    #[tracing::instrument(skip(self, definitions), fields(db.table = "attribute_definitions", db.operation = "insert", count = definitions.len()))]
    pub async fn create_bulk(
        &self,
        company_id: Uuid,
        item_type: &str,
        definitions: &[NewAttributeDefinition],
    ) -> Result<Vec<AttributeDefinition>, AppError> {
        if definitions.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one attribute definition is required".to_string(),
            ));
        }

        let mut keys = Vec::with_capacity(definitions.len());
        for def in definitions {
            let key = derive_key(&def.label);
            if key.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "Label '{}' produces an empty key",
                    def.label
                )));
            }
            if keys.contains(&key) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate attribute key '{}' in the submitted definitions",
                    key
                )));
            }
            keys.push(key);
        }

        let existing: Vec<String> = sqlx::query_scalar::<Postgres, String>(
            "SELECT key FROM attribute_definitions WHERE company_id = $1 AND item_type = $2 AND key = ANY($3)",
        )
        .bind(company_id)
        .bind(item_type)
        .bind(&keys)
        .fetch_all(&self.pool)
        .await?;

        if !existing.is_empty() {
            return Err(AppError::Conflict(format!(
                "Attribute keys already defined for this item type: {}",
                existing.join(", ")
            )));
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(definitions.len());
        for (def, key) in definitions.iter().zip(keys.iter()) {
            let row = sqlx::query_as::<Postgres, AttributeDefinition>(&format!(
                r#"
                INSERT INTO attribute_definitions
                    (company_id, item_type, key, label, data_type, is_required, is_filterable,
                     validation_rules)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {DEFINITION_COLUMNS}
                "#
            ))
            .bind(company_id)
            .bind(item_type)
            .bind(key)
            .bind(&def.label)
            .bind(def.data_type)
            .bind(def.is_required)
            .bind(def.is_filterable)
            .bind(&def.validation_rules)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }
        tx.commit().await?;

        Ok(created)
    }

    /// All definitions for a company, optionally scoped to one item_type,
    /// sorted by label.
    #[tracing::instrument(skip(self), fields(db.table = "attribute_definitions", db.operation = "select"))]
    pub async fn list(
        &self,
        company_id: Uuid,
        item_type: Option<&str>,
    ) -> Result<Vec<AttributeDefinition>, AppError> {
        let definitions = match item_type {
            Some(t) => {
                sqlx::query_as::<Postgres, AttributeDefinition>(&format!(
                    "SELECT {DEFINITION_COLUMNS} FROM attribute_definitions \
                     WHERE company_id = $1 AND item_type = $2 ORDER BY label ASC"
                ))
                .bind(company_id)
                .bind(t)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, AttributeDefinition>(&format!(
                    "SELECT {DEFINITION_COLUMNS} FROM attribute_definitions \
                     WHERE company_id = $1 ORDER BY label ASC"
                ))
                .bind(company_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(definitions)
    }

    #[tracing::instrument(skip(self), fields(db.table = "attribute_definitions", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<AttributeDefinition>, AppError> {
        let definition = sqlx::query_as::<Postgres, AttributeDefinition>(&format!(
            "SELECT {DEFINITION_COLUMNS} FROM attribute_definitions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(definition)
    }

    /// Update the mutable parts of a definition. `key` and `data_type` are
    /// deliberately not updatable: changing the type would orphan existing
    /// typed values.
    #[tracing::instrument(skip(self), fields(db.table = "attribute_definitions", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        label: Option<String>,
        is_required: Option<bool>,
        is_filterable: Option<bool>,
    ) -> Result<Option<AttributeDefinition>, AppError> {
        let definition = sqlx::query_as::<Postgres, AttributeDefinition>(&format!(
            r#"
            UPDATE attribute_definitions SET
                label = COALESCE($2, label),
                is_required = COALESCE($3, is_required),
                is_filterable = COALESCE($4, is_filterable),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DEFINITION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&label)
        .bind(is_required)
        .bind(is_filterable)
        .fetch_optional(&self.pool)
        .await?;

        Ok(definition)
    }
}

/// Joined row: definition metadata plus the (possibly absent) value columns.
#[derive(Debug, sqlx::FromRow)]
struct JoinedValueRow {
    attribute_id: Uuid,
    key: String,
    label: String,
    data_type: AttributeDataType,
    is_required: bool,
    is_filterable: bool,
    value_id: Option<Uuid>,
    item_id: Option<Uuid>,
    value_text: Option<String>,
    value_number: Option<f64>,
    value_boolean: Option<bool>,
    value_date: Option<NaiveDate>,
    value_text_array: Option<Vec<String>>,
    value_number_array: Option<Vec<f64>>,
}

/// One typed value of one item, used by the listing post-filter.
#[derive(Debug, Clone)]
pub struct ItemValue {
    pub item_id: Uuid,
    pub attribute_id: Uuid,
    pub value: AttributeValue,
}

/// Repository for per-item typed attribute values.
#[derive(Clone)]
pub struct AttributeValueRepository {
    pool: PgPool,
}

impl AttributeValueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert one typed value, keyed on (item_id, attribute_id).
    ///
    /// `None` clears the value (deletes the row). The value has already been
    /// routed into its typed variant by the definition's data_type; here it
    /// is spread across the per-type columns with exactly one populated.
    /// Writing the same value twice yields one row, not two.
    #[tracing::instrument(skip(self, value), fields(db.table = "attribute_values", db.operation = "upsert"))]
    pub async fn upsert(
        &self,
        item_id: Uuid,
        attribute_id: Uuid,
        value: Option<AttributeValue>,
    ) -> Result<Option<AttributeValueRow>, AppError> {
        let Some(value) = value else {
            sqlx::query("DELETE FROM attribute_values WHERE item_id = $1 AND attribute_id = $2")
                .bind(item_id)
                .bind(attribute_id)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        };

        let cols = value.into_columns();
        let row = sqlx::query_as::<Postgres, AttributeValueRow>(&format!(
            r#"
            INSERT INTO attribute_values
                (item_id, attribute_id, value_text, value_number, value_boolean, value_date,
                 value_text_array, value_number_array)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (item_id, attribute_id) DO UPDATE SET
                value_text = EXCLUDED.value_text,
                value_number = EXCLUDED.value_number,
                value_boolean = EXCLUDED.value_boolean,
                value_date = EXCLUDED.value_date,
                value_text_array = EXCLUDED.value_text_array,
                value_number_array = EXCLUDED.value_number_array
            RETURNING {VALUE_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(attribute_id)
        .bind(&cols.text)
        .bind(cols.number)
        .bind(cols.boolean)
        .bind(cols.date)
        .bind(&cols.text_array)
        .bind(&cols.number_array)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(row))
    }

    /// All definitions for the item's scope joined with the item's values,
    /// reconstructing the typed value per the definition's data_type.
    #[tracing::instrument(skip(self), fields(db.table = "attribute_values", db.operation = "select"))]
    pub async fn list_for_item(
        &self,
        item_id: Uuid,
        company_id: Uuid,
        item_type: &str,
    ) -> Result<Vec<ItemAttribute>, AppError> {
        let rows = sqlx::query_as::<Postgres, JoinedValueRow>(
            r#"
            SELECT d.id AS attribute_id, d.key, d.label, d.data_type, d.is_required,
                   d.is_filterable,
                   v.id AS value_id, v.item_id, v.value_text, v.value_number, v.value_boolean,
                   v.value_date, v.value_text_array, v.value_number_array
            FROM attribute_definitions d
            LEFT JOIN attribute_values v ON v.attribute_id = d.id AND v.item_id = $1
            WHERE d.company_id = $2 AND d.item_type = $3
            ORDER BY d.label ASC
            "#,
        )
        .bind(item_id)
        .bind(company_id)
        .bind(item_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let value = match (r.value_id, r.item_id) {
                    (Some(value_id), Some(row_item_id)) => {
                        let row = AttributeValueRow {
                            id: value_id,
                            item_id: row_item_id,
                            attribute_id: r.attribute_id,
                            value_text: r.value_text.clone(),
                            value_number: r.value_number,
                            value_boolean: r.value_boolean,
                            value_date: r.value_date,
                            value_text_array: r.value_text_array.clone(),
                            value_number_array: r.value_number_array.clone(),
                        };
                        AttributeValue::from_row(&row, r.data_type)
                    }
                    _ => None,
                };
                ItemAttribute {
                    attribute_id: r.attribute_id,
                    key: r.key,
                    label: r.label,
                    data_type: r.data_type,
                    is_required: r.is_required,
                    is_filterable: r.is_filterable,
                    value,
                }
            })
            .collect())
    }

    /// Typed values for a set of items (one listing page), for the
    /// client-side-style advanced post-filter.
    #[tracing::instrument(skip(self, item_ids), fields(db.table = "attribute_values", db.operation = "select", count = item_ids.len()))]
    pub async fn values_for_items(&self, item_ids: &[Uuid]) -> Result<Vec<ItemValue>, AppError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<Postgres, JoinedValueRow>(
            r#"
            SELECT d.id AS attribute_id, d.key, d.label, d.data_type, d.is_required,
                   d.is_filterable,
                   v.id AS value_id, v.item_id, v.value_text, v.value_number, v.value_boolean,
                   v.value_date, v.value_text_array, v.value_number_array
            FROM attribute_values v
            JOIN attribute_definitions d ON d.id = v.attribute_id
            WHERE v.item_id = ANY($1)
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let item_id = r.item_id?;
                let row = AttributeValueRow {
                    id: r.value_id.unwrap_or_default(),
                    item_id,
                    attribute_id: r.attribute_id,
                    value_text: r.value_text.clone(),
                    value_number: r.value_number,
                    value_boolean: r.value_boolean,
                    value_date: r.value_date,
                    value_text_array: r.value_text_array.clone(),
                    value_number_array: r.value_number_array.clone(),
                };
                let value = AttributeValue::from_row(&row, r.data_type)?;
                Some(ItemValue {
                    item_id,
                    attribute_id: r.attribute_id,
                    value,
                })
            })
            .collect())
    }
}

/// Validate a raw JSON value against a definition and coerce it.
/// Shared by the upsert handler; kept here next to the write path.
pub fn coerce_value(
    definition: &AttributeDefinition,
    raw: &JsonValue,
) -> Result<Option<AttributeValue>, AppError> {
    let value = AttributeValue::from_json(raw, definition.data_type)?;
    if let (Some(AttributeValue::Text(s)), Some(rules)) = (&value, &definition.validation_rules) {
        if let Some(options) = rules.get("options").and_then(|o| o.as_array()) {
            let allowed = options.iter().filter_map(|o| o.as_str()).collect::<Vec<_>>();
            if !allowed.is_empty() && !allowed.contains(&s.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "Value '{}' is not one of the allowed options for '{}'",
                    s, definition.key
                )));
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn definition(data_type: AttributeDataType, rules: Option<JsonValue>) -> AttributeDefinition {
        AttributeDefinition {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            item_type: "Apartamento_Acme".to_string(),
            key: "color".to_string(),
            label: "Color".to_string(),
            data_type,
            is_required: false,
            is_filterable: true,
            validation_rules: rules,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_coerce_value_respects_options() {
        let def = definition(
            AttributeDataType::Text,
            Some(json!({"options": ["rojo", "azul"]})),
        );
        assert!(coerce_value(&def, &json!("rojo")).is_ok());
        assert!(coerce_value(&def, &json!("verde")).is_err());
    }

    #[test]
    fn test_coerce_value_null_clears() {
        let def = definition(AttributeDataType::Text, None);
        assert_eq!(coerce_value(&def, &JsonValue::Null).unwrap(), None);
    }
}
