// ==========================================
// ERP 导入引擎 - 行校验器
// ==========================================
// 职责: 必填字段校验（原始单元格为空即无效）
// 自然键原值非空但转换后为空（如证件号列填 ISENTO）同样无效
// 无效行保留并打标记，落库前剔除
// ==========================================

use crate::domain::record::{MappingResult, RawTable, ValidationOutcome};
use crate::importer::import_trait::RowValidator;
use crate::importer::schema_registry::SchemaDefinition;
use crate::importer::value_transformer::transform_value;

pub struct RequiredFieldValidator;

impl RowValidator for RequiredFieldValidator {
    fn validate_row(
        &self,
        table: &RawTable,
        row_index: usize,
        mapping: &MappingResult,
        schema: &SchemaDefinition,
    ) -> ValidationOutcome {
        let mut errors = Vec::new();

        for field in schema.required_fields() {
            match mapping.header_for(field.name) {
                None => errors.push(format!("必填字段 {} ({}) 未映射到任何列", field.name, field.label)),
                Some(header) => {
                    let empty = table
                        .cell(row_index, header)
                        .map_or(true, |v| v.trim().is_empty());
                    if empty {
                        errors.push(format!("必填字段 {} 为空 (列: {})", field.name, header));
                    } else if field.name == schema.natural_key {
                        let raw = table.cell(row_index, header).unwrap_or_default();
                        if transform_value(field.kind, raw).is_null() {
                            errors.push(format!(
                                "自然键 {} 无法转换为有效值 (列: {}, 原值: {})",
                                field.name,
                                header,
                                raw.trim()
                            ));
                        }
                    }
                }
            }
        }

        ValidationOutcome {
            row_index,
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::schema_registry::{CUSTOMERS_SCHEMA, SALES_SCHEMA};

    fn sales_table() -> RawTable {
        RawTable {
            delimiter: ',',
            headers: vec!["Nota".into(), "Data".into(), "Valor".into()],
            rows: vec![
                vec!["100".into(), "25/12/2023".into(), "R$ 10,00".into()],
                vec!["101".into(), "  ".into(), "R$ 20,00".into()],
            ],
        }
    }

    fn sales_mapping() -> MappingResult {
        let mut m = MappingResult::new(SALES_SCHEMA.destination, 1.0);
        m.assign("Nota", "invoice_number");
        m.assign("Data", "issue_date");
        m.assign("Valor", "total_amount");
        m
    }

    #[test]
    fn test_complete_row_is_valid() {
        let outcome =
            RequiredFieldValidator.validate_row(&sales_table(), 0, &sales_mapping(), &SALES_SCHEMA);
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_blank_required_cell_is_invalid() {
        let outcome =
            RequiredFieldValidator.validate_row(&sales_table(), 1, &sales_mapping(), &SALES_SCHEMA);
        assert!(!outcome.valid);
        assert_eq!(outcome.row_index, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("issue_date"));
    }

    #[test]
    fn test_document_key_without_digits_is_invalid() {
        let table = RawTable {
            delimiter: ';',
            headers: vec!["CNPJ".into(), "Razão Social".into()],
            rows: vec![
                vec!["11.111.111/0001-11".into(), "Alfa".into()],
                vec!["ISENTO".into(), "Beta".into()],
            ],
        };
        let mut mapping = MappingResult::new(CUSTOMERS_SCHEMA.destination, 1.0);
        mapping.assign("CNPJ", "tax_id");
        mapping.assign("Razão Social", "name");

        let ok = RequiredFieldValidator.validate_row(&table, 0, &mapping, &CUSTOMERS_SCHEMA);
        assert!(ok.valid);

        let bad = RequiredFieldValidator.validate_row(&table, 1, &mapping, &CUSTOMERS_SCHEMA);
        assert!(!bad.valid);
        assert_eq!(bad.errors.len(), 1);
        assert!(bad.errors[0].contains("tax_id"));
        assert!(bad.errors[0].contains("ISENTO"));
    }

    #[test]
    fn test_unmapped_required_field_is_invalid() {
        let mut mapping = MappingResult::new(CUSTOMERS_SCHEMA.destination, 1.0);
        mapping.assign("Nota", "tax_id");
        let outcome =
            RequiredFieldValidator.validate_row(&sales_table(), 0, &mapping, &CUSTOMERS_SCHEMA);
        assert!(!outcome.valid);
        assert!(outcome.errors.iter().any(|e| e.contains("name")));
    }
}
