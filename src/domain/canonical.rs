// ==========================================
// ERP 导入引擎 - 标准记录（按目标表区分）
// ==========================================
// 职责: TransformedRow → 强类型记录，供存储层写入
// 对齐: importer::schema_registry 中的字段清单（列名与顺序一致）
// ==========================================

use crate::domain::record::TransformedRow;
use crate::domain::types::{Destination, FieldValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// SalesRecord - 销售流水
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    // ===== 自然键 =====
    pub invoice_number: Option<String>, // 发票/单据号

    pub issue_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_tax_id: Option<String>, // 仅数字
    pub product_code: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_amount: Option<f64>,
    pub seller: Option<String>,
}

// ==========================================
// CustomerRecord - 客户
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    // ===== 自然键 =====
    pub tax_id: Option<String>, // CPF/CNPJ，仅数字

    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub registered_at: Option<NaiveDate>,
}

// ==========================================
// CatalogItem - 商品
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    // ===== 自然键 =====
    pub product_code: Option<String>,

    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub sale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub stock_quantity: Option<f64>,
    pub barcode: Option<String>,
}

/// 按目标表区分的标准记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "destination", rename_all = "lowercase")]
pub enum CanonicalRecord {
    Sales(SalesRecord),
    Customer(CustomerRecord),
    CatalogItem(CatalogItem),
}

fn text(row: &TransformedRow, field: &str) -> Option<String> {
    match row.get(field) {
        FieldValue::Text(s) if !s.is_empty() => Some(s.clone()),
        FieldValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(row: &TransformedRow, field: &str) -> Option<f64> {
    row.get(field).as_number()
}

fn date(row: &TransformedRow, field: &str) -> Option<NaiveDate> {
    row.get(field)
        .as_text()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn text_value(v: &Option<String>) -> FieldValue {
    v.clone().map(FieldValue::Text).unwrap_or(FieldValue::Null)
}

fn number_value(v: Option<f64>) -> FieldValue {
    v.map(FieldValue::Number).unwrap_or(FieldValue::Null)
}

fn date_value(v: Option<NaiveDate>) -> FieldValue {
    v.map(|d| FieldValue::Text(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(FieldValue::Null)
}

impl CanonicalRecord {
    /// 由转换后的行构建（按行的目标表选择变体）
    pub fn from_row(row: &TransformedRow) -> Self {
        match row.destination {
            Destination::Sales => CanonicalRecord::Sales(SalesRecord {
                invoice_number: text(row, "invoice_number"),
                issue_date: date(row, "issue_date"),
                customer_name: text(row, "customer_name"),
                customer_tax_id: text(row, "customer_tax_id"),
                product_code: text(row, "product_code"),
                quantity: number(row, "quantity"),
                unit_price: number(row, "unit_price"),
                total_amount: number(row, "total_amount"),
                seller: text(row, "seller"),
            }),
            Destination::Customers => CanonicalRecord::Customer(CustomerRecord {
                tax_id: text(row, "tax_id"),
                name: text(row, "name"),
                trade_name: text(row, "trade_name"),
                email: text(row, "email"),
                phone: text(row, "phone"),
                address: text(row, "address"),
                city: text(row, "city"),
                state: text(row, "state"),
                zip_code: text(row, "zip_code"),
                registered_at: date(row, "registered_at"),
            }),
            Destination::Catalog => CanonicalRecord::CatalogItem(CatalogItem {
                product_code: text(row, "product_code"),
                description: text(row, "description"),
                category: text(row, "category"),
                brand: text(row, "brand"),
                unit: text(row, "unit"),
                sale_price: number(row, "sale_price"),
                cost_price: number(row, "cost_price"),
                stock_quantity: number(row, "stock_quantity"),
                barcode: text(row, "barcode"),
            }),
        }
    }

    pub fn destination(&self) -> Destination {
        match self {
            CanonicalRecord::Sales(_) => Destination::Sales,
            CanonicalRecord::Customer(_) => Destination::Customers,
            CanonicalRecord::CatalogItem(_) => Destination::Catalog,
        }
    }

    /// 自然键值（去首尾空白）
    pub fn natural_key(&self) -> Option<&str> {
        let key = match self {
            CanonicalRecord::Sales(r) => r.invoice_number.as_deref(),
            CanonicalRecord::Customer(r) => r.tax_id.as_deref(),
            CanonicalRecord::CatalogItem(r) => r.product_code.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// 存储列（与目标表字段同名同序）
    pub fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            CanonicalRecord::Sales(r) => vec![
                ("invoice_number", text_value(&r.invoice_number)),
                ("issue_date", date_value(r.issue_date)),
                ("customer_name", text_value(&r.customer_name)),
                ("customer_tax_id", text_value(&r.customer_tax_id)),
                ("product_code", text_value(&r.product_code)),
                ("quantity", number_value(r.quantity)),
                ("unit_price", number_value(r.unit_price)),
                ("total_amount", number_value(r.total_amount)),
                ("seller", text_value(&r.seller)),
            ],
            CanonicalRecord::Customer(r) => vec![
                ("tax_id", text_value(&r.tax_id)),
                ("name", text_value(&r.name)),
                ("trade_name", text_value(&r.trade_name)),
                ("email", text_value(&r.email)),
                ("phone", text_value(&r.phone)),
                ("address", text_value(&r.address)),
                ("city", text_value(&r.city)),
                ("state", text_value(&r.state)),
                ("zip_code", text_value(&r.zip_code)),
                ("registered_at", date_value(r.registered_at)),
            ],
            CanonicalRecord::CatalogItem(r) => vec![
                ("product_code", text_value(&r.product_code)),
                ("description", text_value(&r.description)),
                ("category", text_value(&r.category)),
                ("brand", text_value(&r.brand)),
                ("unit", text_value(&r.unit)),
                ("sale_price", number_value(r.sale_price)),
                ("cost_price", number_value(r.cost_price)),
                ("stock_quantity", number_value(r.stock_quantity)),
                ("barcode", text_value(&r.barcode)),
            ],
        }
    }
}
