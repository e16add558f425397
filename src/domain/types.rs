// ==========================================
// ERP 导入引擎 - 领域类型定义
// ==========================================
// 职责: 目标表、原始类型、字段类别、字段值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Destination - 目标表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Sales,     // 销售流水
    Customers, // 客户
    Catalog,   // 商品目录
}

impl Destination {
    /// 全部目标表（固定顺序，分类器平局时按此顺序取先者）
    pub const ALL: [Destination; 3] = [
        Destination::Sales,
        Destination::Customers,
        Destination::Catalog,
    ];

    /// 存储层表名
    pub fn table_name(&self) -> &'static str {
        match self {
            Destination::Sales => "sales",
            Destination::Customers => "customers",
            Destination::Catalog => "catalog",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" | "vendas" => Ok(Destination::Sales),
            "customers" | "clientes" => Ok(Destination::Customers),
            "catalog" | "produtos" => Ok(Destination::Catalog),
            other => Err(format!("未知目标表: {}", other)),
        }
    }
}

// ==========================================
// PrimitiveType - 列推断类型
// ==========================================
// 顺序即判定优先级: Date > Currency > Number > Text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Date,
    Currency,
    Number,
    Text,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::Date => "date",
            PrimitiveType::Currency => "currency",
            PrimitiveType::Number => "number",
            PrimitiveType::Text => "text",
        };
        f.write_str(s)
    }
}

// ==========================================
// FieldKind - 标准字段的值规范化方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Date,     // DD/MM/YYYY → YYYY-MM-DD
    Currency, // R$ 1.234,56 → 1234.56
    Number,   // 1,5 → 1.5
    Document, // 仅保留数字（CPF/CNPJ 等）
    Text,     // TRIM
}

// ==========================================
// FieldValue - 转换后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 是否为空值（NULL 或空白文本）
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 还原为原始字符串形式（NULL → 空串）
    ///
    /// 转换器对该字符串再次转换结果不变
    pub fn to_raw(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Null => String::new(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            other => f.write_str(&other.to_raw()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_from_str() {
        assert_eq!("Sales".parse::<Destination>(), Ok(Destination::Sales));
        assert_eq!("clientes".parse::<Destination>(), Ok(Destination::Customers));
        assert_eq!(" catalog ".parse::<Destination>(), Ok(Destination::Catalog));
        assert!("stock".parse::<Destination>().is_err());
    }

    #[test]
    fn test_field_value_to_raw() {
        assert_eq!(FieldValue::Number(1234.56).to_raw(), "1234.56");
        assert_eq!(FieldValue::Number(0.0).to_raw(), "0");
        assert_eq!(FieldValue::Text("abc".to_string()).to_raw(), "abc");
        assert_eq!(FieldValue::Null.to_raw(), "");
    }

    #[test]
    fn test_field_value_is_blank() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::Text("  ".to_string()).is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }
}
