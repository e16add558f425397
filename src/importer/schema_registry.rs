// ==========================================
// ERP 导入引擎 - 标准字段目录
// ==========================================
// 职责: 三张目标表（销售/客户/商品）的标准字段定义
// 每个字段: 名称、显示名、值类别、可接受的列类型、关键词、是否必填
// ==========================================

use crate::domain::types::{Destination, FieldKind, PrimitiveType};

/// 标准字段
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalField {
    /// 字段名（存储列名）
    pub name: &'static str,
    /// ERP 导出中常见的表头写法
    pub label: &'static str,
    pub kind: FieldKind,
    pub accepted_types: &'static [PrimitiveType],
    pub keywords: &'static [&'static str],
    pub required: bool,
}

impl CanonicalField {
    pub fn accepts(&self, detected: PrimitiveType) -> bool {
        self.accepted_types.contains(&detected)
    }
}

/// 目标表结构
#[derive(Debug, PartialEq)]
pub struct SchemaDefinition {
    pub destination: Destination,
    /// 去重用自然键
    pub natural_key: &'static str,
    pub fields: &'static [CanonicalField],
}

impl SchemaDefinition {
    pub fn field(&self, name: &str) -> Option<&'static CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static CanonicalField> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.name)
    }
}

const TEXT: &[PrimitiveType] = &[PrimitiveType::Text];
const DATE: &[PrimitiveType] = &[PrimitiveType::Date];
const MONEY: &[PrimitiveType] = &[PrimitiveType::Currency, PrimitiveType::Number];
const NUMERIC: &[PrimitiveType] = &[PrimitiveType::Number, PrimitiveType::Currency];
const CODE: &[PrimitiveType] = &[PrimitiveType::Text, PrimitiveType::Number];

// ==========================================
// 销售流水
// ==========================================
static SALES_FIELDS: &[CanonicalField] = &[
    CanonicalField {
        name: "invoice_number",
        label: "Número da Nota",
        kind: FieldKind::Text,
        accepted_types: CODE,
        keywords: &["nota", "nota fiscal", "numero", "invoice", "documento", "pedido"],
        required: true,
    },
    CanonicalField {
        name: "issue_date",
        label: "Data de Emissão",
        kind: FieldKind::Date,
        accepted_types: DATE,
        keywords: &["data", "emissao", "date", "dia", "competencia"],
        required: true,
    },
    CanonicalField {
        name: "customer_name",
        label: "Nome do Cliente",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["cliente", "comprador", "razao social", "customer"],
        required: false,
    },
    CanonicalField {
        name: "customer_tax_id",
        label: "CPF/CNPJ do Cliente",
        kind: FieldKind::Document,
        accepted_types: CODE,
        keywords: &["cnpj", "cpf", "documento cliente", "tax"],
        required: false,
    },
    CanonicalField {
        name: "product_code",
        label: "Código do Produto",
        kind: FieldKind::Text,
        accepted_types: CODE,
        keywords: &["codigo", "produto", "sku", "referencia", "item"],
        required: false,
    },
    CanonicalField {
        name: "quantity",
        label: "Quantidade",
        kind: FieldKind::Number,
        accepted_types: NUMERIC,
        keywords: &["quantidade", "qtde", "volume", "unidades", "quantity"],
        required: false,
    },
    CanonicalField {
        name: "unit_price",
        label: "Preço Unitário",
        kind: FieldKind::Currency,
        accepted_types: MONEY,
        keywords: &["preco", "unitario", "valor unitario", "price"],
        required: false,
    },
    CanonicalField {
        name: "total_amount",
        label: "Valor Total",
        kind: FieldKind::Currency,
        accepted_types: MONEY,
        keywords: &["valor", "total", "montante", "faturamento", "amount"],
        required: true,
    },
    CanonicalField {
        name: "seller",
        label: "Vendedor",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["vendedor", "representante", "seller"],
        required: false,
    },
];

// ==========================================
// 客户
// ==========================================
static CUSTOMER_FIELDS: &[CanonicalField] = &[
    CanonicalField {
        name: "tax_id",
        label: "CPF/CNPJ",
        kind: FieldKind::Document,
        accepted_types: CODE,
        keywords: &["cnpj", "cpf", "documento", "inscricao", "tax"],
        required: true,
    },
    CanonicalField {
        name: "name",
        label: "Razão Social",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["nome", "cliente", "razao", "social", "empresa", "customer"],
        required: true,
    },
    CanonicalField {
        name: "trade_name",
        label: "Nome Fantasia",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["fantasia", "apelido"],
        required: false,
    },
    CanonicalField {
        name: "email",
        label: "E-mail",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["email", "correio", "contato"],
        required: false,
    },
    CanonicalField {
        name: "phone",
        label: "Telefone",
        kind: FieldKind::Text,
        accepted_types: CODE,
        keywords: &["telefone", "fone", "celular", "whatsapp", "phone"],
        required: false,
    },
    CanonicalField {
        name: "address",
        label: "Endereço",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["endereco", "logradouro", "rua", "address"],
        required: false,
    },
    CanonicalField {
        name: "city",
        label: "Cidade",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["cidade", "municipio", "city"],
        required: false,
    },
    CanonicalField {
        name: "state",
        label: "UF",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["estado", "uf", "state"],
        required: false,
    },
    CanonicalField {
        name: "zip_code",
        label: "CEP",
        kind: FieldKind::Document,
        accepted_types: CODE,
        keywords: &["cep", "postal", "zip"],
        required: false,
    },
    CanonicalField {
        name: "registered_at",
        label: "Data de Cadastro",
        kind: FieldKind::Date,
        accepted_types: DATE,
        keywords: &["cadastro", "data cadastro", "desde"],
        required: false,
    },
];

// ==========================================
// 商品目录
// ==========================================
static CATALOG_FIELDS: &[CanonicalField] = &[
    CanonicalField {
        name: "product_code",
        label: "Código do Produto",
        kind: FieldKind::Text,
        accepted_types: CODE,
        keywords: &["codigo", "sku", "referencia", "produto", "item", "code"],
        required: true,
    },
    CanonicalField {
        name: "description",
        label: "Descrição",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["descricao", "produto", "nome", "item", "description"],
        required: true,
    },
    CanonicalField {
        name: "category",
        label: "Categoria",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["categoria", "grupo", "familia", "linha"],
        required: false,
    },
    CanonicalField {
        name: "brand",
        label: "Marca",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["marca", "fabricante", "brand"],
        required: false,
    },
    CanonicalField {
        name: "unit",
        label: "Unidade",
        kind: FieldKind::Text,
        accepted_types: TEXT,
        keywords: &["unidade", "medida", "unit"],
        required: false,
    },
    CanonicalField {
        name: "sale_price",
        label: "Preço de Venda",
        kind: FieldKind::Currency,
        accepted_types: MONEY,
        keywords: &["preco", "venda", "valor", "price"],
        required: false,
    },
    CanonicalField {
        name: "cost_price",
        label: "Preço de Custo",
        kind: FieldKind::Currency,
        accepted_types: MONEY,
        keywords: &["custo", "compra", "cost"],
        required: false,
    },
    CanonicalField {
        name: "stock_quantity",
        label: "Estoque",
        kind: FieldKind::Number,
        accepted_types: NUMERIC,
        keywords: &["estoque", "saldo", "quantidade", "stock"],
        required: false,
    },
    CanonicalField {
        name: "barcode",
        label: "Código de Barras",
        kind: FieldKind::Document,
        accepted_types: CODE,
        keywords: &["ean", "gtin", "barras", "barcode"],
        required: false,
    },
];

pub static SALES_SCHEMA: SchemaDefinition = SchemaDefinition {
    destination: Destination::Sales,
    natural_key: "invoice_number",
    fields: SALES_FIELDS,
};

pub static CUSTOMERS_SCHEMA: SchemaDefinition = SchemaDefinition {
    destination: Destination::Customers,
    natural_key: "tax_id",
    fields: CUSTOMER_FIELDS,
};

pub static CATALOG_SCHEMA: SchemaDefinition = SchemaDefinition {
    destination: Destination::Catalog,
    natural_key: "product_code",
    fields: CATALOG_FIELDS,
};

/// 取目标表结构
pub fn schema_for(destination: Destination) -> &'static SchemaDefinition {
    match destination {
        Destination::Sales => &SALES_SCHEMA,
        Destination::Customers => &CUSTOMERS_SCHEMA,
        Destination::Catalog => &CATALOG_SCHEMA,
    }
}

/// 全部目标表结构（与 Destination::ALL 同序）
pub fn all_schemas() -> [&'static SchemaDefinition; 3] {
    Destination::ALL.map(schema_for)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_natural_key_is_required_field() {
        for schema in all_schemas() {
            let key = schema
                .field(schema.natural_key)
                .expect("自然键必须是表内字段");
            assert!(key.required, "{} 的自然键应为必填", schema.destination);
        }
    }

    #[test]
    fn test_field_names_unique_per_schema() {
        for schema in all_schemas() {
            let names: HashSet<_> = schema.field_names().collect();
            assert_eq!(names.len(), schema.fields.len());
        }
    }

    #[test]
    fn test_schema_for_matches_destination() {
        for dest in Destination::ALL {
            assert_eq!(schema_for(dest).destination, dest);
        }
    }
}
