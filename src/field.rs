//! Result column metadata.

use crate::types::Oid;

/// Portable description of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: String,
    /// OID of the table the column belongs to, or 0.
    pub table: Oid,
    /// Column attribute number within `table`, or 0.
    pub attribute_number: u16,
    pub data_type: Oid,
    /// Negative for variable-width types.
    pub data_type_size: i16,
    pub data_type_name: String,
    pub modifier: i32,
    /// 0 = text, 1 = binary.
    pub format_code: i16,
}

/// Column metadata as a driver reports it.
pub trait NativeField {
    fn name(&self) -> &str;
    fn table(&self) -> u32;
    fn attribute_number(&self) -> u16;
    fn data_type(&self) -> u32;
    fn data_type_size(&self) -> i16;
    fn data_type_name(&self) -> &str;
    fn modifier(&self) -> i32;
    fn format_code(&self) -> i16;
}

impl NativeField for FieldDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> u32 {
        self.table.0
    }

    fn attribute_number(&self) -> u16 {
        self.attribute_number
    }

    fn data_type(&self) -> u32 {
        self.data_type.0
    }

    fn data_type_size(&self) -> i16 {
        self.data_type_size
    }

    fn data_type_name(&self) -> &str {
        &self.data_type_name
    }

    fn modifier(&self) -> i32 {
        self.modifier
    }

    fn format_code(&self) -> i16 {
        self.format_code
    }
}

/// Copy driver metadata into portable descriptions, preserving column order.
pub fn translate<F: NativeField>(fields: &[F]) -> Vec<FieldDescription> {
    fields
        .iter()
        .map(|f| FieldDescription {
            name: f.name().to_string(),
            table: Oid(f.table()),
            attribute_number: f.attribute_number(),
            data_type: Oid(f.data_type()),
            data_type_size: f.data_type_size(),
            data_type_name: f.data_type_name().to_string(),
            modifier: f.modifier(),
            format_code: f.format_code(),
        })
        .collect()
}
