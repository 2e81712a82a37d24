//! Column metadata and type information

use serde::{Deserialize, Serialize};

use super::table::CellValue;

/// Inferred cell type for a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    Mixed,
}

impl CellType {
    /// Type of a single cell
    pub fn of(value: &CellValue) -> CellType {
        match value {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) => CellType::Int,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
            CellValue::Date(_) => CellType::Date,
            CellValue::DateTime(_) => CellType::DateTime,
        }
    }

    /// Widen the type to accommodate another type
    pub fn widen(self, other: CellType) -> CellType {
        if self == other {
            return self;
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            (CellType::Date, CellType::DateTime) | (CellType::DateTime, CellType::Date) => {
                CellType::DateTime
            }
            _ => CellType::Mixed,
        }
    }

    /// Whether two key columns of these types can ever produce a match.
    ///
    /// Null and mixed columns are accepted against anything; otherwise both
    /// sides must widen to a non-mixed type.
    pub fn is_join_compatible(self, other: CellType) -> bool {
        if matches!(self, CellType::Null | CellType::Mixed)
            || matches!(other, CellType::Null | CellType::Mixed)
        {
            return true;
        }
        self.widen(other) != CellType::Mixed
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Null => write!(f, "null"),
            CellType::Bool => write!(f, "bool"),
            CellType::Int => write!(f, "int"),
            CellType::Float => write!(f, "float"),
            CellType::String => write!(f, "string"),
            CellType::Date => write!(f, "date"),
            CellType::DateTime => write!(f, "datetime"),
            CellType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Inferred type from data
    pub inferred_type: CellType,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: CellType::Null,
        }
    }

    /// Create a column with a specified type
    pub fn with_type(name: impl Into<String>, index: usize, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: cell_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen() {
        assert_eq!(CellType::Null.widen(CellType::Int), CellType::Int);
        assert_eq!(CellType::Int.widen(CellType::Float), CellType::Float);
        assert_eq!(CellType::Date.widen(CellType::DateTime), CellType::DateTime);
        assert_eq!(CellType::Int.widen(CellType::String), CellType::Mixed);
    }

    #[test]
    fn test_join_compatibility() {
        assert!(CellType::Int.is_join_compatible(CellType::Float));
        assert!(CellType::Null.is_join_compatible(CellType::String));
        assert!(CellType::Mixed.is_join_compatible(CellType::Int));
        assert!(!CellType::Int.is_join_compatible(CellType::String));
        assert!(!CellType::Bool.is_join_compatible(CellType::Date));
    }
}
