//! Resistance Action Committee (FRAC/IRAC/HRAC) code tables

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::{Row, Table};
use crate::parser::load_table;

use super::normalize;

/// One mode-of-action group, as exposed in detail output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RacEntry {
    /// `{rac_type}-{rac_code}`, unique across tables
    pub key: String,
    pub rac_type: String,
    pub rac_code: String,
    pub group_name: String,
    pub made_of_action: String,
    pub examples: String,
    #[serde(skip)]
    normalized_examples: String,
}

impl RacEntry {
    pub fn new(
        rac_type: impl Into<String>,
        rac_code: impl Into<String>,
        group_name: impl Into<String>,
        made_of_action: impl Into<String>,
        examples: impl Into<String>,
    ) -> Self {
        let rac_type = rac_type.into();
        let rac_code = rac_code.into();
        let examples = examples.into();
        Self {
            key: format!("{}-{}", rac_type, rac_code),
            normalized_examples: normalize(&examples),
            rac_type,
            rac_code,
            group_name: group_name.into(),
            made_of_action: made_of_action.into(),
            examples,
        }
    }

    /// Substring match in either direction on normalized text
    fn matches(&self, ingredient: &str) -> bool {
        !self.normalized_examples.is_empty()
            && !ingredient.is_empty()
            && (self.normalized_examples.contains(ingredient)
                || ingredient.contains(self.normalized_examples.as_str()))
    }
}

/// All entries of one code table
#[derive(Debug, Clone)]
pub struct RacTable {
    /// FRAC, IRAC or HRAC
    pub kind: String,
    pub entries: Vec<RacEntry>,
}

impl RacTable {
    /// Read entries from a converted code table. A missing or empty
    /// `rac_type` falls back to `kind`.
    pub fn from_table(kind: &str, table: &Table) -> Self {
        let text = |row: &Row, column: &str| {
            table
                .column_index(column)
                .and_then(|i| row.get(i))
                .map(|cell| cell.as_text().trim().to_string())
                .unwrap_or_default()
        };

        let entries = table
            .rows
            .iter()
            .map(|row| {
                let rac_type = text(row, "rac_type");
                RacEntry::new(
                    if rac_type.is_empty() { kind.to_string() } else { rac_type },
                    text(row, "rac_code"),
                    text(row, "group_name"),
                    text(row, "made_of_action"),
                    text(row, "examples"),
                )
            })
            .collect();

        Self {
            kind: kind.to_string(),
            entries,
        }
    }

    /// Entries whose examples overlap a normalized ingredient
    pub fn matching<'a>(&'a self, ingredient: &'a str) -> impl Iterator<Item = &'a RacEntry> + 'a {
        self.entries.iter().filter(move |e| e.matches(ingredient))
    }
}

/// Load each `(kind, path)` code table in order.
pub fn load_rac_tables(sources: &[(String, PathBuf)], config: &Config) -> Result<Vec<RacTable>> {
    sources
        .iter()
        .map(|(kind, path)| {
            let table = load_table(path, config)?;
            let rac = RacTable::from_table(kind, &table);
            info!(kind = %kind, entries = rac.entries.len(), "Loaded RAC table");
            Ok(rac)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    #[test]
    fn test_from_table_defaults_type_to_kind() {
        let table = Table::from_rows(
            ["rac_type", "rac_code", "group_name", "made_of_action", "examples"],
            vec![
                vec![CellValue::Null, "M5".into(), "クロロニトリル".into(), "多作用点".into(), "TPN".into()],
                vec!["FRAC".into(), 3i64.into(), "DMI".into(), "ステロール".into(), CellValue::Null],
            ],
        );
        let rac = RacTable::from_table("FRAC", &table);
        assert_eq!(rac.entries[0].key, "FRAC-M5");
        assert_eq!(rac.entries[1].key, "FRAC-3");
        assert_eq!(rac.entries[1].examples, "");
    }

    #[test]
    fn test_matching_is_bidirectional_and_skips_empty() {
        let rac = RacTable {
            kind: "IRAC".into(),
            entries: vec![
                RacEntry::new("IRAC", "1B", "有機リン", "AChE", "ＭＥＰ"),
                RacEntry::new("IRAC", "99", "不明", "", ""),
            ],
        };
        assert_eq!(rac.matching("mep").count(), 1);
        assert_eq!(rac.matching("mep乳剤").count(), 1);
        assert_eq!(rac.matching("me").count(), 1);
        assert_eq!(rac.matching("").count(), 0);
        assert_eq!(rac.matching("tpn").count(), 0);
    }

    #[test]
    fn test_serialized_fields() {
        let entry = RacEntry::new("HRAC", "9", "EPSP", "アミノ酸", "グリホサート");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"key":"HRAC-9","rac_type":"HRAC","rac_code":"9","group_name":"EPSP","made_of_action":"アミノ酸","examples":"グリホサート"}"#
        );
    }

    #[test]
    fn test_load_rac_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frac_code_table.json");
        std::fs::write(&path, r#"[{"rac_code":"M5","examples":"TPN"}]"#).unwrap();

        let tables = load_rac_tables(&[("FRAC".to_string(), path)], &Config::default()).unwrap();
        assert_eq!(tables[0].entries[0].key, "FRAC-M5");
    }
}
