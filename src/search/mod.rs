//! Keyword search and registration lookup over joined pesticide records
//!
//! Field lookups accept both the plain column name and the `_x` variant that
//! a pandas-style merge leaves behind, and fall through to the next name when
//! a value is null or empty.

mod rac;

use rustc_hash::FxHashSet;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::model::{CellValue, Row, Table};

pub use rac::{load_rac_tables, RacEntry, RacTable};

/// Key column of the registration data set
pub const REGISTRATION: &str = "登録番号";

const NAME: &[&str] = &["農薬の名称_x", "農薬の名称"];
const MAKER: &[&str] = &["正式名称"];
const KIND: &[&str] = &["農薬の種類_x", "農薬の種類"];
const USAGE: &[&str] = &["用途_x", "用途"];

/// Active ingredient columns, checked in order
const INGREDIENTS: &[&str] = &["有効成分", "有効成分2", "有効成分3", "有効成分4", "有効成分5"];

/// Placeholder for empty detail fields
const DASH: &str = "－";

/// Detail columns: output name, source columns, dash when empty
const DETAIL_FIELDS: &[(&str, &[&str], bool)] = &[
    (REGISTRATION, &[REGISTRATION], false),
    ("用途", USAGE, false),
    ("農薬の名称", NAME, false),
    ("正式名称", MAKER, false),
    ("作物名", &["作物名"], true),
    ("適用場所", &["適用場所"], true),
    ("適用病害虫雑草名", &["適用病害虫雑草名"], true),
    ("有効成分", &["有効成分"], true),
    ("濃度", &["濃度"], true),
    ("希釈倍数使用量", &["希釈倍数使用量"], true),
    ("散布液量", &["散布液量"], true),
    ("使用時期", &["使用時期"], true),
    ("総使用回数", &["有効成分①を含む農薬の総使用回数", "総使用回数"], true),
    ("使用方法", &["使用方法"], true),
];

/// NFKC-fold, drop all whitespace (including U+3000) and lowercase.
pub fn normalize(text: &str) -> String {
    text.nfkc()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolved column indices for one logical field
struct Field {
    indices: Vec<usize>,
}

impl Field {
    fn new(table: &Table, names: &[&str]) -> Self {
        Self {
            indices: names.iter().filter_map(|n| table.column_index(n)).collect(),
        }
    }

    /// First non-empty value among the candidate columns
    fn get<'r>(&self, row: &'r Row) -> Option<&'r CellValue> {
        self.indices
            .iter()
            .filter_map(|&i| row.get(i))
            .find(|cell| !cell.as_text().is_empty())
    }

    fn value(&self, row: &Row) -> CellValue {
        self.get(row).cloned().unwrap_or(CellValue::Null)
    }

    fn normalized(&self, row: &Row) -> String {
        self.get(row)
            .map(|cell| normalize(&cell.as_text()))
            .unwrap_or_default()
    }
}

/// Normalized, non-empty ingredient texts of a record
fn ingredients(table: &Table, row: &Row) -> Vec<String> {
    INGREDIENTS
        .iter()
        .filter_map(|name| table.column_index(name))
        .filter_map(|i| row.get(i))
        .map(|cell| normalize(&cell.as_text()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// One record per registration whose name, maker or kind contains every
/// whitespace-separated term of `keyword`.
///
/// Terms are normalized like the fields. An empty keyword matches every
/// record. Output columns: 登録番号, 用途, 農薬の名称, 正式名称.
pub fn search(records: &Table, keyword: &str) -> Table {
    let terms: Vec<String> = keyword
        .split_whitespace()
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect();

    let registration = Field::new(records, &[REGISTRATION]);
    let name = Field::new(records, NAME);
    let maker = Field::new(records, MAKER);
    let kind = Field::new(records, KIND);
    let usage = Field::new(records, USAGE);

    let mut result =
        Table::from_rows([REGISTRATION, "用途", "農薬の名称", "正式名称"], vec![]).with_name("search");
    let mut seen: FxHashSet<CellValue> = FxHashSet::default();

    for row in &records.rows {
        let haystacks = [name.normalized(row), maker.normalized(row), kind.normalized(row)];
        let hit = terms
            .iter()
            .all(|term| haystacks.iter().any(|h| h.contains(term.as_str())));
        if !hit {
            continue;
        }

        let reg = registration.value(row);
        if !seen.insert(reg.clone()) {
            continue;
        }
        result.add_row(
            vec![reg, usage.value(row), name.value(row), maker.value(row)],
            row.source_line,
        );
    }

    result.infer_column_types();
    debug!(keyword, hits = result.row_count(), "search");
    result
}

/// Application rows of one registration plus the RAC groups of its ingredients
#[derive(Debug, Clone)]
pub struct Detail {
    pub rows: Table,
    pub rac: Vec<RacEntry>,
}

/// Look up every record whose 登録番号 renders as `registration`.
///
/// Returns `None` when nothing matches.
pub fn detail(records: &Table, registration: &str, rac_tables: &[RacTable]) -> Option<Detail> {
    let wanted = registration.trim();
    let reg = Field::new(records, &[REGISTRATION]);
    let matched: Vec<&Row> = records
        .rows
        .iter()
        .filter(|row| reg.get(row).is_some_and(|cell| cell.as_text() == wanted))
        .collect();
    if matched.is_empty() {
        return None;
    }

    let mut rac: Vec<RacEntry> = Vec::new();
    for row in &matched {
        for ingredient in ingredients(records, row) {
            for entry in rac_tables.iter().flat_map(|t| t.matching(&ingredient)) {
                if !rac.iter().any(|known| known.key == entry.key) {
                    rac.push(entry.clone());
                }
            }
        }
    }

    let fields: Vec<(Field, bool)> = DETAIL_FIELDS
        .iter()
        .map(|(_, sources, dash)| (Field::new(records, sources), *dash))
        .collect();
    let mut rows = Table::from_rows(DETAIL_FIELDS.iter().map(|(name, _, _)| *name), vec![])
        .with_name(format!("{}={}", REGISTRATION, wanted));
    for row in matched {
        let cells = fields
            .iter()
            .map(|(field, dash)| match field.get(row) {
                Some(cell) => cell.clone(),
                None if *dash => CellValue::from(DASH),
                None => CellValue::Null,
            })
            .collect();
        rows.add_row(cells, row.source_line);
    }
    rows.infer_column_types();

    Some(Detail { rows, rac })
}

/// Registrations containing an ingredient listed under the given RAC group.
///
/// Output columns: 登録番号, 農薬の名称, 正式名称; one row per registration.
pub fn same_group(records: &Table, rac_tables: &[RacTable], rac_type: &str, code: &str) -> Table {
    let examples: Vec<String> = rac_tables
        .iter()
        .filter(|t| t.kind.eq_ignore_ascii_case(rac_type))
        .flat_map(|t| &t.entries)
        .filter(|e| e.rac_type == rac_type && e.rac_code == code)
        .map(|e| normalize(&e.examples))
        .filter(|ex| !ex.is_empty())
        .collect();

    let registration = Field::new(records, &[REGISTRATION]);
    let name = Field::new(records, NAME);
    let maker = Field::new(records, MAKER);

    let mut result =
        Table::from_rows([REGISTRATION, "農薬の名称", "正式名称"], vec![]).with_name("rac-group");
    let mut seen: FxHashSet<CellValue> = FxHashSet::default();

    for row in &records.rows {
        let parts = ingredients(records, row);
        let hit = examples.iter().any(|ex| {
            parts
                .iter()
                .any(|part| part.contains(ex.as_str()) || ex.contains(part.as_str()))
        });
        if !hit {
            continue;
        }

        let reg = registration.value(row);
        if seen.insert(reg.clone()) {
            result.add_row(vec![reg, name.value(row), maker.value(row)], row.source_line);
        }
    }

    result.infer_column_types();
    debug!(rac_type, code, hits = result.row_count(), "same RAC group");
    result
}
