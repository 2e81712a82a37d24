//! Configuration handling for sheet2json
//!
//! Every pipeline runs with no arguments; the defaults below are the fixed
//! input and output paths of the pesticide registration data set.

use std::path::{Path, PathBuf};

/// How date and datetime cells are written to JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD` / `YYYY-MM-DDTHH:MM:SS`
    #[default]
    Iso,
    /// Milliseconds since the Unix epoch
    Epoch,
}

impl std::str::FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iso" => Ok(DateFormat::Iso),
            "epoch" => Ok(DateFormat::Epoch),
            _ => Err(format!("Unknown date format: {}", s)),
        }
    }
}

/// Settings shared by all pipelines
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// For Excel files: which sheet to read (first sheet when unset)
    pub sheet_name: Option<String>,
    /// Date rendering in JSON output
    pub date_format: DateFormat,
}

impl Config {
    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    /// Set date output format
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }
}

/// Bulk conversion: each input becomes `<stem>.json`
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub inputs: Vec<PathBuf>,
    /// Directory for outputs; next to each input when unset
    pub output_dir: Option<PathBuf>,
    pub pretty: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            inputs: vec![
                PathBuf::from("frac_code_table.xlsx"),
                PathBuf::from("hrac_code_table.xlsx"),
                PathBuf::from("irac_code_table.xlsx"),
            ],
            output_dir: None,
            pretty: true,
        }
    }
}

impl ConvertConfig {
    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Output path for one input file
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let file_name = input.with_extension("json");
        match (&self.output_dir, file_name.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => file_name,
        }
    }
}

/// Concatenate the applicable tables and left-join them onto the basic table
#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub basic: PathBuf,
    pub applicable: Vec<PathBuf>,
    pub key: String,
    pub output: PathBuf,
    pub pretty: bool,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            basic: PathBuf::from("登録基本部.xlsx"),
            applicable: vec![
                PathBuf::from("登録適用部一.xlsx"),
                PathBuf::from("登録適用部二.xlsx"),
            ],
            key: "登録番号".to_string(),
            output: PathBuf::from("pesticides.json"),
            pretty: false,
        }
    }
}

impl JoinConfig {
    pub fn with_basic(mut self, path: PathBuf) -> Self {
        self.basic = path;
        self
    }

    pub fn with_applicable(mut self, paths: Vec<PathBuf>) -> Self {
        self.applicable = paths;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = path;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Keep only records whose column text contains a needle
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub column: String,
    pub needle: String,
    pub pretty: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("pesticides.json"),
            output: PathBuf::from("pesticides_turf.json"),
            column: "作物名".to_string(),
            needle: "芝".to_string(),
            pretty: false,
        }
    }
}

impl FilterConfig {
    pub fn with_input(mut self, path: PathBuf) -> Self {
        self.input = path;
        self
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = path;
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn with_needle(mut self, needle: impl Into<String>) -> Self {
        self.needle = needle.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Lookups over the joined records and the converted RAC code tables
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub input: PathBuf,
    /// `(kind, path)` pairs, checked in order
    pub rac_tables: Vec<(String, PathBuf)>,
    pub pretty: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("pesticides.json"),
            rac_tables: vec![
                ("FRAC".to_string(), PathBuf::from("frac_code_table.json")),
                ("IRAC".to_string(), PathBuf::from("irac_code_table.json")),
                ("HRAC".to_string(), PathBuf::from("hrac_code_table.json")),
            ],
            pretty: false,
        }
    }
}

impl SearchConfig {
    pub fn with_input(mut self, path: PathBuf) -> Self {
        self.input = path;
        self
    }

    pub fn with_rac_tables(mut self, tables: Vec<(String, PathBuf)>) -> Self {
        self.rac_tables = tables;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
