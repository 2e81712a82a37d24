//! End-to-end pipelines: load, transform, write

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::{Config, ConvertConfig, FilterConfig, JoinConfig, SearchConfig};
use crate::error::{ConvertError, Result};
use crate::output::{JsonOutput, Records};
use crate::parser::load_table;
use crate::search::{self, load_rac_tables, RacEntry, REGISTRATION};
use crate::transform::{concat_tables, filter_contains, left_join};

/// One JSON file produced by a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub rows: usize,
}

fn exporter(pretty: bool, config: &Config) -> JsonOutput {
    JsonOutput::new()
        .with_pretty(pretty)
        .with_date_format(config.date_format)
}

/// Convert every input file to `<stem>.json`, unchanged.
///
/// Stops at the first failing input; files already written stay on disk.
pub fn run_convert(job: &ConvertConfig, config: &Config) -> Result<Vec<Written>> {
    let output = exporter(job.pretty, config);
    let mut written = Vec::with_capacity(job.inputs.len());

    for input in &job.inputs {
        let table = load_table(input, config)?;
        let path = job.output_path(input);
        output.write_file(&table, &path)?;
        written.push(Written {
            path,
            rows: table.row_count(),
        });
    }

    info!(files = written.len(), "convert finished");
    Ok(written)
}

/// Stack the applicable tables, left-join them onto the basic table, write.
///
/// All inputs are loaded before anything is written.
pub fn run_join(job: &JoinConfig, config: &Config) -> Result<Written> {
    let basic = load_table(&job.basic, config)?;
    let applicable = job
        .applicable
        .iter()
        .map(|path| load_table(path, config))
        .collect::<Result<Vec<_>>>()?;

    let applicable = concat_tables(&applicable);
    let joined = left_join(&basic, &applicable, &job.key)?;

    exporter(job.pretty, config).write_file(&joined, &job.output)?;
    info!(
        key = %job.key,
        basic_rows = basic.row_count(),
        applicable_rows = applicable.row_count(),
        rows = joined.row_count(),
        "join finished"
    );

    Ok(Written {
        path: job.output.clone(),
        rows: joined.row_count(),
    })
}

/// Keep records whose column contains the needle, write.
pub fn run_filter(job: &FilterConfig, config: &Config) -> Result<Written> {
    let table = load_table(&job.input, config)?;
    let kept = filter_contains(&table, &job.column, &job.needle);

    exporter(job.pretty, config).write_file(&kept, &job.output)?;
    info!(
        column = %job.column,
        needle = %job.needle,
        total = table.row_count(),
        rows = kept.row_count(),
        "filter finished"
    );

    Ok(Written {
        path: job.output.clone(),
        rows: kept.row_count(),
    })
}

/// Print the records matching `keyword` as a JSON array; returns the hit count.
pub fn run_search(
    job: &SearchConfig,
    keyword: &str,
    config: &Config,
    out: &mut dyn Write,
) -> Result<usize> {
    let records = load_table(&job.input, config)?;
    let hits = search::search(&records, keyword);

    exporter(job.pretty, config).render(&hits, out)?;
    info!(keyword, rows = hits.row_count(), "search finished");
    Ok(hits.row_count())
}

#[derive(Serialize)]
struct DetailDocument<'a> {
    detail: Records<'a>,
    #[serde(rename = "racList")]
    rac_list: &'a [RacEntry],
}

/// Print every application row of one registration together with the RAC
/// groups of its ingredients; returns the row count.
pub fn run_detail(
    job: &SearchConfig,
    registration: &str,
    config: &Config,
    out: &mut dyn Write,
) -> Result<usize> {
    let records = load_table(&job.input, config)?;
    records.require_column(REGISTRATION)?;
    let rac = load_rac_tables(&job.rac_tables, config)?;

    let detail = search::detail(&records, registration, &rac).ok_or_else(|| {
        ConvertError::RecordNotFound {
            column: REGISTRATION.to_string(),
            value: registration.trim().to_string(),
        }
    })?;

    let output = exporter(job.pretty, config);
    output.render_value(
        &DetailDocument {
            detail: output.records(&detail.rows),
            rac_list: &detail.rac,
        },
        out,
    )?;
    info!(
        registration,
        rows = detail.rows.row_count(),
        rac = detail.rac.len(),
        "detail finished"
    );
    Ok(detail.rows.row_count())
}

/// Print the registrations sharing one RAC group; returns the hit count.
pub fn run_rac_group(
    job: &SearchConfig,
    rac_type: &str,
    code: &str,
    config: &Config,
    out: &mut dyn Write,
) -> Result<usize> {
    let records = load_table(&job.input, config)?;
    let rac = load_rac_tables(&job.rac_tables, config)?;
    let hits = search::same_group(&records, &rac, rac_type, code);

    exporter(job.pretty, config).render(&hits, out)?;
    info!(rac_type, code, rows = hits.row_count(), "RAC group finished");
    Ok(hits.row_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_join_pipeline_drops_unregistered_applicable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let job = JoinConfig::default()
            .with_basic(write(dir.path(), "basic.csv", "登録番号,name\n1,A\n"))
            .with_applicable(vec![
                write(dir.path(), "app1.csv", "登録番号,crop\n1,rice\n"),
                write(dir.path(), "app2.csv", "登録番号,crop\n2,wheat\n"),
            ])
            .with_output(dir.path().join("pesticides.json"));

        let written = run_join(&job, &Config::default()).unwrap();
        assert_eq!(written.rows, 1);

        let text = std::fs::read_to_string(&written.path).unwrap();
        assert_eq!(text, "[{\"登録番号\":1,\"name\":\"A\",\"crop\":\"rice\"}]\n");
    }

    #[test]
    fn test_join_pipeline_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pesticides.json");
        let job = JoinConfig::default()
            .with_basic(write(dir.path(), "basic.csv", "登録番号,name\n1,A\n"))
            .with_applicable(vec![dir.path().join("missing.xlsx")])
            .with_output(output.clone());

        let err = run_join(&job, &Config::default()).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_pipeline_writes_one_file_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConvertConfig::default().with_inputs(vec![
            write(dir.path(), "frac_code_table.csv", "code,group\n1,A\n2,B\n3,C\n"),
            write(dir.path(), "hrac_code_table.csv", "code,group\n1,Z\n"),
        ]);

        let written = run_convert(&job, &Config::default()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].path, dir.path().join("frac_code_table.json"));
        assert_eq!(written[0].rows, 3);
        assert_eq!(
            read_json(&written[1].path),
            json!([{"code": 1, "group": "Z"}])
        );
    }

    #[test]
    fn test_filter_pipeline_reads_join_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "pesticides.json",
            r#"[{"登録番号":1,"作物名":"稲"},{"登録番号":2,"作物名":"日本芝"},{"登録番号":3}]"#,
        );
        let job = FilterConfig::default()
            .with_input(input)
            .with_output(dir.path().join("pesticides_turf.json"));

        let written = run_filter(&job, &Config::default()).unwrap();
        assert_eq!(written.rows, 1);
        assert_eq!(
            read_json(&written.path),
            json!([{"登録番号": 2, "作物名": "日本芝"}])
        );
    }

    fn lookup_fixture(dir: &Path) -> SearchConfig {
        let input = write(
            dir,
            "pesticides.json",
            r#"[
                {"登録番号":101,"用途":"殺菌剤","農薬の名称":"ダコニール１０００","正式名称":"ＳＤＳバイオテック","作物名":"日本芝","有効成分":"ＴＰＮ"},
                {"登録番号":101,"用途":"殺菌剤","農薬の名称":"ダコニール１０００","正式名称":"ＳＤＳバイオテック","作物名":"","有効成分":"ＴＰＮ"},
                {"登録番号":202,"用途":"殺虫剤","農薬の名称":"スミチオン乳剤","正式名称":"住友化学","作物名":"稲","有効成分":"MEP"}
            ]"#,
        );
        let frac = write(
            dir,
            "frac_code_table.json",
            r#"[{"rac_type":"FRAC","rac_code":"M5","group_name":"クロロニトリル","made_of_action":"多作用点","examples":"TPN"}]"#,
        );
        let irac = write(
            dir,
            "irac_code_table.json",
            r#"[{"rac_type":"IRAC","rac_code":"1B","group_name":"有機リン","made_of_action":"AChE","examples":"MEP"}]"#,
        );
        SearchConfig::default()
            .with_input(input)
            .with_rac_tables(vec![("FRAC".to_string(), frac), ("IRAC".to_string(), irac)])
    }

    #[test]
    fn test_search_pipeline_prints_deduplicated_hits() {
        let dir = tempfile::tempdir().unwrap();
        let job = lookup_fixture(dir.path());

        let mut out = Vec::new();
        let hits = run_search(&job, "ﾀﾞｺﾆｰﾙ", &Config::default(), &mut out).unwrap();
        assert_eq!(hits, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[{\"登録番号\":101,\"用途\":\"殺菌剤\",\"農薬の名称\":\"ダコニール１０００\",\"正式名称\":\"ＳＤＳバイオテック\"}]\n"
        );
    }

    #[test]
    fn test_detail_pipeline_includes_rac_list() {
        let dir = tempfile::tempdir().unwrap();
        let job = lookup_fixture(dir.path());

        let mut out = Vec::new();
        let rows = run_detail(&job, "101", &Config::default(), &mut out).unwrap();
        assert_eq!(rows, 2);

        let doc: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["detail"][0]["作物名"], json!("日本芝"));
        assert_eq!(doc["detail"][1]["作物名"], json!("－"));
        assert_eq!(doc["racList"][0]["key"], json!("FRAC-M5"));
        assert_eq!(doc["racList"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_detail_pipeline_unknown_registration() {
        let dir = tempfile::tempdir().unwrap();
        let job = lookup_fixture(dir.path());

        let mut out = Vec::new();
        let err = run_detail(&job, "999", &Config::default(), &mut out).unwrap_err();
        assert!(matches!(err, ConvertError::RecordNotFound { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_rac_group_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let job = lookup_fixture(dir.path());

        let mut out = Vec::new();
        let hits = run_rac_group(&job, "IRAC", "1B", &Config::default(), &mut out).unwrap();
        assert_eq!(hits, 1);
        let doc: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            doc,
            json!([{"登録番号": 202, "農薬の名称": "スミチオン乳剤", "正式名称": "住友化学"}])
        );
    }
}
