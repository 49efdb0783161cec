//! CSV table writers.
//!
//! Each table is rendered completely in memory and then written with a
//! single call, so an interrupted run never leaves a half-written file.

use crate::error::{Error, Result};
use crate::types::{format_float, ConversationIds, MetricRow, MetricValue, StatsRow};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

pub const LONG_HEADER: [&str; 5] = [
    "student_id",
    "practice_id",
    "conversation_id",
    "metric_name",
    "metric_value",
];

pub const STATS_HEADER: [&str; 7] = [
    "practice_id",
    "metric_name",
    "n",
    "mean",
    "sd",
    "ci_low",
    "ci_high",
];

/// Render records to CSV bytes.
pub fn to_csv_bytes<I, R>(header: &[&str], records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote table");
    Ok(())
}

// ============================================
// Long format
// ============================================

pub fn render_long(rows: &[MetricRow]) -> Result<Vec<u8>> {
    to_csv_bytes(
        &LONG_HEADER,
        rows.iter().map(|row| {
            [
                row.student_id.clone(),
                row.practice_id.clone(),
                row.conversation_id.clone(),
                row.metric_name.clone(),
                row.metric_value.to_string(),
            ]
        }),
    )
}

pub fn write_long(path: &Path, rows: &[MetricRow]) -> Result<()> {
    write_file(path, &render_long(rows)?)
}

// ============================================
// Wide format
// ============================================

/// One row per conversation, one column per metric.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    /// Distinct metric names, sorted
    pub metric_names: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone)]
pub struct WideRow {
    pub ids: ConversationIds,
    pub values: BTreeMap<String, MetricValue>,
}

/// Pivot long rows; conversations keep their first-appearance order.
pub fn pivot_wide(rows: &[MetricRow]) -> WideTable {
    let metric_names: BTreeSet<&str> = rows.iter().map(|r| r.metric_name.as_str()).collect();

    let mut index: HashMap<(&str, &str, &str), usize> = HashMap::new();
    let mut wide_rows: Vec<WideRow> = Vec::new();
    for row in rows {
        let key = (
            row.student_id.as_str(),
            row.practice_id.as_str(),
            row.conversation_id.as_str(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            wide_rows.push(WideRow {
                ids: ConversationIds {
                    practice_id: row.practice_id.clone(),
                    student_id: row.student_id.clone(),
                    conversation_id: row.conversation_id.clone(),
                },
                values: BTreeMap::new(),
            });
            wide_rows.len() - 1
        });
        wide_rows[slot]
            .values
            .insert(row.metric_name.clone(), row.metric_value);
    }

    WideTable {
        metric_names: metric_names.into_iter().map(str::to_string).collect(),
        rows: wide_rows,
    }
}

pub fn render_wide(table: &WideTable) -> Result<Vec<u8>> {
    let mut header: Vec<&str> = vec!["student_id", "practice_id", "conversation_id"];
    header.extend(table.metric_names.iter().map(String::as_str));

    to_csv_bytes(
        &header,
        table.rows.iter().map(|row| {
            let mut record = vec![
                row.ids.student_id.clone(),
                row.ids.practice_id.clone(),
                row.ids.conversation_id.clone(),
            ];
            record.extend(table.metric_names.iter().map(|name| {
                row.values
                    .get(name)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            }));
            record
        }),
    )
}

pub fn write_wide(path: &Path, rows: &[MetricRow]) -> Result<()> {
    write_file(path, &render_wide(&pivot_wide(rows))?)
}

// ============================================
// Stats
// ============================================

pub fn render_stats(stats: &[StatsRow]) -> Result<Vec<u8>> {
    to_csv_bytes(
        &STATS_HEADER,
        stats.iter().map(|s| {
            [
                s.practice_id.clone(),
                s.metric_name.clone(),
                s.n.to_string(),
                format_float(s.mean),
                format_float(s.sd),
                format_float(s.ci_low),
                format_float(s.ci_high),
            ]
        }),
    )
}

pub fn write_stats(path: &Path, stats: &[StatsRow]) -> Result<()> {
    write_file(path, &render_stats(stats)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rows() -> Vec<MetricRow> {
        let a01 = ConversationIds::from_folder_name("A01");
        let a02 = ConversationIds::from_folder_name("A02");
        vec![
            MetricRow::new(&a02, "num_turns", MetricValue::Count(4)),
            MetricRow::new(&a02, "avg_tokens_ai", MetricValue::Float(12.5)),
            MetricRow::new(&a01, "num_turns", MetricValue::Count(2)),
        ]
    }

    #[test]
    fn test_render_long() {
        let csv = String::from_utf8(render_long(&rows()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "student_id,practice_id,conversation_id,metric_name,metric_value\n\
             02,A,A02,num_turns,4\n\
             02,A,A02,avg_tokens_ai,12.5\n\
             01,A,A01,num_turns,2\n"
        );
    }

    #[test]
    fn test_pivot_wide_fills_gaps() {
        let table = pivot_wide(&rows());
        assert_eq!(table.metric_names, vec!["avg_tokens_ai", "num_turns"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].ids.conversation_id, "A02");

        let csv = String::from_utf8(render_wide(&table).unwrap()).unwrap();
        assert_eq!(
            csv,
            "student_id,practice_id,conversation_id,avg_tokens_ai,num_turns\n\
             02,A,A02,12.5,4\n\
             01,A,A01,,2\n"
        );
    }

    #[test]
    fn test_render_stats_nan() {
        let stats = vec![StatsRow {
            practice_id: "A".into(),
            metric_name: "num_turns".into(),
            n: 1,
            mean: 2.0,
            sd: f64::NAN,
            ci_low: f64::NAN,
            ci_high: f64::NAN,
        }];
        let csv = String::from_utf8(render_stats(&stats).unwrap()).unwrap();
        assert_eq!(
            csv,
            "practice_id,metric_name,n,mean,sd,ci_low,ci_high\nA,num_turns,1,2.0,nan,nan,nan\n"
        );
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics_output/nested/metrics_raw.csv");
        write_long(&path, &rows()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("student_id,"));
    }

    #[test]
    fn test_empty_tables_have_headers() {
        let csv = String::from_utf8(render_wide(&pivot_wide(&[])).unwrap()).unwrap();
        assert_eq!(csv, "student_id,practice_id,conversation_id\n");
    }
}
