// ==========================================
// 灾情分诊系统 - 标注数据集导入
// ==========================================
// 列: description, casualties, affected_population,
//     infrastructure_damage, event_type, severity
// 规则:
// 1) 缺少任一必需列 -> 整体失败
// 2) 行内任一必需值为空 / 数值无法解析 / 标签不合法 -> 跳过该行并记录原因
// 3) 数值按 IncidentFeatures 规则收敛（负数取 0，损毁度截断到 [0,3]）
// ==========================================

use crate::domain::incident::IncidentFeatures;
use crate::domain::types::SeverityLevel;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRecord, RawTable};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "description",
    "casualties",
    "affected_population",
    "infrastructure_damage",
    "event_type",
    "severity",
];

/// 一条带标签的样本
#[derive(Debug, Clone)]
pub struct LabeledIncident {
    pub line: u64,
    pub features: IncidentFeatures,
    pub label: SeverityLevel,
}

/// 被跳过的行
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub rows: Vec<LabeledIncident>,
    pub skipped: Vec<SkippedRow>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct LabeledDatasetImporter;

impl LabeledDatasetImporter {
    pub fn import_file(path: &Path) -> ImportResult<LabeledDataset> {
        let table = CsvParser::parse_file(path)?;
        let dataset = Self::from_table(table)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.rows.len(),
            skipped = dataset.skipped.len(),
            "标注数据集导入完成"
        );
        Ok(dataset)
    }

    pub fn from_table(table: RawTable) -> ImportResult<LabeledDataset> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !table.headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        let mut dataset = LabeledDataset::default();
        for record in &table.records {
            match Self::map_record(record) {
                Ok(row) => dataset.rows.push(row),
                Err(reason) => {
                    tracing::debug!(line = record.line, reason = %reason, "跳过样本行");
                    dataset.skipped.push(SkippedRow {
                        line: record.line,
                        reason,
                    });
                }
            }
        }

        Ok(dataset)
    }

    fn map_record(record: &RawRecord) -> Result<LabeledIncident, String> {
        let mut values = [""; 6];
        for (slot, column) in values.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = record.get(column).ok_or_else(|| format!("{} 为空", column))?;
        }
        let [description, casualties, affected, damage, event_type, severity] = values;

        let label = SeverityLevel::from_str(severity)?;

        Ok(LabeledIncident {
            line: record.line,
            features: IncidentFeatures::new(
                description,
                parse_count("casualties", casualties)?,
                parse_count("affected_population", affected)?,
                parse_count("infrastructure_damage", damage)?,
                event_type,
            ),
            label,
        })
    }
}

/// 整数或带小数的数值（"4" / "4.0"），小数部分截断
fn parse_count(column: &str, raw: &str) -> Result<i64, String> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v.trunc() as i64),
        _ => Err(format!("{} 不是数值: {}", column, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(data: &str) -> ImportResult<LabeledDataset> {
        LabeledDatasetImporter::from_table(CsvParser::parse_reader(data.as_bytes())?)
    }

    #[test]
    fn test_import_and_skip_bad_rows() {
        let data = "\
description,casualties,affected_population,infrastructure_damage,event_type,severity
River overflow,4,1200,2,Flood,High
Bad label,1,10,0,Flood,Extreme
Missing count,,10,0,Flood,Low
Float count,2.0,-5,7,meteor,critical
";
        let dataset = import(data).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skipped.len(), 2);
        assert_eq!(dataset.skipped[0].line, 3);

        let last = &dataset.rows[1];
        assert_eq!(last.label, SeverityLevel::Critical);
        assert_eq!(last.features.casualties(), 2);
        assert_eq!(last.features.affected_population(), 0);
        assert_eq!(last.features.infrastructure_damage(), 3);
        assert_eq!(last.features.event_type(), "Unknown");
    }

    #[test]
    fn test_missing_columns() {
        let err = import("description,casualties\nx,1\n").unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => {
                assert_eq!(cols.len(), 4);
                assert!(cols.contains(&"severity".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
