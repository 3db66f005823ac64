// ==========================================
// 灾情分诊系统 - CSV 文件解析
// ==========================================
// 输出: 表头 + 按行的 列名 -> 原始字符串 映射
// 规则: 值去首尾空白；完全空白的行跳过；允许行长度不一致
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 单行原始记录
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 源文件中的行号（表头为第 1 行）
    pub line: u64,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// 取非空字段值
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

pub struct CsvParser;

impl CsvParser {
    /// 解析 CSV 文件
    pub fn parse_file(file_path: &Path) -> ImportResult<RawTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }

        let file = File::open(file_path)?;
        Self::parse_reader(file)
    }

    /// 从任意读取源解析（测试与管道输入）
    pub fn parse_reader<R: Read>(source: R) -> ImportResult<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let mut fields = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    fields.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if fields.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(RawRecord { line, fields });
        }

        Ok(RawTable { headers, records })
    }
}
