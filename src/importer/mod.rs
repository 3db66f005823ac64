// ==========================================
// 灾情分诊系统 - 导入层
// ==========================================
// 职责: 标注事件数据集（CSV）导入，供离线评估使用
// ==========================================

pub mod error;
pub mod file_parser;
pub mod labeled_dataset;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, RawRecord, RawTable};
pub use labeled_dataset::{
    LabeledDataset, LabeledDatasetImporter, LabeledIncident, SkippedRow, REQUIRED_COLUMNS,
};
