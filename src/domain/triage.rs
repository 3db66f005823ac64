// ==========================================
// 灾情分诊系统 - 分诊结果模型
// ==========================================

use crate::domain::resource::RecommendedResource;
use crate::domain::types::{PredictionMode, SeverityLevel};
use serde::{Deserialize, Serialize};

// ==========================================
// SeverityPrediction - 严重度预测
// ==========================================
// confidence 取值 [0, 1]；规则回退时固定为 0.5
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityPrediction {
    pub severity: SeverityLevel,
    pub confidence: f64,
    pub mode: PredictionMode,
}

// ==========================================
// TriageResult - predict_and_recommend 输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    #[serde(rename = "predicted_severity")]
    pub severity: SeverityLevel,
    pub confidence: f64,
    pub event_type: String,
    pub recommended_resources: Vec<RecommendedResource>,
}

// ==========================================
// SystemStatus - 分诊系统自检
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub model_loaded: bool,
    pub resource_map_loaded: bool,
    pub model_file_found: bool,
    pub catalog_file_found: bool,
    pub mode: String, // "Full AI" | "Fallback"
}
