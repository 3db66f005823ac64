// ==========================================
// 灾情分诊系统 - 预测评估
// ==========================================
// 输入: 标注数据集 + SeverityPredictor
// 输出: 一致率、各标签样本数/命中数、混淆矩阵
// ==========================================

use crate::domain::types::{PredictionMode, SeverityLevel};
use crate::engine::severity::SeverityPredictor;
use crate::importer::labeled_dataset::LabeledDataset;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelStats {
    pub support: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub mode: PredictionMode,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// 标签 -> 统计
    pub per_label: BTreeMap<SeverityLevel, LabelStats>,
    /// "标签->预测" -> 次数
    pub confusion: BTreeMap<String, usize>,
    pub mean_confidence: f64,
}

/// 逐条预测并与标签比对
///
/// 空数据集的 accuracy / mean_confidence 为 0
#[instrument(skip_all, fields(rows = dataset.rows.len()))]
pub fn evaluate(predictor: &SeverityPredictor, dataset: &LabeledDataset) -> EvaluationReport {
    let mut per_label: BTreeMap<SeverityLevel, LabelStats> = BTreeMap::new();
    let mut confusion: BTreeMap<String, usize> = BTreeMap::new();
    let mut correct = 0usize;
    let mut confidence_sum = 0.0;

    for row in &dataset.rows {
        let prediction = predictor.predict(&row.features);
        let stats = per_label.entry(row.label).or_default();
        stats.support += 1;

        if prediction.severity == row.label {
            stats.correct += 1;
            correct += 1;
        }
        confidence_sum += prediction.confidence;

        *confusion
            .entry(format!("{}->{}", row.label, prediction.severity))
            .or_insert(0) += 1;
    }

    let total = dataset.rows.len();
    let (accuracy, mean_confidence) = if total == 0 {
        (0.0, 0.0)
    } else {
        (correct as f64 / total as f64, confidence_sum / total as f64)
    };

    tracing::info!(total, correct, accuracy, mode = %predictor.mode(), "评估完成");

    EvaluationReport {
        mode: predictor.mode(),
        total,
        correct,
        accuracy,
        per_label,
        confusion,
        mean_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::incident::IncidentFeatures;
    use crate::importer::labeled_dataset::LabeledIncident;

    fn row(label: SeverityLevel, casualties: i64) -> LabeledIncident {
        LabeledIncident {
            line: 0,
            features: IncidentFeatures::new("x", casualties, 0, 0, "Flood"),
            label,
        }
    }

    #[test]
    fn test_rule_based_evaluation() {
        let dataset = LabeledDataset {
            rows: vec![
                row(SeverityLevel::Low, 0),
                row(SeverityLevel::Medium, 20),
                row(SeverityLevel::Critical, 20),
            ],
            skipped: vec![],
        };

        let report = evaluate(&SeverityPredictor::rule_based(), &dataset);
        assert_eq!(report.total, 3);
        assert_eq!(report.correct, 2);
        assert_eq!(report.mode, PredictionMode::RuleBased);
        assert!((report.mean_confidence - 0.5).abs() < 1e-12);
        assert_eq!(report.confusion.get("Critical->Medium"), Some(&1));
        assert_eq!(
            report.per_label.get(&SeverityLevel::Critical),
            Some(&LabelStats { support: 1, correct: 0 })
        );
    }

    #[test]
    fn test_empty_dataset() {
        let report = evaluate(&SeverityPredictor::rule_based(), &LabeledDataset::default());
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
    }
}
