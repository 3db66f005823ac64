// ==========================================
// 灾情分诊系统 - 严重度预测引擎
// ==========================================
// 职责: IncidentFeatures -> (SeverityLevel, confidence)
// 两种实现，构造时显式选择:
//   TrainedClassifier  - 训练模型（推理失败时当次回退规则）
//   RuleBasedClassifier - 确定性规则（永不失败）
// ==========================================

use crate::domain::incident::IncidentFeatures;
use crate::domain::triage::SeverityPrediction;
use crate::domain::types::{PredictionMode, SeverityLevel};
use crate::engine::model::SeverityModel;
use std::path::Path;
use tracing::instrument;

/// 规则回退的固定置信度
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

// ==========================================
// Trait: SeverityClassifier
// ==========================================
pub trait SeverityClassifier: Send + Sync {
    /// 预测严重度（不返回错误）
    fn predict(&self, features: &IncidentFeatures) -> SeverityPrediction;

    /// 是否由训练模型驱动
    fn is_model_loaded(&self) -> bool;
}

// ==========================================
// RuleBasedClassifier - 规则评分
// ==========================================
// score = min(casualties,100)/20 + min(affected,50000)/10000 + damage
// score>=6 Critical / >=3 High / >=1 Medium / 其余 Low
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 计算规则评分（0 - 13）
    pub fn score(features: &IncidentFeatures) -> f64 {
        let casualties = features.casualties().min(100) as f64 / 20.0;
        let affected = features.affected_population().min(50_000) as f64 / 10_000.0;
        let damage = features.infrastructure_damage() as f64;
        casualties + affected + damage
    }

    /// 评分 -> 等级
    pub fn classify(score: f64) -> SeverityLevel {
        if score >= 6.0 {
            SeverityLevel::Critical
        } else if score >= 3.0 {
            SeverityLevel::High
        } else if score >= 1.0 {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        }
    }
}

impl SeverityClassifier for RuleBasedClassifier {
    fn predict(&self, features: &IncidentFeatures) -> SeverityPrediction {
        SeverityPrediction {
            severity: Self::classify(Self::score(features)),
            confidence: FALLBACK_CONFIDENCE,
            mode: PredictionMode::RuleBased,
        }
    }

    fn is_model_loaded(&self) -> bool {
        false
    }
}

// ==========================================
// TrainedClassifier - 训练模型
// ==========================================
pub struct TrainedClassifier {
    model: SeverityModel,
    fallback: RuleBasedClassifier,
}

impl TrainedClassifier {
    pub fn new(model: SeverityModel) -> Self {
        Self {
            model,
            fallback: RuleBasedClassifier,
        }
    }
}

impl SeverityClassifier for TrainedClassifier {
    fn predict(&self, features: &IncidentFeatures) -> SeverityPrediction {
        match self.model.predict(features) {
            Ok((severity, confidence)) => SeverityPrediction {
                severity,
                confidence,
                mode: PredictionMode::Model,
            },
            Err(e) => {
                // 推理失败只影响本次调用
                tracing::warn!(error = %e, "模型推理失败，使用规则回退");
                self.fallback.predict(features)
            }
        }
    }

    fn is_model_loaded(&self) -> bool {
        true
    }
}

// ==========================================
// SeverityPredictor - 严重度预测器
// ==========================================
// 无可变共享状态，可在任意线程并行调用
pub struct SeverityPredictor {
    classifier: Box<dyn SeverityClassifier>,
}

impl SeverityPredictor {
    /// 从模型产物路径构造
    ///
    /// 加载失败（缺失/损坏/结构不匹配）不致命: 记录原因后永久使用规则模式，不重试
    pub fn load(model_path: impl AsRef<Path>) -> Self {
        let model_path = model_path.as_ref();
        match SeverityModel::load(model_path) {
            Ok(model) => {
                tracing::info!(path = %model_path.display(), classes = model.classes().len(), "严重度模型加载成功");
                Self::with_model(model)
            }
            Err(e) => {
                tracing::warn!(path = %model_path.display(), error = %e, "严重度模型不可用，使用规则预测");
                Self::rule_based()
            }
        }
    }

    /// 训练模型变体
    pub fn with_model(model: SeverityModel) -> Self {
        Self {
            classifier: Box::new(TrainedClassifier::new(model)),
        }
    }

    /// 规则变体
    pub fn rule_based() -> Self {
        Self {
            classifier: Box::new(RuleBasedClassifier::new()),
        }
    }

    /// 自定义分类器
    pub fn from_classifier(classifier: Box<dyn SeverityClassifier>) -> Self {
        Self { classifier }
    }

    /// 预测严重度
    #[instrument(skip(self, features), fields(event_type = %features.event_type()))]
    pub fn predict(&self, features: &IncidentFeatures) -> SeverityPrediction {
        let prediction = self.classifier.predict(features);
        tracing::debug!(
            severity = %prediction.severity,
            confidence = prediction.confidence,
            mode = %prediction.mode,
            "严重度预测完成"
        );
        prediction
    }

    /// 规则预测（超时等调用方回退场景）
    pub fn predict_rule_based(&self, features: &IncidentFeatures) -> SeverityPrediction {
        RuleBasedClassifier.predict(features)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.classifier.is_model_loaded()
    }

    pub fn mode(&self) -> PredictionMode {
        if self.is_model_loaded() {
            PredictionMode::Model
        } else {
            PredictionMode::RuleBased
        }
    }
}
