// ==========================================
// 灾情分诊系统 - 严重度模型产物
// ==========================================
// 产物格式: JSON 序列化的推理管线
//   文本向量化 (TF-IDF) + 数值标准化 + 类别独热 + 线性分类器
// 特征顺序: [tfidf(vocab) | scaled(casualties, affected, damage) | onehot(event_type)]
// 概率: softmax(W·x + b)
// ==========================================

use crate::domain::incident::IncidentFeatures;
use crate::domain::types::SeverityLevel;
use crate::engine::error::{InferenceError, ModelLoadError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// 当前支持的产物格式版本
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// 数值特征个数
const NUMERIC_FEATURE_COUNT: usize = 3;

// ==========================================
// 管线组件
// ==========================================

/// TF-IDF 文本向量化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextVectorizer {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default)]
    pub stop_words: HashSet<String>,
}

impl TextVectorizer {
    /// 分词: 小写，非字母数字字符切分，保留长度 >= 2 的词
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .map(|t| t.to_string())
            .collect()
    }

    /// L2 归一化的 TF-IDF 向量
    fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in Self::tokenize(text) {
            if self.stop_words.contains(&token) {
                continue;
            }
            if let Some(&idx) = self.vocabulary.get(&token) {
                vector[idx] += 1.0;
            }
        }

        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }
        vector
    }
}

/// 数值特征标准化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// 类别独热编码（未知类别 -> 全零）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub categories: Vec<String>,
}

/// 多分类线性模型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// 产物原始结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub classes: Vec<String>,
    pub text: TextVectorizer,
    pub numeric: NumericScaler,
    pub categorical: CategoricalEncoder,
    pub classifier: LinearClassifier,
}

// ==========================================
// SeverityModel - 已校验的模型
// ==========================================
#[derive(Debug, Clone)]
pub struct SeverityModel {
    artifact: ModelArtifact,
    labels: Vec<SeverityLevel>,
}

impl SeverityModel {
    /// 从文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_json_str(&content)
    }

    /// 从 JSON 文本加载并校验
    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// 校验产物结构
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        let mismatch = |msg: String| Err(ModelLoadError::SchemaMismatch(msg));

        if artifact.format_version != MODEL_FORMAT_VERSION {
            return mismatch(format!(
                "format_version={} (支持 {})",
                artifact.format_version, MODEL_FORMAT_VERSION
            ));
        }
        if artifact.classes.is_empty() {
            return mismatch("classes 为空".to_string());
        }

        let mut labels = Vec::with_capacity(artifact.classes.len());
        for class in &artifact.classes {
            match class.parse::<SeverityLevel>() {
                Ok(level) => labels.push(level),
                Err(e) => return mismatch(e),
            }
        }

        let vocab_size = artifact.text.vocabulary.len();
        if artifact.text.idf.len() != vocab_size {
            return mismatch(format!(
                "idf 长度 {} 与词表大小 {} 不一致",
                artifact.text.idf.len(),
                vocab_size
            ));
        }
        let distinct: HashSet<usize> = artifact.text.vocabulary.values().copied().collect();
        if distinct.len() != vocab_size || distinct.iter().any(|&i| i >= vocab_size) {
            return mismatch("词表索引不连续或重复".to_string());
        }

        let numeric = &artifact.numeric;
        if numeric.mean.len() != NUMERIC_FEATURE_COUNT || numeric.scale.len() != NUMERIC_FEATURE_COUNT {
            return mismatch(format!("数值特征需 {} 维", NUMERIC_FEATURE_COUNT));
        }
        if numeric.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return mismatch("scale 含零或非有限值".to_string());
        }

        let width = vocab_size + NUMERIC_FEATURE_COUNT + artifact.categorical.categories.len();
        let classifier = &artifact.classifier;
        if classifier.weights.len() != labels.len() || classifier.intercepts.len() != labels.len() {
            return mismatch(format!(
                "分类器行数与类别数 {} 不一致",
                labels.len()
            ));
        }
        if let Some(row) = classifier.weights.iter().find(|row| row.len() != width) {
            return mismatch(format!("权重宽度 {} 与特征宽度 {} 不一致", row.len(), width));
        }

        Ok(Self { artifact, labels })
    }

    /// 特征总维度
    pub fn feature_width(&self) -> usize {
        self.artifact.text.vocabulary.len()
            + NUMERIC_FEATURE_COUNT
            + self.artifact.categorical.categories.len()
    }

    pub fn classes(&self) -> &[SeverityLevel] {
        &self.labels
    }

    /// 构造特征向量
    fn feature_vector(&self, features: &IncidentFeatures) -> Vec<f64> {
        let mut x = self.artifact.text.transform(features.description());

        let numeric = &self.artifact.numeric;
        for (i, raw) in features.numeric_features().iter().enumerate() {
            x.push((raw - numeric.mean[i]) / numeric.scale[i]);
        }

        for category in &self.artifact.categorical.categories {
            x.push(if category == features.event_type() { 1.0 } else { 0.0 });
        }
        x
    }

    /// 各类别概率（顺序与 classes 一致）
    pub fn predict_proba(&self, features: &IncidentFeatures) -> Result<Vec<f64>, InferenceError> {
        let x = self.feature_vector(features);
        let classifier = &self.artifact.classifier;

        let mut logits = Vec::with_capacity(classifier.weights.len());
        for (row, bias) in classifier.weights.iter().zip(&classifier.intercepts) {
            if row.len() != x.len() {
                return Err(InferenceError::DimensionMismatch {
                    expected: row.len(),
                    actual: x.len(),
                });
            }
            let dot: f64 = row.iter().zip(&x).map(|(w, v)| w * v).sum();
            logits.push(dot + bias);
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(InferenceError::NonFiniteOutput);
        }
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        let probs: Vec<f64> = exps.iter().map(|e| e / sum).collect();

        if probs.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError::NonFiniteOutput);
        }
        Ok(probs)
    }

    /// 最高概率类别及其概率（保留 3 位小数）
    pub fn predict(&self, features: &IncidentFeatures) -> Result<(SeverityLevel, f64), InferenceError> {
        let probs = self.predict_proba(features)?;

        // 并列时取靠前类别
        let (best_idx, best_p) = probs
            .iter()
            .copied()
            .enumerate()
            .fold(None, |acc: Option<(usize, f64)>, (i, p)| match acc {
                Some((_, bp)) if bp >= p => acc,
                _ => Some((i, p)),
            })
            .ok_or(InferenceError::EmptyOutput)?;

        let confidence = (best_p * 1000.0).round() / 1000.0;
        Ok((self.labels[best_idx], confidence.clamp(0.0, 1.0)))
    }
}
