// ==========================================
// 灾情分诊系统 - 引擎层错误类型
// ==========================================
// 两类错误均不向调用方抛出: 加载失败 -> 永久规则模式,
// 推理失败 -> 当次回退规则
// ==========================================

use thiserror::Error;

/// 模型产物加载错误
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("模型文件不存在: {0}")]
    NotFound(String),

    #[error("模型文件读取失败 (path={path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("模型反序列化失败: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("模型结构不匹配: {0}")]
    SchemaMismatch(String),
}

/// 模型推理错误
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("特征维度不匹配: expected={expected}, actual={actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("模型输出非有限值")]
    NonFiniteOutput,

    #[error("模型输出为空")]
    EmptyOutput,
}
