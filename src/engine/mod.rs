// ==========================================
// 灾情分诊系统 - 引擎层
// ==========================================
// 职责: 严重度预测、资源推荐、资源调配、离线评估
// 红线: Engine 不拼 SQL, 不向调用方抛出致命错误
// ==========================================

pub mod allocator;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod recommender;
pub mod severity;

// 重导出核心引擎
pub use allocator::{InventoryOverride, ResourceAllocator};
pub use error::{InferenceError, ModelLoadError};
pub use evaluation::{evaluate, EvaluationReport, LabelStats};
pub use model::{SeverityModel, MODEL_FORMAT_VERSION};
pub use recommender::ResourceRecommender;
pub use severity::{
    RuleBasedClassifier, SeverityClassifier, SeverityPredictor, TrainedClassifier,
    FALLBACK_CONFIDENCE,
};
