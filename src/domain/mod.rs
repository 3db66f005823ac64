// ==========================================
// 灾情分诊系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod allocation;
pub mod incident;
pub mod resource;
pub mod triage;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use allocation::AllocationRecord;
pub use incident::{
    normalize_event_type, Incident, IncidentFeatures, IncidentQuery, EVENT_TYPE_VOCABULARY,
    UNKNOWN_EVENT_TYPE,
};
pub use resource::{
    AvailabilityConstraint, Quantity, RecommendedResource, ResourceAvailability, ResourceRequest,
    ResourceSpec,
};
pub use triage::{SeverityPrediction, SystemStatus, TriageResult};
pub use types::{IncidentStatus, PredictionMode, SeverityLevel};
