// ==========================================
// 灾情分诊系统 - API 层
// ==========================================
// 职责: 面向调用方的业务接口（分诊、事件管理）
// ==========================================

pub mod error;
pub mod incident_api;
pub mod triage_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use incident_api::{DispatchResult, IncidentApi};
pub use triage_api::{TriageApi, MODE_FALLBACK, MODE_FULL};
pub use validator::IncidentDraft;
