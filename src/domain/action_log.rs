// ==========================================
// 灾情分诊系统 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪（分诊 / 调配 / 释放 / 事件状态变更）
// 对齐: action_log 表
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub incident_id: Option<String>, // 系统级操作可为None
    pub action_type: String,         // 存储为字符串
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 以当前时间和新 UUID 构造日志
    pub fn new(
        action_type: ActionType,
        incident_id: Option<&str>,
        actor: &str,
        payload_json: Option<JsonValue>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            incident_id: incident_id.map(|s| s.to_string()),
            action_type: action_type.to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Triage,         // 严重度预测 + 资源推荐
    Allocate,       // 资源调配
    Release,        // 资源释放
    CreateIncident, // 创建事件
    UpdateIncident, // 修改事件
    ChangeStatus,   // 事件状态变更
    DeleteIncident, // 删除事件
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::Triage => "TRIAGE",
            ActionType::Allocate => "ALLOCATE",
            ActionType::Release => "RELEASE",
            ActionType::CreateIncident => "CREATE_INCIDENT",
            ActionType::UpdateIncident => "UPDATE_INCIDENT",
            ActionType::ChangeStatus => "CHANGE_STATUS",
            ActionType::DeleteIncident => "DELETE_INCIDENT",
        };
        write!(f, "{}", s)
    }
}
