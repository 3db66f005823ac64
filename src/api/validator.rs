// ==========================================
// 灾情分诊系统 - 输入校验
// ==========================================
// 职责: 事件录入 / 调配请求的上游校验
// 消息: 经 i18n 输出（zh-CN / en）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::resource::ResourceRequest;
use crate::domain::types::{IncidentStatus, SeverityLevel};
use crate::i18n::{t, t_with_args};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ==========================================
// IncidentDraft - 事件录入表单
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentDraft {
    pub title: String,
    pub event_type: String,
    /// 留空时由预测器给出
    #[serde(default)]
    pub severity: Option<String>,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub casualties: i64,
    #[serde(default)]
    pub affected_population: i64,
    #[serde(default)]
    pub infrastructure_damage: i64,
}

/// 校验事件表单的必填项，返回解析后的严重度（若填写）
pub fn validate_incident_draft(draft: &IncidentDraft) -> ApiResult<Option<SeverityLevel>> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::InvalidInput(t("incident.title_required")));
    }
    if draft.event_type.trim().is_empty() {
        return Err(ApiError::InvalidInput(t("incident.event_type_required")));
    }
    if draft.location.trim().is_empty() {
        return Err(ApiError::InvalidInput(t("incident.location_required")));
    }

    draft
        .severity
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_severity)
        .transpose()
}

pub fn parse_severity(raw: &str) -> ApiResult<SeverityLevel> {
    SeverityLevel::from_str(raw).map_err(|_| {
        ApiError::InvalidInput(t_with_args("triage.invalid_severity", &[("severity", raw)]))
    })
}

pub fn parse_status(raw: &str) -> ApiResult<IncidentStatus> {
    IncidentStatus::from_str(raw).map_err(|_| {
        ApiError::InvalidInput(t_with_args("incident.invalid_status", &[("status", raw)]))
    })
}

pub fn validate_incident_id(incident_id: &str) -> ApiResult<()> {
    if incident_id.trim().is_empty() {
        return Err(ApiError::InvalidInput(t("triage.incident_id_required")));
    }
    Ok(())
}

/// 调配请求的数量必须为正
pub fn validate_requests(requests: &[ResourceRequest]) -> ApiResult<()> {
    match requests.iter().find(|r| r.quantity == 0) {
        Some(r) => Err(ApiError::InvalidInput(t_with_args(
            "triage.quantity_invalid",
            &[("resource", &r.resource_name)],
        ))),
        None => Ok(()),
    }
}
