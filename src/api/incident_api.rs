// ==========================================
// 灾情分诊系统 - 事件管理 API
// ==========================================
// 职责:
//   1. 事件录入 / 修改 / 删除 / 检索
//   2. 状态流转: Active <-> Resolved -> Closed；Closed 为终态
//   3. 事件结束（Resolved/Closed）或删除时释放其占用的资源
//   4. 对已存事件执行分诊与调配
// 事件类型: 词表内统一写法，词表外保留原文（预测时按 Unknown 处理）
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::api::triage_api::TriageApi;
use crate::api::validator::{validate_incident_draft, validate_incident_id, IncidentDraft};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::incident::{
    normalize_event_type, Incident, IncidentFeatures, IncidentQuery, UNKNOWN_EVENT_TYPE,
};
use crate::domain::resource::RecommendedResource;
use crate::domain::triage::TriageResult;
use crate::domain::types::IncidentStatus;
use crate::i18n::t_with_args;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::incident_repo::IncidentRepository;

/// 分诊并调配的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub triage: TriageResult,
    pub granted: Vec<RecommendedResource>,
    /// 推荐了但未获批的资源名
    pub shortfall: Vec<String>,
}

// ==========================================
// IncidentApi - 事件管理 API
// ==========================================
pub struct IncidentApi {
    incident_repo: Arc<IncidentRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    triage_api: Arc<TriageApi>,
}

impl IncidentApi {
    pub fn new(
        incident_repo: Arc<IncidentRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        triage_api: Arc<TriageApi>,
    ) -> Self {
        Self {
            incident_repo,
            action_log_repo,
            triage_api,
        }
    }

    /// 录入事件
    ///
    /// 表单未填严重度时采用预测结果
    pub fn create_incident(&self, draft: &IncidentDraft, actor: &str) -> ApiResult<Incident> {
        let severity = validate_incident_draft(draft)?;
        let features = features_of(draft);
        let severity =
            severity.unwrap_or_else(|| self.triage_api.predict_severity(&features).severity);

        let now = Utc::now().naive_utc();
        let incident = Incident {
            incident_id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            event_type: stored_event_type(&draft.event_type),
            severity,
            location: draft.location.trim().to_string(),
            description: draft.description.trim().to_string(),
            status: IncidentStatus::Active,
            casualties: features.casualties(),
            affected_population: features.affected_population(),
            infrastructure_damage: features.infrastructure_damage(),
            created_at: now,
            updated_at: now,
        };

        self.incident_repo.insert(&incident)?;
        self.record(
            ActionLog::new(
                ActionType::CreateIncident,
                Some(&incident.incident_id),
                actor,
                Some(json!({
                    "title": incident.title,
                    "event_type": incident.event_type,
                    "severity": incident.severity,
                    "severity_predicted": draft.severity.as_deref().map_or(true, |s| s.trim().is_empty()),
                })),
            ),
        )?;

        tracing::info!(incident_id = %incident.incident_id, severity = %incident.severity, "事件已录入");
        Ok(incident)
    }

    /// 修改事件内容（状态不变）
    pub fn update_incident(
        &self,
        incident_id: &str,
        draft: &IncidentDraft,
        actor: &str,
    ) -> ApiResult<Incident> {
        let mut incident = self.get_incident(incident_id)?;
        let severity = validate_incident_draft(draft)?;
        let features = features_of(draft);

        incident.title = draft.title.trim().to_string();
        incident.event_type = stored_event_type(&draft.event_type);
        if let Some(severity) = severity {
            incident.severity = severity;
        }
        incident.location = draft.location.trim().to_string();
        incident.description = draft.description.trim().to_string();
        incident.casualties = features.casualties();
        incident.affected_population = features.affected_population();
        incident.infrastructure_damage = features.infrastructure_damage();

        self.incident_repo.update(&incident)?;
        self.record(ActionLog::new(
            ActionType::UpdateIncident,
            Some(incident_id),
            actor,
            Some(json!({ "severity": incident.severity, "event_type": incident.event_type })),
        ))?;

        self.get_incident(incident_id)
    }

    /// 变更事件状态
    ///
    /// - Closed 不可再变更
    /// - 进入 Resolved / Closed 时释放资源
    pub fn change_status(
        &self,
        incident_id: &str,
        status: IncidentStatus,
        actor: &str,
    ) -> ApiResult<Incident> {
        let incident = self.get_incident(incident_id)?;

        if incident.status == IncidentStatus::Closed && status != IncidentStatus::Closed {
            return Err(ApiError::InvalidStateTransition {
                from: incident.status.to_string(),
                to: status.to_string(),
            });
        }

        self.incident_repo.update_status(incident_id, status)?;

        let released = if status.is_terminal() {
            self.triage_api.release(incident_id, actor)?
        } else {
            None
        };

        self.record(
            ActionLog::new(
                ActionType::ChangeStatus,
                Some(incident_id),
                actor,
                Some(json!({
                    "from": incident.status,
                    "to": status,
                    "released_units": released.as_ref().map(|r| r.total_units()),
                })),
            )
            .with_detail(format!("{} -> {}", incident.status, status)),
        )?;

        self.get_incident(incident_id)
    }

    /// 删除事件（同时释放资源）
    pub fn delete_incident(&self, incident_id: &str, actor: &str) -> ApiResult<()> {
        validate_incident_id(incident_id)?;

        if !self.incident_repo.delete(incident_id)? {
            return Err(not_found(incident_id));
        }
        self.triage_api.release(incident_id, actor)?;
        self.record(ActionLog::new(ActionType::DeleteIncident, Some(incident_id), actor, None))?;
        Ok(())
    }

    pub fn get_incident(&self, incident_id: &str) -> ApiResult<Incident> {
        validate_incident_id(incident_id)?;
        self.incident_repo
            .find_by_id(incident_id)?
            .ok_or_else(|| not_found(incident_id))
    }

    pub fn list_incidents(&self) -> ApiResult<Vec<Incident>> {
        Ok(self.incident_repo.list_all()?)
    }

    pub fn search_incidents(&self, query: &IncidentQuery) -> ApiResult<Vec<Incident>> {
        Ok(self.incident_repo.search(query)?)
    }

    /// 对已存事件执行分诊（不修改事件）
    pub fn triage_incident(&self, incident_id: &str, actor: &str) -> ApiResult<TriageResult> {
        let incident = self.get_incident(incident_id)?;
        Ok(self
            .triage_api
            .triage_incident(incident_id, &incident.features(), actor))
    }

    /// 分诊并按推荐调配
    ///
    /// 先释放该事件已有的调配，避免重复占用
    pub fn dispatch_incident(&self, incident_id: &str, actor: &str) -> ApiResult<DispatchResult> {
        let incident = self.get_incident(incident_id)?;
        if incident.status.is_terminal() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "事件已结束，不能调配资源: {}",
                incident.status
            )));
        }

        let triage = self
            .triage_api
            .triage_incident(incident_id, &incident.features(), actor);

        self.triage_api.release(incident_id, actor)?;
        let granted =
            self.triage_api
                .allocate_recommended(incident_id, &triage.recommended_resources, actor)?;

        let shortfall = triage
            .recommended_resources
            .iter()
            .filter(|r| !granted.iter().any(|g| g.resource_name == r.resource_name))
            .map(|r| r.resource_name.clone())
            .collect();

        Ok(DispatchResult {
            triage,
            granted,
            shortfall,
        })
    }

    fn record(&self, log: ActionLog) -> ApiResult<()> {
        self.action_log_repo.insert(&log)?;
        Ok(())
    }
}

fn features_of(draft: &IncidentDraft) -> IncidentFeatures {
    IncidentFeatures::new(
        draft.description.trim(),
        draft.casualties,
        draft.affected_population,
        draft.infrastructure_damage,
        &draft.event_type,
    )
}

/// 词表内的类型统一写法，词表外的保留原文
fn stored_event_type(raw: &str) -> String {
    let raw = raw.trim();
    let canonical = normalize_event_type(raw);
    if canonical == UNKNOWN_EVENT_TYPE {
        raw.to_string()
    } else {
        canonical
    }
}

fn not_found(incident_id: &str) -> ApiError {
    ApiError::NotFound(t_with_args("incident.not_found", &[("id", incident_id)]))
}
