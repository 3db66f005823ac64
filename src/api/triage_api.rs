// ==========================================
// 灾情分诊系统 - 分诊 API
// ==========================================
// 职责: 面向调用方的单一入口
//   1. 严重度预测（同步 / 带超时的异步 / 批量）
//   2. 资源推荐（可按严重度放大数量）
//   3. 资源调配与释放（写操作日志）
//   4. 目录词表与系统自检
// 红线: 预测与推荐永不返回错误；操作日志写入失败只告警
// ==========================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{json, Value as JsonValue};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::api::validator::{validate_incident_id, validate_requests};
use crate::config::TriageConfig;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::allocation::AllocationRecord;
use crate::domain::incident::IncidentFeatures;
use crate::domain::resource::{RecommendedResource, ResourceAvailability, ResourceRequest};
use crate::domain::triage::{SeverityPrediction, SystemStatus, TriageResult};
use crate::domain::types::SeverityLevel;
use crate::engine::{ResourceAllocator, ResourceRecommender, SeverityPredictor};
use crate::repository::action_log_repo::ActionLogRepository;

pub const MODE_FULL: &str = "Full AI";
pub const MODE_FALLBACK: &str = "Fallback";

// ==========================================
// TriageApi - 分诊 API
// ==========================================
pub struct TriageApi {
    predictor: Arc<SeverityPredictor>,
    recommender: Arc<ResourceRecommender>,
    allocator: Arc<ResourceAllocator>,
    action_log_repo: Arc<ActionLogRepository>,
    config: TriageConfig,
}

impl TriageApi {
    pub fn new(
        predictor: Arc<SeverityPredictor>,
        recommender: Arc<ResourceRecommender>,
        allocator: Arc<ResourceAllocator>,
        action_log_repo: Arc<ActionLogRepository>,
        config: TriageConfig,
    ) -> Self {
        Self {
            predictor,
            recommender,
            allocator,
            action_log_repo,
            config,
        }
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    // ==========================================
    // 预测
    // ==========================================

    pub fn predict_severity(&self, features: &IncidentFeatures) -> SeverityPrediction {
        self.predictor.predict(features)
    }

    /// 在阻塞线程上预测，超时或任务失败时按规则回退
    ///
    /// 超时的推理任务不会被中断，其结果被丢弃
    pub async fn predict_with_timeout(
        &self,
        features: IncidentFeatures,
        timeout: Duration,
    ) -> SeverityPrediction {
        let predictor = Arc::clone(&self.predictor);
        let task_features = features.clone();
        let task = tokio::task::spawn_blocking(move || predictor.predict(&task_features));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "预测任务执行失败，使用规则回退");
                self.predictor.predict_rule_based(&features)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "预测超时，使用规则回退");
                self.predictor.predict_rule_based(&features)
            }
        }
    }

    /// 并发批量预测（每条使用配置的超时）
    ///
    /// 结果顺序与输入一致
    pub async fn predict_batch(&self, batch: Vec<IncidentFeatures>) -> Vec<SeverityPrediction> {
        let timeout = self.config.prediction_timeout();
        tracing::info!(count = batch.len(), "开始批量预测");

        let tasks = batch
            .into_iter()
            .map(|features| self.predict_with_timeout(features, timeout));
        join_all(tasks).await
    }

    // ==========================================
    // 推荐
    // ==========================================

    /// 推荐资源（按配置决定是否按严重度放大数量）
    pub fn recommend_resources(
        &self,
        event_type: &str,
        severity: SeverityLevel,
    ) -> Vec<RecommendedResource> {
        let base = self.recommender.recommend(event_type, severity);
        if self.config.scale_quantity_by_severity {
            ResourceRecommender::scale_for_severity(&base, severity)
        } else {
            base
        }
    }

    /// 按字符串标签推荐（无法识别的标签不报错）
    pub fn recommend_resources_by_label(
        &self,
        event_type: &str,
        severity_label: &str,
    ) -> Vec<RecommendedResource> {
        match severity_label.parse::<SeverityLevel>() {
            Ok(severity) => self.recommend_resources(event_type, severity),
            Err(_) => self.recommender.recommend_by_label(event_type, severity_label),
        }
    }

    /// 预测 + 推荐
    ///
    /// 目录按归一化后的事件类型查询：词表外的原始类型一律查 "Unknown" 键。
    /// 目录中词表外的事件类型键仍会出现在 get_supported_event_types 中，
    /// 只能经 recommend_resources 按原文查询
    #[instrument(skip(self, features), fields(event_type = %features.event_type()))]
    pub fn predict_and_recommend(&self, features: &IncidentFeatures) -> TriageResult {
        let prediction = self.predict_severity(features);
        let recommended = self.recommend_resources(features.event_type(), prediction.severity);

        TriageResult {
            severity: prediction.severity,
            confidence: prediction.confidence,
            event_type: features.event_type().to_string(),
            recommended_resources: recommended,
        }
    }

    /// 预测 + 推荐，并为指定事件写入分诊日志
    pub fn triage_incident(
        &self,
        incident_id: &str,
        features: &IncidentFeatures,
        actor: &str,
    ) -> TriageResult {
        let result = self.predict_and_recommend(features);
        self.audit(ActionLog::new(
            ActionType::Triage,
            Some(incident_id),
            actor,
            Some(json!({
                "predicted_severity": result.severity,
                "confidence": result.confidence,
                "mode": self.predictor.mode(),
                "recommended": result.recommended_resources.len(),
            })),
        ));
        result
    }

    // ==========================================
    // 目录词表
    // ==========================================

    pub fn get_supported_event_types(&self) -> Vec<String> {
        self.recommender.catalog().supported_event_types()
    }

    pub fn get_supported_severity_levels(&self) -> Vec<String> {
        self.recommender.catalog().supported_severity_levels()
    }

    pub fn resource_categories(&self) -> &JsonValue {
        self.recommender.catalog().resource_categories()
    }

    pub fn response_times(&self) -> &JsonValue {
        self.recommender.catalog().response_times()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.predictor.is_model_loaded()
    }

    pub fn is_resource_map_loaded(&self) -> bool {
        self.recommender.catalog().is_loaded()
    }

    /// 系统自检
    ///
    /// mode 为 "Full AI" 需要模型与目录都已加载
    pub fn system_status(&self) -> SystemStatus {
        let model_loaded = self.is_model_loaded();
        let resource_map_loaded = self.is_resource_map_loaded();

        SystemStatus {
            model_loaded,
            resource_map_loaded,
            model_file_found: Path::new(&self.config.model_path).is_file(),
            catalog_file_found: Path::new(&self.config.catalog_path).is_file(),
            mode: if model_loaded && resource_map_loaded {
                MODE_FULL.to_string()
            } else {
                MODE_FALLBACK.to_string()
            },
        }
    }

    // ==========================================
    // 调配
    // ==========================================

    pub fn check_availability(&self, resource_name: &str, quantity: u32) -> bool {
        self.allocator.check_availability(resource_name, quantity)
    }

    /// 为事件调配临时指定的资源
    ///
    /// # 返回
    /// - Ok(granted): 实际批准的条目（可能少于请求）
    /// - Err(InvalidInput): 事件ID为空或数量为 0
    pub fn allocate(
        &self,
        incident_id: &str,
        requests: &[ResourceRequest],
        actor: &str,
    ) -> ApiResult<Vec<RecommendedResource>> {
        validate_incident_id(incident_id)?;
        validate_requests(requests)?;

        let lines: Vec<RecommendedResource> = requests.iter().map(RecommendedResource::from).collect();
        Ok(self.allocate_lines(incident_id, &lines, actor))
    }

    /// 按推荐列表调配，返回获批的推荐条目（保持推荐顺序）
    ///
    /// 推荐条目原样进入调配记录，priority / purpose 随记录保留
    pub fn allocate_recommended(
        &self,
        incident_id: &str,
        recommended: &[RecommendedResource],
        actor: &str,
    ) -> ApiResult<Vec<RecommendedResource>> {
        validate_incident_id(incident_id)?;
        Ok(self.allocate_lines(incident_id, recommended, actor))
    }

    fn allocate_lines(
        &self,
        incident_id: &str,
        lines: &[RecommendedResource],
        actor: &str,
    ) -> Vec<RecommendedResource> {
        let granted = self.allocator.allocate(incident_id, lines);
        let shortfall = lines.len() - granted.len();
        if shortfall > 0 {
            tracing::info!(incident_id = %incident_id, shortfall, "部分资源不可用");
        }

        self.audit(ActionLog::new(
            ActionType::Allocate,
            Some(incident_id),
            actor,
            Some(json!({
                "requested": lines,
                "granted": granted,
                "shortfall": shortfall,
            })),
        ));

        granted
    }

    /// 释放事件占用的资源（未知事件为空操作）
    pub fn release(&self, incident_id: &str, actor: &str) -> ApiResult<Option<AllocationRecord>> {
        validate_incident_id(incident_id)?;

        let released = self.allocator.release(incident_id);
        if let Some(record) = &released {
            self.audit(ActionLog::new(
                ActionType::Release,
                Some(incident_id),
                actor,
                Some(json!({
                    "resources": record.resources,
                    "total_units": record.total_units(),
                })),
            ));
        }

        Ok(released)
    }

    pub fn allocation(&self, incident_id: &str) -> Option<AllocationRecord> {
        self.allocator.allocation(incident_id)
    }

    pub fn available_resources(&self) -> BTreeMap<String, u32> {
        self.allocator.available_resources()
    }

    pub fn availability_snapshot(&self) -> BTreeMap<String, ResourceAvailability> {
        self.allocator.availability_snapshot()
    }

    fn audit(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(action_type = %log.action_type, error = %e, "操作日志写入失败");
        }
    }
}
