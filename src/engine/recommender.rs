// ==========================================
// 灾情分诊系统 - 资源推荐引擎
// ==========================================
// 输入: (event_type, severity)
// 输出: 按 priority 升序、按资源名去重的推荐列表
// 规则:
// 1) 候选 = 事件类型列表 ++ 严重度列表（保持此顺序）
// 2) 同名资源保留 priority 数值较小者，位置沿用首次出现
// 3) 按 priority 稳定升序排序
// 红线: 纯函数，不做任何调配
// ==========================================

use crate::catalog::ResourceCatalog;
use crate::domain::resource::{RecommendedResource, ResourceSpec};
use crate::domain::types::SeverityLevel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

pub struct ResourceRecommender {
    catalog: Arc<ResourceCatalog>,
}

impl ResourceRecommender {
    pub fn new(catalog: Arc<ResourceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// 推荐资源
    ///
    /// 未知事件类型 / 未映射严重度 贡献空列表，结果可以为空
    #[instrument(skip(self), fields(result_count = tracing::field::Empty))]
    pub fn recommend(&self, event_type: &str, severity: SeverityLevel) -> Vec<RecommendedResource> {
        let candidates = self
            .catalog
            .event_resources(event_type)
            .iter()
            .chain(self.catalog.severity_resources(severity));

        let merged = Self::merge(candidates);
        tracing::Span::current().record("result_count", merged.len());
        merged
    }

    /// 按字符串标签推荐（上游未校验的输入）
    ///
    /// 无法识别的严重度标签视为未映射，只贡献事件类型列表
    pub fn recommend_by_label(&self, event_type: &str, severity_label: &str) -> Vec<RecommendedResource> {
        match severity_label.parse::<SeverityLevel>() {
            Ok(severity) => self.recommend(event_type, severity),
            Err(_) => {
                tracing::debug!(severity_label = %severity_label, "未知严重度标签，仅使用事件类型列表");
                Self::merge(self.catalog.event_resources(event_type).iter())
            }
        }
    }

    fn merge<'a>(candidates: impl Iterator<Item = &'a ResourceSpec>) -> Vec<RecommendedResource> {
        let mut merged: Vec<RecommendedResource> = Vec::new();
        let mut index_by_name: HashMap<String, usize> = HashMap::new();

        for spec in candidates {
            match index_by_name.get(&spec.name) {
                Some(&idx) => {
                    if spec.priority < merged[idx].priority {
                        merged[idx] = RecommendedResource::from(spec);
                    }
                }
                None => {
                    index_by_name.insert(spec.name.clone(), merged.len());
                    merged.push(RecommendedResource::from(spec));
                }
            }
        }

        // sort_by_key 为稳定排序，同优先级保持首次出现顺序
        merged.sort_by_key(|r| r.priority);
        merged
    }

    /// 按严重度倍率调整需求量（向下取整，至少 1）
    pub fn scale_for_severity(
        resources: &[RecommendedResource],
        severity: SeverityLevel,
    ) -> Vec<RecommendedResource> {
        let multiplier = severity.quantity_multiplier();
        resources
            .iter()
            .map(|r| RecommendedResource {
                quantity: ((r.quantity as f64 * multiplier).floor() as u32).max(1),
                ..r.clone()
            })
            .collect()
    }
}
