// ==========================================
// 灾情分诊系统 - 资源目录
// ==========================================
// 文件格式 (resource_map.json):
// {
//   "event_type_map": { "<事件类型>": [ResourceSpec, ...] },
//   "severity_map":   { "<严重度>":   [ResourceSpec, ...] },
//   "resource_categories": {...},   // 可选
//   "response_times": {...}         // 可选
// }
// 文件缺失或损坏 -> 空映射（只记告警，不失败）
// ==========================================

use crate::catalog::error::CatalogError;
use crate::domain::resource::ResourceSpec;
use crate::domain::types::SeverityLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCatalog {
    #[serde(default)]
    event_type_map: BTreeMap<String, Vec<ResourceSpec>>,
    #[serde(default)]
    severity_map: BTreeMap<String, Vec<ResourceSpec>>,
    #[serde(default)]
    resource_categories: JsonValue,
    #[serde(default)]
    response_times: JsonValue,
}

impl ResourceCatalog {
    /// 由两张映射表直接构造
    pub fn new(
        event_type_map: BTreeMap<String, Vec<ResourceSpec>>,
        severity_map: BTreeMap<String, Vec<ResourceSpec>>,
    ) -> Self {
        let mut catalog = Self {
            event_type_map,
            severity_map,
            resource_categories: JsonValue::Null,
            response_times: JsonValue::Null,
        };
        catalog.dedup_lists();
        catalog
    }

    /// 空目录（回退模式）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 解析 JSON 文本
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: ResourceCatalog = serde_json::from_str(json)?;
        catalog.dedup_lists();
        Ok(catalog)
    }

    /// 严格加载：文件缺失或解析失败时返回错误
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_json_str(&content)
    }

    /// 宽松加载：任何失败都退化为空目录并记录告警
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    event_types = catalog.event_type_map.len(),
                    severity_levels = catalog.severity_map.len(),
                    "资源目录加载成功"
                );
                catalog
            }
            Err(CatalogError::NotFound(p)) => {
                tracing::warn!(path = %p, "资源目录文件不存在，使用空目录");
                Self::empty()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "资源目录加载失败，使用空目录");
                Self::empty()
            }
        }
    }

    /// 同一列表内资源名去重（保留首次出现）
    fn dedup_lists(&mut self) {
        let maps = [&mut self.event_type_map, &mut self.severity_map];
        for map in maps {
            for (key, list) in map.iter_mut() {
                let before = list.len();
                let mut seen = HashSet::new();
                list.retain(|spec| seen.insert(spec.name.clone()));
                if list.len() != before {
                    tracing::warn!(key = %key, dropped = before - list.len(), "资源列表存在重名条目，已保留首条");
                }
            }
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 事件类型对应的资源列表（未知类型返回空）
    pub fn event_resources(&self, event_type: &str) -> &[ResourceSpec] {
        self.event_type_map
            .get(event_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 严重度对应的资源列表（未映射返回空）
    pub fn severity_resources(&self, severity: SeverityLevel) -> &[ResourceSpec] {
        self.severity_map
            .get(severity.as_str())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn supported_event_types(&self) -> Vec<String> {
        self.event_type_map.keys().cloned().collect()
    }

    pub fn supported_severity_levels(&self) -> Vec<String> {
        self.severity_map.keys().cloned().collect()
    }

    /// 两张映射表均非空才视为已加载
    pub fn is_loaded(&self) -> bool {
        !self.event_type_map.is_empty() && !self.severity_map.is_empty()
    }

    pub fn resource_categories(&self) -> &JsonValue {
        &self.resource_categories
    }

    pub fn response_times(&self) -> &JsonValue {
        &self.response_times
    }

    /// 各资源的标称总量（库存初始化用）
    ///
    /// 只取事件类型表；按事件类型名顺序遍历，同名资源以最后一次出现的上限为准
    pub fn nominal_totals(&self) -> BTreeMap<String, u32> {
        self.event_type_map
            .values()
            .flatten()
            .map(|spec| (spec.name.clone(), spec.quantity.upper_bound()))
            .collect()
    }
}
