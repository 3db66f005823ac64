use crate::engine::allocator::InventoryOverride;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "models/severity_model.json";
pub const DEFAULT_CATALOG_PATH: &str = "models/resource_map.json";
pub const DEFAULT_PREDICTION_TIMEOUT_MS: u64 = 2_000;

/// 分诊运行配置（启动时解析一次）
///
/// 存储位置：config_kv（scope_id='global'），见 `config_keys`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// 严重度模型产物（JSON）
    pub model_path: String,

    /// 资源目录文件（resource_map.json）
    pub catalog_path: String,

    /// 异步预测的等待上限，超时走规则回退
    pub prediction_timeout_ms: u64,

    /// 推荐数量是否按严重度倍率放大
    #[serde(default)]
    pub scale_quantity_by_severity: bool,

    /// 库存覆写（资源名 -> total/maintenance）
    #[serde(default)]
    pub resource_inventory: BTreeMap<String, InventoryOverride>,
}

impl TriageConfig {
    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_millis(self.prediction_timeout_ms)
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            prediction_timeout_ms: DEFAULT_PREDICTION_TIMEOUT_MS,
            scale_quantity_by_severity: false,
            resource_inventory: BTreeMap::new(),
        }
    }
}
