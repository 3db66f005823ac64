// ==========================================
// 灾情分诊系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::triage_config::TriageConfig;
use crate::db::open_sqlite_connection;
use crate::engine::allocator::InventoryOverride;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key = %key, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 分诊配置 =====

    /// 解析分诊配置
    ///
    /// 缺失项使用默认值；格式错误的项记录告警后同样回退默认值
    pub fn load_triage_config(&self) -> Result<TriageConfig, Box<dyn Error>> {
        let defaults = TriageConfig::default();

        let model_path = self.get_config_or_default(config_keys::MODEL_PATH, &defaults.model_path)?;
        let catalog_path =
            self.get_config_or_default(config_keys::CATALOG_PATH, &defaults.catalog_path)?;

        let prediction_timeout_ms = match self.get_config_value(config_keys::PREDICTION_TIMEOUT_MS)? {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = config_keys::PREDICTION_TIMEOUT_MS,
                    raw_value = %raw,
                    "超时配置格式错误，使用默认值"
                );
                defaults.prediction_timeout_ms
            }),
            None => defaults.prediction_timeout_ms,
        };

        let scale_quantity_by_severity =
            match self.get_config_value(config_keys::SCALE_QUANTITY_BY_SEVERITY)? {
                Some(raw) => matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                None => defaults.scale_quantity_by_severity,
            };

        let resource_inventory = match self.get_config_value(config_keys::RESOURCE_INVENTORY)? {
            Some(raw) => serde_json::from_str::<BTreeMap<String, InventoryOverride>>(&raw)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        config_key = config_keys::RESOURCE_INVENTORY,
                        error = %e,
                        "库存覆写配置格式错误，忽略"
                    );
                    BTreeMap::new()
                }),
            None => BTreeMap::new(),
        };

        Ok(TriageConfig {
            model_path,
            catalog_path,
            prediction_timeout_ms,
            scale_quantity_by_severity,
            resource_inventory,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产物路径
    pub const MODEL_PATH: &str = "model_path";
    pub const CATALOG_PATH: &str = "catalog_path";

    // 预测
    pub const PREDICTION_TIMEOUT_MS: &str = "prediction_timeout_ms";

    // 推荐 / 调配
    pub const SCALE_QUANTITY_BY_SEVERITY: &str = "scale_quantity_by_severity";
    pub const RESOURCE_INVENTORY: &str = "resource_inventory"; // JSON: {name: {total, maintenance}}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(file.path().to_str().unwrap()).unwrap();
        (file, manager)
    }

    #[test]
    fn test_defaults_when_empty() {
        let (_file, manager) = manager();
        assert_eq!(manager.load_triage_config().unwrap(), TriageConfig::default());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let (_file, manager) = manager();
        manager.set_global_config_value(config_keys::PREDICTION_TIMEOUT_MS, "abc").unwrap();
        manager.set_global_config_value(config_keys::SCALE_QUANTITY_BY_SEVERITY, "true").unwrap();
        manager
            .set_global_config_value(
                config_keys::RESOURCE_INVENTORY,
                r#"{"Rescue Boats": {"total": 12, "maintenance": 2}}"#,
            )
            .unwrap();

        let config = manager.load_triage_config().unwrap();
        assert_eq!(config.prediction_timeout_ms, 2_000);
        assert!(config.scale_quantity_by_severity);
        assert_eq!(
            config.resource_inventory.get("Rescue Boats"),
            Some(&InventoryOverride { total: 12, maintenance: 2 })
        );

        // UPSERT 覆盖
        manager.set_global_config_value(config_keys::PREDICTION_TIMEOUT_MS, "150").unwrap();
        assert_eq!(manager.load_triage_config().unwrap().prediction_timeout_ms, 150);

        let snapshot: HashMap<String, String> =
            serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.len(), 3);
    }
}
