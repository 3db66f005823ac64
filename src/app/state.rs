// ==========================================
// 灾情分诊系统 - 应用状态
// ==========================================
// 职责: 组装配置、目录、引擎、仓储与 API
// 启动顺序:
//   1. 打开数据库（共享连接）并建表
//   2. 从 config_kv 解析 TriageConfig
//   3. 加载资源目录与严重度模型（缺失均不致命）
//   4. 初始化调配库存，创建 API
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{IncidentApi, TriageApi};
use crate::catalog::ResourceCatalog;
use crate::config::{ConfigManager, TriageConfig};
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{ResourceAllocator, ResourceRecommender, SeverityPredictor};
use crate::repository::{ActionLogRepository, IncidentRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时解析的分诊配置
    pub config: TriageConfig,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 分诊API
    pub triage_api: Arc<TriageApi>,

    /// 事件管理API
    pub incident_api: Arc<IncidentApi>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例（配置取自 config_kv）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 数据库无法打开
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::build(db_path, None)
    }

    /// 使用显式配置创建（忽略 config_kv 中的分诊配置）
    pub fn with_config(db_path: String, config: TriageConfig) -> Result<Self, String> {
        Self::build(db_path, Some(config))
    }

    fn build(db_path: String, config: Option<TriageConfig>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v > CURRENT_SCHEMA_VERSION => {
                tracing::warn!(db_version = v, expected = CURRENT_SCHEMA_VERSION, "数据库版本高于当前程序");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("读取 schema_version 失败: {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config = match config {
            Some(config) => config,
            None => config_manager
                .load_triage_config()
                .map_err(|e| format!("读取分诊配置失败: {}", e))?,
        };

        // ==========================================
        // 目录与引擎
        // ==========================================
        let catalog = Arc::new(ResourceCatalog::load_or_empty(&config.catalog_path));
        let predictor = Arc::new(SeverityPredictor::load(&config.model_path));
        let recommender = Arc::new(ResourceRecommender::new(catalog.clone()));
        let allocator = Arc::new(ResourceAllocator::with_inventory(
            &catalog,
            &config.resource_inventory,
        ));

        // ==========================================
        // 仓储与 API
        // ==========================================
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let incident_repo = Arc::new(IncidentRepository::from_connection(conn.clone()));

        let triage_api = Arc::new(TriageApi::new(
            predictor,
            recommender,
            allocator,
            action_log_repo.clone(),
            config.clone(),
        ));
        let incident_api = Arc::new(IncidentApi::new(
            incident_repo,
            action_log_repo.clone(),
            triage_api.clone(),
        ));

        let status = triage_api.system_status();
        tracing::info!(
            mode = %status.mode,
            model_loaded = status.model_loaded,
            resource_map_loaded = status.resource_map_loaded,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            config,
            config_manager,
            triage_api,
            incident_api,
            action_log_repo,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 DISASTER_TRIAGE_DB_PATH > 用户本地数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("DISASTER_TRIAGE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_local_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("disaster-triage");
            // 目录创建失败时由打开数据库报错
            std::fs::create_dir_all(&dir).ok();
            dir.join("triage.db").to_string_lossy().to_string()
        }
        None => "./triage.db".to_string(),
    }
}
