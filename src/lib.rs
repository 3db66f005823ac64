// ==========================================
// 灾情分诊系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 辅助决策（严重度预测 + 资源推荐 + 资源调配），人工最终确认
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 资源目录 - 事件类型/严重度 -> 候选资源
pub mod catalog;

// 数据仓储层 - 事件与操作日志
pub mod repository;

// 引擎层 - 预测 / 推荐 / 调配
pub mod engine;

// 导入层 - 标注数据集
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{IncidentStatus, PredictionMode, SeverityLevel};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AllocationRecord, Incident, IncidentFeatures, IncidentQuery,
    RecommendedResource, ResourceAvailability, ResourceRequest, ResourceSpec, SeverityPrediction,
    SystemStatus, TriageResult,
};

// 目录
pub use catalog::ResourceCatalog;

// 引擎
pub use engine::{
    ResourceAllocator, ResourceRecommender, RuleBasedClassifier, SeverityClassifier,
    SeverityPredictor, TrainedClassifier,
};

// API
pub use api::{IncidentApi, TriageApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "灾情分诊系统";
