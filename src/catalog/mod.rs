// ==========================================
// 灾情分诊系统 - 资源目录层
// ==========================================
// 职责: 事件类型 / 严重度 -> 候选资源列表 的静态映射
// 约束: 启动时加载一次，之后只读
// ==========================================

pub mod error;
pub mod resource_catalog;

pub use error::CatalogError;
pub use resource_catalog::ResourceCatalog;
