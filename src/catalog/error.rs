// ==========================================
// 灾情分诊系统 - 资源目录错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("资源目录文件不存在: {0}")]
    NotFound(String),

    #[error("资源目录读取失败 (path={path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("资源目录解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}
