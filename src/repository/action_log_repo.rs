// ==========================================
// 灾情分诊系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 分诊 / 调配 / 释放 / 事件变更 都必须记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::ActionLogRepository;
