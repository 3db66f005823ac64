// ==========================================
// 灾情分诊系统 - 资源调配记录
// ==========================================
// 以事件ID为键，每个事件同一时刻至多一条记录
// 由 allocate 创建（覆盖），由 release 销毁
// ==========================================

use crate::domain::resource::RecommendedResource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub incident_id: String,
    pub resources: Vec<RecommendedResource>, // 实际批准的资源条目（含 priority / purpose）
    pub allocated_at: DateTime<Utc>,
}

impl AllocationRecord {
    /// 批准的总单位数
    pub fn total_units(&self) -> u64 {
        self.resources.iter().map(|r| r.quantity as u64).sum()
    }
}
