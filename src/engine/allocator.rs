// ==========================================
// 灾情分诊系统 - 资源调配引擎
// ==========================================
// 职责: 维护各类资源的 total/allocated/maintenance/available,
//       按事件ID批准或拒绝调配请求，事件结束时归还
// 红线: available == total - allocated - maintenance 在每次变更后成立
// 并发: 库存表与调配记录由同一把锁保护，检查与占用在锁内完成
// ==========================================

use crate::catalog::ResourceCatalog;
use crate::domain::allocation::AllocationRecord;
use crate::domain::resource::{AvailabilityConstraint, RecommendedResource, ResourceAvailability};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::instrument;

/// 库存覆写（total / maintenance）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryOverride {
    pub total: u32,
    #[serde(default)]
    pub maintenance: u32,
}

#[derive(Debug, Default)]
struct AllocatorState {
    availability: BTreeMap<String, ResourceAvailability>,
    allocations: HashMap<String, AllocationRecord>,
}

// ==========================================
// ResourceAllocator - 资源调配器
// ==========================================
pub struct ResourceAllocator {
    state: Mutex<AllocatorState>,
}

impl ResourceAllocator {
    /// 由目录标称数量初始化库存（区间取上限）
    ///
    /// 只有事件类型列表中的资源进入库存表，仅出现在严重度列表中的资源视为未知
    pub fn from_catalog(catalog: &ResourceCatalog) -> Self {
        Self::with_inventory(catalog, &BTreeMap::new())
    }

    /// 由目录初始化，并应用库存覆写
    ///
    /// 覆写中目录未出现的资源也会加入库存表
    pub fn with_inventory(
        catalog: &ResourceCatalog,
        overrides: &BTreeMap<String, InventoryOverride>,
    ) -> Self {
        let mut totals: BTreeMap<String, (u32, u32)> = catalog
            .nominal_totals()
            .into_iter()
            .map(|(name, total)| (name, (total, 0)))
            .collect();

        for (name, o) in overrides {
            totals.insert(name.clone(), (o.total, o.maintenance));
        }

        Self::from_totals(totals)
    }

    /// 直接由 (total, maintenance) 构造
    pub fn from_totals(totals: BTreeMap<String, (u32, u32)>) -> Self {
        let availability: BTreeMap<String, ResourceAvailability> = totals
            .into_iter()
            .map(|(name, (total, maintenance))| (name, ResourceAvailability::new(total, maintenance)))
            .collect();

        tracing::info!(resource_kinds = availability.len(), "资源库存初始化完成");

        Self {
            state: Mutex::new(AllocatorState {
                availability,
                allocations: HashMap::new(),
            }),
        }
    }

    /// 获取状态锁
    ///
    /// 锁内操作不会在变更中途 panic，中毒后沿用内部状态
    fn lock_state(&self) -> MutexGuard<'_, AllocatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 检查可用量
    ///
    /// 未知资源返回 false；否则 available >= quantity
    pub fn check_availability(&self, resource_name: &str, quantity: u32) -> bool {
        let state = self.lock_state();
        state
            .availability
            .get(resource_name)
            .map(|a| a.can_allocate(quantity))
            .unwrap_or(false)
    }

    /// 为事件调配资源
    ///
    /// 规则:
    /// 1) 按给定顺序逐行独立检查，可用即占用并计入批准列表
    /// 2) 不可用（含未知资源）的行直接跳过，部分批准属正常结果
    /// 3) 批准列表覆盖该事件已有记录，旧记录的数量不会自动归还
    ///    （重新调配前调用方需先 release）
    ///
    /// # 返回
    /// 实际批准的资源条目（调用方比对长度判断缺口）
    #[instrument(skip(self, resources_needed), fields(requested = resources_needed.len(), granted = tracing::field::Empty))]
    pub fn allocate(
        &self,
        incident_id: &str,
        resources_needed: &[RecommendedResource],
    ) -> Vec<RecommendedResource> {
        let mut state = self.lock_state();
        let mut granted = Vec::with_capacity(resources_needed.len());

        for request in resources_needed {
            match state.availability.get_mut(&request.resource_name) {
                Some(availability) if availability.can_allocate(request.quantity) => {
                    availability.commit(request.quantity);
                    debug_assert!(availability.is_consistent());
                    granted.push(request.clone());
                }
                Some(availability) => {
                    tracing::debug!(
                        resource = %request.resource_name,
                        requested = request.quantity,
                        available = availability.available,
                        "可用量不足，跳过"
                    );
                }
                None => {
                    tracing::debug!(resource = %request.resource_name, "资源不在库存表中，跳过");
                }
            }
        }

        let previous = state.allocations.insert(
            incident_id.to_string(),
            AllocationRecord {
                incident_id: incident_id.to_string(),
                resources: granted.clone(),
                allocated_at: Utc::now(),
            },
        );
        if previous.is_some() {
            tracing::warn!(incident_id = %incident_id, "覆盖了未释放的调配记录，旧记录数量未归还");
        }

        tracing::Span::current().record("granted", granted.len());
        granted
    }

    /// 释放事件占用的资源
    ///
    /// 未知事件ID为空操作
    ///
    /// # 返回
    /// 被释放的记录（若存在）
    #[instrument(skip(self))]
    pub fn release(&self, incident_id: &str) -> Option<AllocationRecord> {
        let mut state = self.lock_state();
        let record = state.allocations.remove(incident_id)?;

        for line in &record.resources {
            if let Some(availability) = state.availability.get_mut(&line.resource_name) {
                availability.reverse(line.quantity);
                debug_assert!(availability.is_consistent());
            }
        }

        tracing::info!(incident_id = %incident_id, lines = record.resources.len(), "资源已释放");
        Some(record)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 单类资源的当前计数
    pub fn availability(&self, resource_name: &str) -> Option<ResourceAvailability> {
        self.lock_state().availability.get(resource_name).copied()
    }

    /// 全部资源的可用量快照
    pub fn available_resources(&self) -> BTreeMap<String, u32> {
        self.lock_state()
            .availability
            .iter()
            .map(|(name, a)| (name.clone(), a.available))
            .collect()
    }

    /// 全部资源的完整计数快照
    pub fn availability_snapshot(&self) -> BTreeMap<String, ResourceAvailability> {
        self.lock_state().availability.clone()
    }

    /// 事件当前的调配记录
    pub fn allocation(&self, incident_id: &str) -> Option<AllocationRecord> {
        self.lock_state().allocations.get(incident_id).cloned()
    }

    /// 持有调配记录的事件数
    pub fn active_incident_count(&self) -> usize {
        self.lock_state().allocations.len()
    }
}
