// ==========================================
// 灾情分诊系统 - 救援资源领域模型
// ==========================================
// ResourceSpec: 资源目录条目（启动时加载，只读）
// RecommendedResource: 推荐结果条目
// ResourceAvailability: 单类资源的库存计数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Quantity - 标称数量
// ==========================================
// 目录中可写为整数 (3) 或文本 ("3 units" / "5-10 units")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQuantity", into = "RawQuantity")]
pub enum Quantity {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

impl Quantity {
    /// 下限（推荐需求量）
    pub fn lower_bound(&self) -> u32 {
        match *self {
            Quantity::Fixed(n) => n,
            Quantity::Range { min, .. } => min,
        }
    }

    /// 上限（库存初始化总量）
    pub fn upper_bound(&self) -> u32 {
        match *self {
            Quantity::Fixed(n) => n,
            Quantity::Range { max, .. } => max,
        }
    }

    /// 数量至少为 1（目录中的 0 视为 1 个单位）
    fn at_least_one(self) -> Self {
        match self {
            Quantity::Fixed(n) => Quantity::Fixed(n.max(1)),
            Quantity::Range { min, max } => Quantity::Range {
                min: min.max(1),
                max: max.max(1),
            },
        }
    }

    /// 解析文本数量，无法识别时按 1 个单位处理
    pub fn parse(text: &str) -> Self {
        fn leading_number(s: &str) -> Option<u32> {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }

        if let Some((left, right)) = text.split_once('-') {
            if let (Some(a), Some(b)) = (leading_number(left), leading_number(right)) {
                return Quantity::Range {
                    min: a.min(b),
                    max: a.max(b),
                }
                .at_least_one();
            }
        }

        leading_number(text)
            .map(Quantity::Fixed)
            .unwrap_or_default()
            .at_least_one()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Fixed(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<RawQuantity> for Quantity {
    fn from(raw: RawQuantity) -> Self {
        let quantity = match raw {
            RawQuantity::Integer(n) => Quantity::Fixed(n.clamp(0, u32::MAX as i64) as u32),
            RawQuantity::Float(f) if f.is_finite() && f >= 0.0 => Quantity::Fixed(f as u32),
            RawQuantity::Float(_) => Quantity::default(),
            RawQuantity::Text(s) => Quantity::parse(&s),
        };
        quantity.at_least_one()
    }
}

impl From<Quantity> for RawQuantity {
    fn from(q: Quantity) -> Self {
        match q {
            Quantity::Fixed(n) => RawQuantity::Integer(n as i64),
            Quantity::Range { min, max } => RawQuantity::Text(format!("{}-{} units", min, max)),
        }
    }
}

// ==========================================
// ResourceSpec - 资源目录条目
// ==========================================
// 对齐: resource_map.json 中 event_type_map / severity_map 的列表元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(rename = "resource")]
    pub name: String,
    pub priority: u32, // 1 = 最紧急
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default)]
    pub purpose: String,
}

// ==========================================
// RecommendedResource - 推荐资源
// ==========================================
// 同一推荐结果内 resource_name 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedResource {
    #[serde(rename = "resource")]
    pub resource_name: String,
    pub priority: u32,
    pub purpose: String,
    pub quantity: u32, // 需求量
}

impl From<&ResourceSpec> for RecommendedResource {
    fn from(spec: &ResourceSpec) -> Self {
        Self {
            resource_name: spec.name.clone(),
            priority: spec.priority,
            purpose: spec.purpose.clone(),
            quantity: spec.quantity.lower_bound(),
        }
    }
}

// ==========================================
// ResourceRequest - 调配请求行
// ==========================================
// 调用方临时指定的资源与数量，进入调配器前转换为 RecommendedResource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub resource_name: String,
    pub quantity: u32,
}

impl ResourceRequest {
    pub fn new(resource_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            resource_name: resource_name.into(),
            quantity,
        }
    }
}

/// 临时请求行的优先级（不来自目录）
pub const AD_HOC_PRIORITY: u32 = 0;

impl From<&ResourceRequest> for RecommendedResource {
    fn from(r: &ResourceRequest) -> Self {
        Self {
            resource_name: r.resource_name.clone(),
            priority: AD_HOC_PRIORITY,
            purpose: String::new(),
            quantity: r.quantity,
        }
    }
}

// ==========================================
// ResourceAvailability - 资源库存计数
// ==========================================
// 不变量: available == total - allocated - maintenance
// 计数使用无符号整数，任何时刻不为负
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAvailability {
    pub total: u32,
    pub allocated: u32,
    pub maintenance: u32,
    pub available: u32,
}

impl ResourceAvailability {
    /// 初始化（维修数量不超过总量）
    pub fn new(total: u32, maintenance: u32) -> Self {
        let maintenance = maintenance.min(total);
        Self {
            total,
            allocated: 0,
            maintenance,
            available: total - maintenance,
        }
    }

    /// 占用（调用方需先确认 can_allocate）
    pub(crate) fn commit(&mut self, quantity: u32) {
        debug_assert!(self.can_allocate(quantity));
        self.allocated += quantity;
        self.available -= quantity;
    }

    /// 归还（只归还此前占用过的数量）
    pub(crate) fn reverse(&mut self, quantity: u32) {
        let quantity = quantity.min(self.allocated);
        self.allocated -= quantity;
        self.available += quantity;
    }

    /// 计数一致性校验
    pub fn is_consistent(&self) -> bool {
        self.allocated
            .checked_add(self.maintenance)
            .and_then(|used| used.checked_add(self.available))
            == Some(self.total)
    }
}

// ==========================================
// Trait: AvailabilityConstraint
// ==========================================
// 用途: 调配器的库存约束检查接口
pub trait AvailabilityConstraint {
    /// 是否可占用指定数量
    fn can_allocate(&self, quantity: u32) -> bool;

    /// 占用比例（0.0 - 1.0，相对于 total）
    fn utilization_ratio(&self) -> f64;
}

impl AvailabilityConstraint for ResourceAvailability {
    fn can_allocate(&self, quantity: u32) -> bool {
        self.available >= quantity
    }

    fn utilization_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.allocated as f64 / self.total as f64
    }
}
