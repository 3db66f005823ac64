// ==========================================
// 灾情分诊系统 - 领域类型定义
// ==========================================
// 严重度等级 / 事件状态 / 预测模式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 严重度等级 (Severity Level)
// ==========================================
// 顺序: Low < Medium < High < Critical
// 序列化格式与资源目录 severity_map 的键一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    Low,      // 轻微
    Medium,   // 一般
    High,     // 严重
    Critical, // 危急
}

impl SeverityLevel {
    /// 全部等级（升序）
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Low,
        SeverityLevel::Medium,
        SeverityLevel::High,
        SeverityLevel::Critical,
    ];

    /// 目录键 / 模型类别名
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Low => "Low",
            SeverityLevel::Medium => "Medium",
            SeverityLevel::High => "High",
            SeverityLevel::Critical => "Critical",
        }
    }

    /// 资源需求量倍率
    pub fn quantity_multiplier(&self) -> f64 {
        match self {
            SeverityLevel::Low => 0.5,
            SeverityLevel::Medium => 1.0,
            SeverityLevel::High => 1.5,
            SeverityLevel::Critical => 2.0,
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(SeverityLevel::Low),
            "medium" => Ok(SeverityLevel::Medium),
            "high" => Ok(SeverityLevel::High),
            "critical" => Ok(SeverityLevel::Critical),
            other => Err(format!("未知严重度等级: {}", other)),
        }
    }
}

// ==========================================
// 事件状态 (Incident Status)
// ==========================================
// 序列化格式: 首字母大写 (与事件存储一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Active,   // 处置中
    Resolved, // 已解决
    Closed,   // 已关闭
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Active => "Active",
            IncidentStatus::Resolved => "Resolved",
            IncidentStatus::Closed => "Closed",
        }
    }

    /// 是否已结束（结束后释放资源）
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Closed)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(IncidentStatus::Active),
            "resolved" => Ok(IncidentStatus::Resolved),
            "closed" => Ok(IncidentStatus::Closed),
            _ => Err(format!("未知事件状态: {}", s)),
        }
    }
}

// ==========================================
// 预测模式 (Prediction Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionMode {
    Model,    // 训练模型
    RuleBased, // 规则回退
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionMode::Model => write!(f, "MODEL"),
            PredictionMode::RuleBased => write!(f, "RULE_BASED"),
        }
    }
}
