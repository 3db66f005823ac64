// ==========================================
// 灾情分诊系统 - 事件领域模型
// ==========================================
// IncidentFeatures: 分类器输入（不可变值对象）
// Incident: 事件存储中的一条记录
// ==========================================

use crate::domain::types::{IncidentStatus, SeverityLevel};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 未识别事件类型的归一值
pub const UNKNOWN_EVENT_TYPE: &str = "Unknown";

/// 基础设施损毁评分上限
pub const MAX_INFRASTRUCTURE_DAMAGE: u8 = 3;

/// 事件类型词表（训练数据集中的全部类型 + Utility Failure）
pub const EVENT_TYPE_VOCABULARY: &[&str] = &[
    "Avalanche",
    "Blizzard",
    "Bridge Collapse",
    "Building Collapse",
    "Bus Crash",
    "Chemical Spill",
    "Civil Unrest",
    "Cyber Attack",
    "Disease Outbreak",
    "Drought",
    "Earthquake",
    "Flash Flood",
    "Flood",
    "Foodborne Illness",
    "Gas Explosion",
    "Heat Wave",
    "House Fire",
    "Hurricane",
    "Industrial Fire",
    "Landslide",
    "Maritime Incident",
    "Mine Collapse",
    "Nuclear Incident",
    "Pandemic Cluster",
    "Plane Crash",
    "Power Grid Failure",
    "Road Accident",
    "Sinkhole",
    "Small Plane Crash",
    "Stampede",
    "Terrorist Attack",
    "Tornado",
    "Train Derailment",
    "Tsunami",
    "Utility Failure",
    "Volcanic Eruption",
    "Water Contamination",
    "Wildfire",
];

/// 事件类型归一化：词表外的值映射为 "Unknown"
pub fn normalize_event_type(raw: &str) -> String {
    let trimmed = raw.trim();
    EVENT_TYPE_VOCABULARY
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
        .map(|known| known.to_string())
        .unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_string())
}

// ==========================================
// IncidentFeatures - 分类器输入
// ==========================================
// 每次预测请求构造一次，无身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentFeatures {
    description: String,
    casualties: u64,
    affected_population: u64,
    infrastructure_damage: u8,
    event_type: String,
}

impl IncidentFeatures {
    /// 构造并归一化
    ///
    /// - 负数计数截断为 0
    /// - 基础设施损毁截断到 [0, 3]
    /// - 词表外事件类型映射为 "Unknown"
    pub fn new(
        description: impl Into<String>,
        casualties: i64,
        affected_population: i64,
        infrastructure_damage: i64,
        event_type: &str,
    ) -> Self {
        Self {
            description: description.into(),
            casualties: casualties.max(0) as u64,
            affected_population: affected_population.max(0) as u64,
            infrastructure_damage: infrastructure_damage.clamp(0, MAX_INFRASTRUCTURE_DAMAGE as i64)
                as u8,
            event_type: normalize_event_type(event_type),
        }
    }

    /// 从松散的 JSON 记录构造（缺失数值字段按 0 处理）
    pub fn from_record(record: &JsonValue) -> Self {
        let int_field = |name: &str| -> i64 {
            match record.get(name) {
                Some(v) => v
                    .as_i64()
                    .or_else(|| v.as_f64().map(|f| f as i64))
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
                    .unwrap_or(0),
                None => 0,
            }
        };

        let description = record
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let event_type = record
            .get("event_type")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_EVENT_TYPE);

        Self::new(
            description,
            int_field("casualties"),
            int_field("affected_population"),
            int_field("infrastructure_damage"),
            event_type,
        )
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn casualties(&self) -> u64 {
        self.casualties
    }

    pub fn affected_population(&self) -> u64 {
        self.affected_population
    }

    pub fn infrastructure_damage(&self) -> u8 {
        self.infrastructure_damage
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// 数值特征向量 (casualties, affected_population, infrastructure_damage)
    pub fn numeric_features(&self) -> [f64; 3] {
        [
            self.casualties as f64,
            self.affected_population as f64,
            self.infrastructure_damage as f64,
        ]
    }
}

// ==========================================
// Incident - 事件记录
// ==========================================
// 对齐: incident 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub title: String,
    pub event_type: String,
    pub severity: SeverityLevel,
    pub location: String,
    pub description: String,
    pub status: IncidentStatus,

    // ===== 分诊特征 =====
    pub casualties: u64,
    pub affected_population: u64,
    pub infrastructure_damage: u8,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Incident {
    /// 由事件记录提取分类器特征
    pub fn features(&self) -> IncidentFeatures {
        IncidentFeatures::new(
            self.description.clone(),
            self.casualties as i64,
            self.affected_population as i64,
            self.infrastructure_damage as i64,
            &self.event_type,
        )
    }
}

// ==========================================
// IncidentQuery - 事件检索条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentQuery {
    /// 标题/描述/地点模糊匹配（忽略大小写）
    pub text: Option<String>,
    pub event_type: Option<String>,
    pub severity: Option<SeverityLevel>,
    pub status: Option<IncidentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_features_clamp() {
        let f = IncidentFeatures::new("x", -5, -1, 9, "flood");
        assert_eq!(f.casualties(), 0);
        assert_eq!(f.affected_population(), 0);
        assert_eq!(f.infrastructure_damage(), 3);
        assert_eq!(f.event_type(), "Flood");
    }

    #[test]
    fn test_unknown_event_type() {
        let f = IncidentFeatures::new("", 0, 0, 0, "Meteor Strike");
        assert_eq!(f.event_type(), UNKNOWN_EVENT_TYPE);
    }

    #[test]
    fn test_from_record_defaults() {
        let f = IncidentFeatures::from_record(&json!({
            "event_type": "Earthquake",
            "casualties": 12,
            "affected_population": "3000"
        }));
        assert_eq!(f.casualties(), 12);
        assert_eq!(f.affected_population(), 3000);
        assert_eq!(f.infrastructure_damage(), 0);
        assert_eq!(f.description(), "");
        assert_eq!(f.event_type(), "Earthquake");

        let empty = IncidentFeatures::from_record(&json!({}));
        assert_eq!(empty.event_type(), UNKNOWN_EVENT_TYPE);
        assert_eq!(empty.numeric_features(), [0.0, 0.0, 0.0]);
    }
}
