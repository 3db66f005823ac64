// ==========================================
// 灾情分诊系统 - 事件数据仓储
// ==========================================
// 对齐: incident 表
// 生命周期: 调用方 open -> 使用 -> close，不存在进程级单例
// 红线: Repository 不含业务逻辑（状态流转、资源释放由 API 层负责）
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::incident::{Incident, IncidentQuery};
use crate::domain::types::{IncidentStatus, SeverityLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    SELECT incident_id, title, event_type, severity, location, description, status,
           casualties, affected_population, infrastructure_damage, created_at, updated_at
    FROM incident
"#;

// ==========================================
// IncidentRepository - 事件仓储
// ==========================================
pub struct IncidentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IncidentRepository {
    /// 打开事件库（不存在则建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;
        tracing::info!(db_path = %db_path, "事件库已打开");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 关闭仓储
    ///
    /// 连接仍被其他仓储共享时只释放本句柄，由最后一个持有者关闭
    pub fn close(self) -> RepositoryResult<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex
                    .into_inner()
                    .map_err(|e| RepositoryError::LockError(e.to_string()))?;
                conn.close()
                    .map_err(|(_, e)| RepositoryError::DatabaseConnectionError(e.to_string()))?;
                tracing::info!("事件库已关闭");
            }
            Err(_shared) => {
                tracing::debug!("连接仍被共享，仅释放事件仓储句柄");
            }
        }
        Ok(())
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入事件
    ///
    /// # 返回
    /// - Ok(incident_id)
    /// - Err(UniqueConstraintViolation): ID 重复
    pub fn insert(&self, incident: &Incident) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO incident (
                incident_id, title, event_type, severity, location, description, status,
                casualties, affected_population, infrastructure_damage, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                incident.incident_id,
                incident.title,
                incident.event_type,
                incident.severity.as_str(),
                incident.location,
                incident.description,
                incident.status.as_str(),
                incident.casualties as i64,
                incident.affected_population as i64,
                incident.infrastructure_damage as i64,
                incident.created_at.format(TS_FORMAT).to_string(),
                incident.updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(incident.incident_id.clone())
    }

    /// 更新事件的可编辑字段（created_at 不变，updated_at 取当前时间）
    pub fn update(&self, incident: &Incident) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();

        let rows = conn.execute(
            r#"
            UPDATE incident SET
                title = ?2, event_type = ?3, severity = ?4, location = ?5, description = ?6,
                status = ?7, casualties = ?8, affected_population = ?9,
                infrastructure_damage = ?10, updated_at = ?11
            WHERE incident_id = ?1
            "#,
            params![
                incident.incident_id,
                incident.title,
                incident.event_type,
                incident.severity.as_str(),
                incident.location,
                incident.description,
                incident.status.as_str(),
                incident.casualties as i64,
                incident.affected_population as i64,
                incident.infrastructure_damage as i64,
                now,
            ],
        )?;

        if rows == 0 {
            return Err(not_found(&incident.incident_id));
        }
        Ok(())
    }

    /// 更新事件状态
    pub fn update_status(&self, incident_id: &str, status: IncidentStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();

        let rows = conn.execute(
            "UPDATE incident SET status = ?2, updated_at = ?3 WHERE incident_id = ?1",
            params![incident_id, status.as_str(), now],
        )?;

        if rows == 0 {
            return Err(not_found(incident_id));
        }
        Ok(())
    }

    /// 删除事件
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在
    pub fn delete(&self, incident_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM incident WHERE incident_id = ?1", params![incident_id])?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, incident_id: &str) -> RepositoryResult<Option<Incident>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE incident_id = ?1", SELECT_COLUMNS))?;

        match stmt.query_row(params![incident_id], map_row) {
            Ok(incident) => Ok(Some(incident)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 全部事件（按创建时间倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Incident>> {
        self.search(&IncidentQuery::default())
    }

    /// 检索事件
    ///
    /// - text: 标题/描述/地点 任一包含（忽略大小写）
    /// - event_type / severity / status: 精确匹配
    /// - 结果按创建时间倒序
    pub fn search(&self, query: &IncidentQuery) -> RepositoryResult<Vec<Incident>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            clauses.push(
                "(instr(lower(title), lower(?)) > 0 \
                 OR instr(lower(description), lower(?)) > 0 \
                 OR instr(lower(location), lower(?)) > 0)",
            );
            args.extend(std::iter::repeat(text.to_string()).take(3));
        }
        if let Some(event_type) = &query.event_type {
            clauses.push("event_type = ?");
            args.push(event_type.clone());
        }
        if let Some(severity) = query.severity {
            clauses.push("severity = ?");
            args.push(severity.as_str().to_string());
        }
        if let Some(status) = query.status {
            clauses.push("status = ?");
            args.push(status.as_str().to_string());
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let incidents = stmt
            .query_map(params_from_iter(args.iter()), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(incidents)
    }

    /// 各状态事件数
    pub fn count_by_status(&self, status: IncidentStatus) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM incident WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn not_found(incident_id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Incident".to_string(),
        id: incident_id.to_string(),
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_ts(idx: usize, raw: &str) -> SqliteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_row(row: &Row) -> SqliteResult<Incident> {
    let severity_str: String = row.get(3)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    let casualties: i64 = row.get(7)?;
    let affected_population: i64 = row.get(8)?;
    let infrastructure_damage: i64 = row.get(9)?;

    Ok(Incident {
        incident_id: row.get(0)?,
        title: row.get(1)?,
        event_type: row.get(2)?,
        severity: SeverityLevel::from_str(&severity_str).map_err(|e| conversion_error(3, e))?,
        location: row.get(4)?,
        description: row.get(5)?,
        status: IncidentStatus::from_str(&status_str).map_err(|e| conversion_error(6, e))?,
        casualties: casualties.max(0) as u64,
        affected_population: affected_population.max(0) as u64,
        infrastructure_damage: infrastructure_damage.clamp(0, 3) as u8,
        created_at: parse_ts(10, &created_at_str)?,
        updated_at: parse_ts(11, &updated_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> IncidentRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        IncidentRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn make_incident(id: &str, title: &str, severity: SeverityLevel) -> Incident {
        let now = Utc::now().naive_utc();
        Incident {
            incident_id: id.to_string(),
            title: title.to_string(),
            event_type: "Flood".to_string(),
            severity,
            location: "Riverside".to_string(),
            description: "Water rising near the bridge".to_string(),
            status: IncidentStatus::Active,
            casualties: 3,
            affected_population: 1200,
            infrastructure_damage: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let repo = setup_repo();
        repo.insert(&make_incident("inc-1", "Bridge flood", SeverityLevel::High)).unwrap();

        let found = repo.find_by_id("inc-1").unwrap().unwrap();
        assert_eq!(found.title, "Bridge flood");
        assert_eq!(found.severity, SeverityLevel::High);
        assert_eq!(found.status, IncidentStatus::Active);
        assert_eq!(found.infrastructure_damage, 2);

        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_unique_violation() {
        let repo = setup_repo();
        let incident = make_incident("inc-1", "A", SeverityLevel::Low);
        repo.insert(&incident).unwrap();

        let err = repo.insert(&incident).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_update_status_and_missing() {
        let repo = setup_repo();
        repo.insert(&make_incident("inc-1", "A", SeverityLevel::Low)).unwrap();

        repo.update_status("inc-1", IncidentStatus::Resolved).unwrap();
        assert_eq!(
            repo.find_by_id("inc-1").unwrap().unwrap().status,
            IncidentStatus::Resolved
        );
        assert_eq!(repo.count_by_status(IncidentStatus::Resolved).unwrap(), 1);

        let err = repo.update_status("nope", IncidentStatus::Closed).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_delete() {
        let repo = setup_repo();
        repo.insert(&make_incident("inc-1", "A", SeverityLevel::Low)).unwrap();
        assert!(repo.delete("inc-1").unwrap());
        assert!(!repo.delete("inc-1").unwrap());
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_search_filters() {
        let repo = setup_repo();
        repo.insert(&make_incident("inc-1", "Bridge flood", SeverityLevel::High)).unwrap();

        let mut fire = make_incident("inc-2", "Warehouse fire", SeverityLevel::Critical);
        fire.event_type = "Fire".to_string();
        fire.location = "Dock 4".to_string();
        fire.description = "Smoke visible".to_string();
        repo.insert(&fire).unwrap();

        let by_text = repo
            .search(&IncidentQuery { text: Some("DOCK".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].incident_id, "inc-2");

        let by_type = repo
            .search(&IncidentQuery { event_type: Some("Flood".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(by_type.len(), 1);

        let combined = repo
            .search(&IncidentQuery {
                text: Some("fire".to_string()),
                severity: Some(SeverityLevel::High),
                ..Default::default()
            })
            .unwrap();
        assert!(combined.is_empty());

        assert_eq!(repo.list_all().unwrap().len(), 2);
    }
}
