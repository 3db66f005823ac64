use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = ActionLog::new(
        ActionType::Allocate,
        Some("inc-1"),
        "dispatcher",
        Some(json!({"granted": [{"resource_name": "Rescue Boats", "quantity": 2}]})),
    )
    .with_detail("partial grant");
    let id = repo.insert(&log).unwrap();

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.action_type, "ALLOCATE");
    assert_eq!(found.incident_id.as_deref(), Some("inc-1"));
    assert_eq!(found.detail.as_deref(), Some("partial grant"));
    assert_eq!(found.payload_json, log.payload_json);
    assert_eq!(found.action_ts.and_utc().timestamp(), log.action_ts.and_utc().timestamp());
}

#[test]
fn test_find_by_incident_newest_first() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.insert(&ActionLog::new(ActionType::Triage, Some("inc-1"), "system", None)).unwrap();
    repo.insert(&ActionLog::new(ActionType::Allocate, Some("inc-1"), "system", None)).unwrap();
    repo.insert(&ActionLog::new(ActionType::Release, Some("inc-2"), "system", None)).unwrap();
    repo.insert(&ActionLog::new(ActionType::Triage, None, "batch", None)).unwrap();

    let logs = repo.find_by_incident("inc-1").unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_type, "ALLOCATE");
    assert_eq!(logs[1].action_type, "TRIAGE");

    assert_eq!(repo.find_by_action_type("TRIAGE", 10).unwrap().len(), 2);
    assert_eq!(repo.find_recent(3).unwrap().len(), 3);
}
