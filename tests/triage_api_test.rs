// ==========================================
// TriageApi 集成测试
// ==========================================
// 目标: 预测超时回退、批量预测、系统自检、调配审计
// ==========================================


#[cfg(test)]
mod triage_api_test {
    use crate::test_helpers::{build_env, create_test_db, fallback_env, full_env, TEST_ACTOR};
    use disaster_triage::api::{ApiError, TriageApi, MODE_FALLBACK, MODE_FULL};
    use disaster_triage::config::TriageConfig;
    use disaster_triage::db::open_sqlite_connection;
    use disaster_triage::repository::ActionLogRepository;
    use disaster_triage::{
        IncidentFeatures, PredictionMode, RecommendedResource, ResourceAllocator, ResourceCatalog,
        ResourceRecommender, ResourceRequest, SeverityClassifier, SeverityLevel, SeverityPrediction,
        SeverityPredictor,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// 模拟慢模型
    struct SlowClassifier {
        delay: Duration,
    }

    impl SeverityClassifier for SlowClassifier {
        fn predict(&self, _features: &IncidentFeatures) -> SeverityPrediction {
            std::thread::sleep(self.delay);
            SeverityPrediction {
                severity: SeverityLevel::Critical,
                confidence: 0.9,
                mode: PredictionMode::Model,
            }
        }

        fn is_model_loaded(&self) -> bool {
            true
        }
    }

    fn custom_api(
        predictor: SeverityPredictor,
        catalog: ResourceCatalog,
        config: TriageConfig,
    ) -> (tempfile::NamedTempFile, TriageApi) {
        let (db_file, db_path) = create_test_db().unwrap();
        let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));
        let catalog = Arc::new(catalog);

        let api = TriageApi::new(
            Arc::new(predictor),
            Arc::new(ResourceRecommender::new(catalog.clone())),
            Arc::new(ResourceAllocator::from_catalog(&catalog)),
            Arc::new(ActionLogRepository::new(conn)),
            config,
        );
        (db_file, api)
    }

    fn slow_api(delay: Duration, timeout_ms: u64) -> (tempfile::NamedTempFile, TriageApi) {
        custom_api(
            SeverityPredictor::from_classifier(Box::new(SlowClassifier { delay })),
            ResourceCatalog::empty(),
            TriageConfig {
                prediction_timeout_ms: timeout_ms,
                ..TriageConfig::default()
            },
        )
    }

    fn flood(casualties: i64) -> IncidentFeatures {
        IncidentFeatures::new("river overflow", casualties, 0, 0, "Flood")
    }

    #[tokio::test]
    async fn test_predict_with_timeout_falls_back() {
        println!("\n=== 测试：预测超时回退规则 ===");

        let (_db, api) = slow_api(Duration::from_millis(300), 20);

        let p = api
            .predict_with_timeout(flood(40), Duration::from_millis(20))
            .await;
        assert_eq!(p.mode, PredictionMode::RuleBased);
        assert_eq!(p.severity, SeverityLevel::Medium);
        assert_eq!(p.confidence, 0.5);

        let p = api
            .predict_with_timeout(flood(40), Duration::from_secs(5))
            .await;
        assert_eq!(p.mode, PredictionMode::Model);
        assert_eq!(p.severity, SeverityLevel::Critical);

        println!("✓ 超时回退 / 未超时返回模型结果");
    }

    #[tokio::test]
    async fn test_predict_batch_preserves_order() {
        println!("\n=== 测试：批量预测保持输入顺序 ===");

        let env = fallback_env().unwrap();
        let api = &env.state.triage_api;

        let batch = vec![flood(0), flood(20), flood(100), flood(60)];
        let results = api.predict_batch(batch).await;

        let levels: Vec<SeverityLevel> = results.iter().map(|p| p.severity).collect();
        assert_eq!(
            levels,
            vec![
                SeverityLevel::Low,
                SeverityLevel::Medium,
                SeverityLevel::High,
                SeverityLevel::High,
            ]
        );
        assert!(api.predict_batch(Vec::new()).await.is_empty());

        println!("✓ 批量结果: {:?}", levels);
    }

    #[tokio::test]
    async fn test_predict_batch_times_out_per_item() {
        println!("\n=== 测试：批量预测逐条超时 ===");

        let (_db, api) = slow_api(Duration::from_millis(300), 20);
        let results = api.predict_batch(vec![flood(0), flood(100)]).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|p| p.mode == PredictionMode::RuleBased));
        assert_eq!(results[1].severity, SeverityLevel::High);

        println!("✓ 全部回退规则");
    }

    #[test]
    fn test_system_status_modes() {
        println!("\n=== 测试：系统自检 ===");

        let env = full_env().unwrap();
        let status = env.state.triage_api.system_status();
        assert!(status.model_loaded);
        assert!(status.resource_map_loaded);
        assert!(status.model_file_found && status.catalog_file_found);
        assert_eq!(status.mode, MODE_FULL);

        let env = fallback_env().unwrap();
        let status = env.state.triage_api.system_status();
        assert!(!status.model_loaded);
        assert!(!status.model_file_found);
        assert!(status.resource_map_loaded);
        assert_eq!(status.mode, MODE_FALLBACK);

        let env = build_env(false, true, TriageConfig::default()).unwrap();
        let status = env.state.triage_api.system_status();
        assert!(status.model_loaded);
        assert!(!status.resource_map_loaded);
        assert_eq!(status.mode, MODE_FALLBACK);
        assert!(env.state.triage_api.get_supported_event_types().is_empty());

        println!("✓ 自检结果正确");
    }

    #[test]
    fn test_predict_and_recommend_full_mode() {
        println!("\n=== 测试：预测 + 推荐 ===");

        let env = full_env().unwrap();
        let api = &env.state.triage_api;

        let features = IncidentFeatures::new("building collapse", 30, 20_000, 3, "Earthquake");
        let result = api.predict_and_recommend(&features);
        assert_eq!(result.severity, SeverityLevel::Critical);
        assert_eq!(result.event_type, "Earthquake");

        let names: Vec<&str> = result
            .recommended_resources
            .iter()
            .map(|r| r.resource_name.as_str())
            .collect();
        assert_eq!(names, vec!["Search Dog Team", "Medical Team", "Rescue Boat"]);

        // 词表外类型: 只有严重度列表
        let unknown = IncidentFeatures::new("minor flood", 0, 0, 0, "Meteor Strike");
        let result = api.predict_and_recommend(&unknown);
        assert_eq!(result.event_type, "Unknown");
        assert!(result
            .recommended_resources
            .iter()
            .all(|r| r.resource_name == "First Aid Kit" || r.resource_name == "Medical Team"));

        assert_eq!(
            api.get_supported_event_types(),
            vec!["Earthquake".to_string(), "Flood".to_string()]
        );
        assert_eq!(
            api.get_supported_severity_levels(),
            vec!["Critical".to_string(), "Low".to_string()]
        );

        println!("✓ 推荐: {:?}", names);
    }

    #[test]
    fn test_catalog_key_outside_vocabulary() {
        println!("\n=== 测试：词表外的目录事件类型 ===");

        let catalog = ResourceCatalog::from_json_str(
            r#"{
                "event_type_map": {
                    "Meteor Strike": [{"resource": "Crater Team", "priority": 1, "quantity": 2}],
                    "Unknown": [{"resource": "Recon Drone", "priority": 2, "quantity": 1}]
                },
                "severity_map": {}
            }"#,
        )
        .unwrap();
        let (_db, api) = custom_api(SeverityPredictor::rule_based(), catalog, TriageConfig::default());

        assert!(api
            .get_supported_event_types()
            .contains(&"Meteor Strike".to_string()));

        // 按原文查询可达
        let direct = api.recommend_resources("Meteor Strike", SeverityLevel::Low);
        assert_eq!(direct[0].resource_name, "Crater Team");

        // 预测入口使用归一化类型
        let features = IncidentFeatures::new("impact", 0, 0, 0, "Meteor Strike");
        let result = api.predict_and_recommend(&features);
        assert_eq!(result.event_type, "Unknown");
        let names: Vec<&str> = result
            .recommended_resources
            .iter()
            .map(|r| r.resource_name.as_str())
            .collect();
        assert_eq!(names, vec!["Recon Drone"]);

        println!("✓ 归一化查询: {:?}", names);
    }

    #[test]
    fn test_recommend_scaled_by_severity() {
        println!("\n=== 测试：按严重度放大推荐数量 ===");

        let env = build_env(
            true,
            false,
            TriageConfig {
                scale_quantity_by_severity: true,
                ..TriageConfig::default()
            },
        )
        .unwrap();
        let api = &env.state.triage_api;

        let scaled = api.recommend_resources("Flood", SeverityLevel::Critical);
        let boat = scaled.iter().find(|r| r.resource_name == "Rescue Boat").unwrap();
        assert_eq!(boat.quantity, 4);

        let low = api.recommend_resources("Flood", SeverityLevel::Low);
        let boat = low.iter().find(|r| r.resource_name == "Rescue Boat").unwrap();
        assert_eq!(boat.quantity, 1);

        // 未知标签只贡献事件类型列表
        let by_label = api.recommend_resources_by_label("Flood", "Catastrophic");
        assert_eq!(by_label.len(), 2);

        println!("✓ 数量放大正确");
    }

    #[test]
    fn test_allocate_writes_audit_log() {
        println!("\n=== 测试：调配与释放写入操作日志 ===");

        let env = full_env().unwrap();
        let api = &env.state.triage_api;

        let granted = api
            .allocate(
                "INC-A",
                &[
                    ResourceRequest::new("Rescue Boat", 2),
                    ResourceRequest::new("Rescue Boat", 1),
                ],
                TEST_ACTOR,
            )
            .unwrap();
        assert_eq!(granted.len(), 1);

        let released = api.release("INC-A", TEST_ACTOR).unwrap().unwrap();
        assert_eq!(released.total_units(), 2);
        assert!(api.release("INC-A", TEST_ACTOR).unwrap().is_none());

        let logs = env.state.action_log_repo.find_by_incident("INC-A").unwrap();
        let types: Vec<&str> = logs.iter().map(|l| l.action_type.as_str()).collect();
        assert_eq!(types, vec!["RELEASE", "ALLOCATE"]);

        let payload = logs[1].payload_json.as_ref().unwrap();
        assert_eq!(payload["shortfall"], 1);
        assert_eq!(logs[1].actor, TEST_ACTOR);

        println!("✓ 日志: {:?}", types);
    }

    #[test]
    fn test_allocation_record_keeps_recommended_entries() {
        println!("\n=== 测试：调配记录保留推荐条目 ===");

        let env = full_env().unwrap();
        let api = &env.state.triage_api;

        let recommended = api.recommend_resources("Flood", SeverityLevel::Critical);
        let granted = api
            .allocate_recommended("INC-R", &recommended, TEST_ACTOR)
            .unwrap();
        assert_eq!(granted, recommended);
        assert_eq!(api.allocation("INC-R").unwrap().resources, recommended);

        let released = api.release("INC-R", TEST_ACTOR).unwrap().unwrap();
        assert_eq!(released.resources[0].purpose, "水上救援");

        let logs = env.state.action_log_repo.find_by_incident("INC-R").unwrap();
        assert_eq!(logs[0].action_type, "RELEASE");
        let payload = logs[0].payload_json.as_ref().unwrap();
        assert_eq!(payload["resources"][0]["resource"], "Rescue Boat");
        assert_eq!(payload["resources"][0]["priority"], 1);
        assert_eq!(payload["resources"][0]["purpose"], "水上救援");

        // 数量为 0 的推荐条目不使整次调配失败
        let zero = vec![RecommendedResource {
            resource_name: "Sandbags".to_string(),
            priority: 3,
            purpose: "筑堤".to_string(),
            quantity: 0,
        }];
        assert!(api.allocate_recommended("INC-Z", &zero, TEST_ACTOR).is_ok());

        println!("✓ 记录条目: {}", recommended.len());
    }

    #[test]
    fn test_allocate_rejects_invalid_input() {
        println!("\n=== 测试：调配参数校验 ===");

        let env = full_env().unwrap();
        let api = &env.state.triage_api;

        assert!(matches!(
            api.allocate("", &[ResourceRequest::new("Rescue Boat", 1)], TEST_ACTOR),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.allocate("INC-B", &[ResourceRequest::new("Rescue Boat", 0)], TEST_ACTOR),
            Err(ApiError::InvalidInput(_))
        ));
        assert_eq!(api.available_resources().get("Rescue Boat"), Some(&2));

        println!("✓ 非法请求被拒绝且不占用库存");
    }
}
