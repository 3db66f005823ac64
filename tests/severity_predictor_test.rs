// ==========================================
// 严重度预测集成测试
// ==========================================
// 目标: 验证模型产物加载、规则回退、损坏产物降级
// ==========================================


#[cfg(test)]
mod severity_predictor_test {
    use crate::test_helpers;
    use disaster_triage::engine::{RuleBasedClassifier, SeverityModel, FALLBACK_CONFIDENCE};
    use disaster_triage::{IncidentFeatures, PredictionMode, SeverityLevel, SeverityPredictor};
    use std::sync::Arc;

    fn features(casualties: i64, affected: i64, damage: i64) -> IncidentFeatures {
        IncidentFeatures::new("street flooding", casualties, affected, damage, "Flood")
    }

    #[test]
    fn test_rule_based_properties() {
        println!("\n=== 测试：规则预测的分级与置信度 ===");

        let predictor = SeverityPredictor::rule_based();
        assert!(!predictor.is_model_loaded());

        let cases = [
            (features(0, 0, 0), SeverityLevel::Low),
            (features(20, 0, 0), SeverityLevel::Medium),
            (features(0, 0, 3), SeverityLevel::High),
            (features(40, 10_000, 3), SeverityLevel::Critical),
            (features(100, 50_000, 3), SeverityLevel::Critical),
        ];
        for (input, expected) in cases.iter() {
            let p = predictor.predict(input);
            assert_eq!(p.severity, *expected, "输入: {:?}", input);
            assert_eq!(p.confidence, FALLBACK_CONFIDENCE);
            assert_eq!(p.mode, PredictionMode::RuleBased);
        }

        println!("✓ 规则分级正确");
    }

    #[test]
    fn test_rule_based_is_monotonic() {
        println!("\n=== 测试：规则预测随伤亡单调不降 ===");

        let mut previous = SeverityLevel::Low;
        for casualties in (0..=200).step_by(5) {
            let level = RuleBasedClassifier::classify(RuleBasedClassifier::score(&features(
                casualties, 5_000, 1,
            )));
            assert!(level >= previous, "伤亡 {} 时等级下降", casualties);
            previous = level;
        }

        println!("✓ 单调性成立");
    }

    #[test]
    fn test_model_artifact_loaded() {
        println!("\n=== 测试：从产物文件加载模型 ===");

        let model_file = test_helpers::write_model_fixture().unwrap();
        let predictor = SeverityPredictor::load(model_file.path());
        assert!(predictor.is_model_loaded());
        assert_eq!(predictor.mode(), PredictionMode::Model);

        let quiet = IncidentFeatures::new("minor flood", 0, 0, 0, "Flood");
        let p = predictor.predict(&quiet);
        assert_eq!(p.severity, SeverityLevel::Low);
        assert_eq!(p.mode, PredictionMode::Model);
        assert!(p.confidence > 0.5 && p.confidence <= 1.0);

        let severe = IncidentFeatures::new("building collapse", 30, 20_000, 3, "Earthquake");
        let p = predictor.predict(&severe);
        assert_eq!(p.severity, SeverityLevel::Critical);

        println!("✓ 模型预测: {:?}", p);
    }

    #[test]
    fn test_corrupt_artifact_falls_back() {
        println!("\n=== 测试：损坏或结构不符的产物降级为规则 ===");

        let garbage = test_helpers::write_temp_file(".json", "{ not a model").unwrap();
        let predictor = SeverityPredictor::load(garbage.path());
        assert!(!predictor.is_model_loaded());

        let mut artifact = test_helpers::model_fixture_json();
        artifact["format_version"] = serde_json::json!(99);
        let wrong_version = test_helpers::write_temp_file(".json", &artifact.to_string()).unwrap();
        let predictor = SeverityPredictor::load(wrong_version.path());
        assert!(!predictor.is_model_loaded());

        let p = predictor.predict(&features(40, 20_000, 0));
        assert_eq!(p.severity, SeverityLevel::High);
        assert_eq!(p.mode, PredictionMode::RuleBased);

        println!("✓ 降级后按规则预测");
    }

    #[test]
    fn test_predictor_shared_across_threads() {
        println!("\n=== 测试：多线程并发预测结果一致 ===");

        let model_file = test_helpers::write_model_fixture().unwrap();
        let model = SeverityModel::load(model_file.path()).unwrap();
        let predictor = Arc::new(SeverityPredictor::with_model(model));

        let expected = predictor.predict(&features(10, 1_000, 1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let predictor = Arc::clone(&predictor);
                std::thread::spawn(move || predictor.predict(&features(10, 1_000, 1)))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }

        println!("✓ 8 个线程结果一致");
    }
}
