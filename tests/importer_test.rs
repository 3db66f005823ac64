// ==========================================
// 标注数据集导入与评估测试
// ==========================================
// 目标: CSV 文件 -> LabeledDataset -> EvaluationReport
// ==========================================


#[cfg(test)]
mod importer_test {
    use crate::test_helpers;
    use disaster_triage::engine::evaluate;
    use disaster_triage::importer::{ImportError, LabeledDatasetImporter};
    use disaster_triage::{PredictionMode, SeverityLevel, SeverityPredictor};

    const DATASET: &str = "\
description,casualties,affected_population,infrastructure_damage,event_type,severity
minor street flooding,0,100,0,Flood,Low
bridge damaged,20,0,1,Flood,High
\"collapse, many trapped\",100,50000,3,Earthquake,Critical
missing label row,5,10,1,Flood,
bad number,abc,10,1,Flood,Low
unknown label,1,1,1,Flood,Severe
decimal counts,40.0,10000.0,0,Wildfire,Medium
";

    #[test]
    fn test_import_csv_file() {
        println!("\n=== 测试：导入标注 CSV ===");

        let file = test_helpers::write_temp_file(".csv", DATASET).unwrap();
        let dataset = LabeledDatasetImporter::import_file(file.path()).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.skipped.len(), 3);

        let skipped_lines: Vec<u64> = dataset.skipped.iter().map(|s| s.line).collect();
        assert_eq!(skipped_lines, vec![5, 6, 7]);

        // 引号内逗号不拆分
        assert_eq!(dataset.rows[2].features.description(), "collapse, many trapped");
        assert_eq!(dataset.rows[2].label, SeverityLevel::Critical);
        assert_eq!(dataset.rows[3].features.casualties(), 40);

        println!("✓ 导入 {} 行，跳过 {} 行", dataset.len(), dataset.skipped.len());
    }

    #[test]
    fn test_import_errors() {
        println!("\n=== 测试：导入失败场景 ===");

        let missing = std::path::Path::new("/nonexistent/dataset.csv");
        assert!(matches!(
            LabeledDatasetImporter::import_file(missing),
            Err(ImportError::FileNotFound(_))
        ));

        let xlsx = test_helpers::write_temp_file(".xlsx", DATASET).unwrap();
        assert!(matches!(
            LabeledDatasetImporter::import_file(xlsx.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));

        let no_label = test_helpers::write_temp_file(
            ".csv",
            "description,casualties,affected_population,infrastructure_damage,event_type\nx,1,1,1,Flood\n",
        )
        .unwrap();
        match LabeledDatasetImporter::import_file(no_label.path()) {
            Err(ImportError::MissingColumns(cols)) => assert_eq!(cols, vec!["severity"]),
            other => panic!("预期 MissingColumns, 实际 {:?}", other.map(|d| d.len())),
        }

        println!("✓ 错误类型正确");
    }

    #[test]
    fn test_evaluate_rule_predictor() {
        println!("\n=== 测试：规则预测评估 ===");

        let file = test_helpers::write_temp_file(".csv", DATASET).unwrap();
        let dataset = LabeledDatasetImporter::import_file(file.path()).unwrap();
        let report = evaluate(&SeverityPredictor::rule_based(), &dataset);

        // Low ✓ / High ✗(Medium) / Critical ✓ / Medium ✗(High)
        assert_eq!(report.mode, PredictionMode::RuleBased);
        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 2);
        assert!((report.accuracy - 0.5).abs() < 1e-9);
        assert!((report.mean_confidence - 0.5).abs() < 1e-9);
        assert_eq!(report.confusion.get("High->Medium"), Some(&1));
        assert_eq!(report.confusion.get("Medium->High"), Some(&1));
        assert_eq!(report.per_label[&SeverityLevel::Critical].correct, 1);

        println!("✓ accuracy = {}", report.accuracy);
    }
}
