// ==========================================
// 灾情分诊系统 - 命令行主入口
// ==========================================
// 用法:
//   disaster-triage '<incident json>'   分诊一条事件并输出 JSON
//   disaster-triage -                   从标准输入读取事件 JSON
//   disaster-triage --status            输出系统自检结果
// 数据库: DISASTER_TRIAGE_DB_PATH 或用户本地数据目录
// ==========================================

use std::io::Read;

use anyhow::{bail, Context};
use disaster_triage::app::{get_default_db_path, AppState};
use disaster_triage::domain::IncidentFeatures;
use disaster_triage::logging;

const USAGE: &str = "usage: disaster-triage <incident-json | - | --status>";

fn main() -> anyhow::Result<()> {
    logging::init();

    let arg = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => bail!(USAGE),
    };

    let db_path = get_default_db_path();
    tracing::info!("{} v{}，数据库: {}", disaster_triage::APP_NAME, disaster_triage::VERSION, db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    if arg == "--status" {
        let status = state.triage_api.system_status();
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let raw = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("读取标准输入失败")?;
        buf
    } else {
        arg
    };

    let record: serde_json::Value = serde_json::from_str(&raw).context("事件 JSON 解析失败")?;
    if !record.is_object() {
        bail!("事件必须是 JSON 对象\n{}", USAGE);
    }

    let features = IncidentFeatures::from_record(&record);
    let result = state.triage_api.predict_and_recommend(&features);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
