// ==========================================
// 订阅配送管理系统 - 命令行入口
// ==========================================
// 用法:
//   subscription-ops <db_path> init
//   subscription-ops <db_path> seed
//   subscription-ops <db_path> inventory [from] [to] [center]
//   subscription-ops <db_path> quote <subscriber_id> <start> <end>
//   subscription-ops <db_path> dashboard [today]
//
// db_path 传 "-" 时使用默认路径; 日期格式 YYYY-MM-DD, "-" 表示缺省
// 结果以 JSON 输出到 stdout, 日志输出到 stderr
// ==========================================

use chrono::NaiveDate;
use serde_json::json;
use subscription_ops::app::{get_default_db_path, AppState};
use subscription_ops::db::{open_sqlite_connection, read_schema_version};
use subscription_ops::engine::calendar::parse_day;
use subscription_ops::logging;

const USAGE: &str = "用法: subscription-ops <db_path|-> <init | seed | inventory [from] [to] [center] | quote <subscriber_id> <start> <end> | dashboard [today]>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (db_arg, command, rest) = match args.as_slice() {
        [db, cmd, rest @ ..] => (db.as_str(), cmd.as_str(), rest),
        _ => return Err(USAGE.into()),
    };

    let db_path = if db_arg == "-" {
        get_default_db_path()
    } else {
        db_arg.to_string()
    };

    tracing::info!("{} v{}", subscription_ops::APP_NAME, subscription_ops::VERSION);
    let state = AppState::new(db_path)?;

    let output = match command {
        "init" => {
            let snapshot = state.config_manager.get_config_snapshot()?;
            let schema_version = read_schema_version(&open_sqlite_connection(state.get_db_path())?)?;
            json!({
                "db_path": state.get_db_path(),
                "schema_version": schema_version,
                "config": serde_json::from_str::<serde_json::Value>(&snapshot)?,
            })
        }
        "seed" => serde_json::to_value(state.city_center_api.seed_defaults()?)?,
        "inventory" => {
            let from = optional_day(rest.first())?;
            let to = optional_day(rest.get(1))?;
            let center = rest.get(2).map(String::as_str).filter(|c| *c != "-");
            let today = chrono::Local::now().date_naive();
            serde_json::to_value(state.inventory_api.load_overview(center, from, to, today)?)?
        }
        "quote" => {
            let [subscriber_id, start, end] = rest else {
                return Err(USAGE.into());
            };
            let start = required_day(start)?;
            let end = required_day(end)?;
            serde_json::to_value(state.billing_api.quote_cycle(subscriber_id, start, end)?)?
        }
        "dashboard" => {
            // created_at 以 UTC 落库, 本月按 UTC 日期划分
            let today = optional_day(rest.first())?.unwrap_or_else(|| chrono::Utc::now().date_naive());
            serde_json::to_value(state.dashboard_api.get_stats(today)?)?
        }
        other => return Err(format!("未知命令: {}\n{}", other, USAGE).into()),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn required_day(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).ok_or_else(|| format!("日期格式错误, 期望 YYYY-MM-DD: {}", raw))
}

fn optional_day(raw: Option<&String>) -> Result<Option<NaiveDate>, String> {
    match raw.map(String::as_str) {
        None | Some("-") => Ok(None),
        Some(s) => required_day(s).map(Some),
    }
}
