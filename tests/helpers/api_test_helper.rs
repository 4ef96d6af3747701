// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库文件组装完整 AppState
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::error::Error;

use chrono::NaiveDate;
use subscription_ops::app::AppState;
use subscription_ops::domain::subscriber::Subscriber;
use tempfile::NamedTempFile;

/// API测试环境
pub struct ApiTestEnv {
    pub state: AppState,
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let state = AppState::new(db_path)?;
        Ok(Self {
            state,
            _temp_file: temp_file,
        })
    }

    /// 批量写入订户（经订户 API）
    pub fn insert_subscribers(&self, subscribers: &[Subscriber]) {
        for sub in subscribers {
            self.state
                .subscriber_api
                .create(sub.clone())
                .expect("写入订户失败");
        }
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("非法日期")
}
