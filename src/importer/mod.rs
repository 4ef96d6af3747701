// ==========================================
// 订阅配送管理系统 - 导入层
// ==========================================
// 职责: 外部文件 → 领域对象 (只解析与校验,不落库)
// ==========================================

pub mod allocation_importer;
pub mod error;

pub use allocation_importer::AllocationCsvParser;
pub use error::ImportError;
