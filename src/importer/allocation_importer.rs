// ==========================================
// 订阅配送管理系统 - 库存分配 CSV 导入
// ==========================================
// 列: center, date, quantity, added_by(可选)
// 表头大小写/空白不敏感; 完全空白的行跳过
// 行号从 1 开始计数（不含表头）
// ==========================================

use crate::domain::inventory::InventoryAllocation;
use crate::engine::calendar::parse_day;
use crate::importer::error::ImportError;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// AllocationCsvParser
// ==========================================
pub struct AllocationCsvParser {
    /// 单条数量上限
    max_quantity: f64,
    /// 行内未给出 added_by 时使用
    default_added_by: String,
}

impl AllocationCsvParser {
    pub fn new(max_quantity: f64, default_added_by: &str) -> Self {
        Self {
            max_quantity,
            default_added_by: default_added_by.to_string(),
        }
    }

    /// 从文件解析
    pub fn parse_file(&self, path: &Path) -> Result<Vec<InventoryAllocation>, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }
        self.parse_reader(File::open(path)?)
    }

    /// 从任意输入流解析
    pub fn parse_reader<R: Read>(&self, input: R) -> Result<Vec<InventoryAllocation>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(input);

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.trim().to_lowercase(), idx))
            .collect();

        let col = |name: &str| -> Result<usize, ImportError> {
            columns
                .get(name)
                .copied()
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };
        let center_idx = col("center")?;
        let date_idx = col("date")?;
        let quantity_idx = col("quantity")?;
        let added_by_idx = columns.get("added_by").copied();

        let mut allocations = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row = row_idx + 1;

            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
            let required = |idx: usize, name: &str| -> Result<String, ImportError> {
                let value = field(idx);
                if value.is_empty() {
                    return Err(ImportError::FieldMissing {
                        row,
                        field: name.to_string(),
                    });
                }
                Ok(value.to_string())
            };

            let center = required(center_idx, "center")?;

            let raw_date = required(date_idx, "date")?;
            let date = parse_day(&raw_date).ok_or_else(|| ImportError::DateFormatError {
                row,
                field: "date".to_string(),
                value: raw_date.clone(),
            })?;

            let raw_quantity = required(quantity_idx, "quantity")?;
            let quantity: f64 = raw_quantity.parse().map_err(|e: std::num::ParseFloatError| {
                ImportError::TypeConversionError {
                    row,
                    field: "quantity".to_string(),
                    message: e.to_string(),
                }
            })?;
            if !quantity.is_finite() || quantity <= 0.0 || quantity > self.max_quantity {
                return Err(ImportError::ValueRangeError {
                    row,
                    field: "quantity".to_string(),
                    value: quantity,
                    min: 0.0,
                    max: self.max_quantity,
                });
            }

            let added_by = added_by_idx
                .map(field)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.default_added_by.clone());

            allocations.push(InventoryAllocation {
                id: None,
                center,
                date,
                quantity,
                added_by,
            });
        }

        if allocations.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        Ok(allocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parser() -> AllocationCsvParser {
        AllocationCsvParser::new(1000.0, "importer")
    }

    #[test]
    fn test_parse_valid_rows_and_skip_blank() {
        let csv = "Center, Date ,Quantity,added_by\nNaini,2024-03-01,100,ravi\n,,,\nCantt,2024-03-02,40.5,\n";
        let rows = parser().parse_reader(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].center, "Naini");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[0].added_by, "ravi");
        assert_eq!(rows[1].quantity, 40.5);
        assert_eq!(rows[1].added_by, "importer");
    }

    #[test]
    fn test_missing_column() {
        let csv = "center,quantity\nNaini,10\n";
        let err = parser().parse_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(c) if c == "date"));
    }

    #[test]
    fn test_row_errors_carry_row_number() {
        let bad_date = "center,date,quantity\nNaini,2024-03-01,10\nNaini,01/03/2024,10\n";
        assert!(matches!(
            parser().parse_reader(bad_date.as_bytes()).unwrap_err(),
            ImportError::DateFormatError { row: 2, .. }
        ));

        let bad_qty = "center,date,quantity\nNaini,2024-03-01,ten\n";
        assert!(matches!(
            parser().parse_reader(bad_qty.as_bytes()).unwrap_err(),
            ImportError::TypeConversionError { row: 1, .. }
        ));

        let too_big = "center,date,quantity\nNaini,2024-03-01,5000\n";
        assert!(matches!(
            parser().parse_reader(too_big.as_bytes()).unwrap_err(),
            ImportError::ValueRangeError { row: 1, .. }
        ));

        let zero = "center,date,quantity\nNaini,2024-03-01,0\n";
        assert!(matches!(
            parser().parse_reader(zero.as_bytes()).unwrap_err(),
            ImportError::ValueRangeError { .. }
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = "center,date,quantity\n";
        assert!(matches!(
            parser().parse_reader(csv.as_bytes()).unwrap_err(),
            ImportError::EmptyFile
        ));
    }

    #[test]
    fn test_parse_file_checks_path_and_extension() {
        assert!(matches!(
            parser().parse_file(Path::new("non_existent.csv")).unwrap_err(),
            ImportError::FileNotFound(_)
        ));

        let mut txt = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(txt, "center,date,quantity").unwrap();
        assert!(matches!(
            parser().parse_file(txt.path()).unwrap_err(),
            ImportError::UnsupportedFormat(_)
        ));

        let mut csv = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(csv, "center,date,quantity").unwrap();
        writeln!(csv, "Naini,2024-03-01,12").unwrap();
        let rows = parser().parse_file(csv.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
