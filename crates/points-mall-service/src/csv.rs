//! CSV 行编解码
//!
//! 读取侧是容错解析器：统一处理 CRLF / LF / CR 换行，支持 RFC4180 风格的
//! 双引号字段（内嵌逗号、`""` 转义），并按内容嗅探表头行。写出侧走 csv crate
//! 的严格序列化，任何含逗号/引号/换行的字段自动加引号。
//!
//! 解析是纯函数（字节 -> 行），不做字段语义校验；邮箱、积分等语义由
//! 批量导入在行级处理，方便单独测试。

use serde::Serialize;

use crate::error::{MallError, Result};
use crate::models::{LedgerExportRow, OrderExportRow};

/// 解析出的一行
///
/// `line_no` 为非空行中的序号（1 起），表头占第 1 行，
/// 因此有表头时首条数据行编号为 2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line_no: usize,
    pub fields: Vec<String>,
}

/// 解析 CSV 字节流为行列表
///
/// 空行（含纯空白行）跳过且不占编号；非 UTF-8 字节按替换字符容错处理。
pub fn parse(bytes: &[u8]) -> Vec<CsvRow> {
    let text = String::from_utf8_lossy(bytes);
    // Excel 等工具导出的文件可能带 BOM，影响表头嗅探
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    text.split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| CsvRow {
            line_no: idx + 1,
            fields: parse_fields(line),
        })
        .collect()
}

/// 判断某行是否为表头
///
/// 首字段不区分大小写等于 "email"，或任一字段包含 "email"，即视为表头
pub fn is_header_row(row: &CsvRow) -> bool {
    let Some(first) = row.fields.first() else {
        return false;
    };
    if first.trim().eq_ignore_ascii_case("email") {
        return true;
    }
    row.fields
        .iter()
        .any(|f| f.to_ascii_lowercase().contains("email"))
}

/// 去掉表头行（若存在），保留各行原始编号
pub fn strip_header(rows: Vec<CsvRow>) -> Vec<CsvRow> {
    match rows.first() {
        Some(first) if is_header_row(first) => rows.into_iter().skip(1).collect(),
        _ => rows,
    }
}

/// 单行字段切分状态机
///
/// 引号内：逗号按字面收集，`""` 还原为一个引号；引号外遇逗号切分。
/// 对引号出现在字段中间等不规范写法宽容处理，不报错。
fn parse_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    fields.push(current);
    fields
}

/// 积分流水导出（严格 RFC4180，首行为列头）
pub fn write_ledger_rows(rows: &[LedgerExportRow]) -> Result<Vec<u8>> {
    write_rows(rows)
}

/// 订单明细导出（严格 RFC4180，首行为列头）
pub fn write_order_rows(rows: &[OrderExportRow]) -> Result<Vec<u8>> {
    write_rows(rows)
}

fn write_rows<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| MallError::Internal(format!("CSV 序列化失败: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| MallError::Internal(format!("CSV 写出失败: {}", e)))
}
