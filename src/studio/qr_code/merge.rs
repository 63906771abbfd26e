//! 本地模式下的列表合并规则
//!
//! 每个函数都返回一份新的完整列表，由调用方整体写回缓存。

use crate::studio::qr_code::models::{QrCodeRecord, RecordId};

/// 新记录放在最前面（最新的在前）
pub fn prepend(records: &[QrCodeRecord], record: QrCodeRecord) -> Vec<QrCodeRecord> {
    let mut next = Vec::with_capacity(records.len() + 1);
    next.push(record);
    next.extend(records.iter().cloned());
    next
}

/// 按 ID 整体替换，保留原记录的 ID、创建时间、扫描次数等不可编辑字段
pub fn replace(records: &[QrCodeRecord], edited: &QrCodeRecord) -> Vec<QrCodeRecord> {
    records
        .iter()
        .map(|r| {
            if r.id == edited.id {
                QrCodeRecord {
                    id: r.id.clone(),
                    short_code: r.short_code.clone(),
                    owner_id: r.owner_id.clone(),
                    scan_count: r.scan_count,
                    active: r.active,
                    created_at: r.created_at,
                    ..edited.clone()
                }
            } else {
                r.clone()
            }
        })
        .collect()
}

/// 删除第一条 ID 匹配的记录，不存在时原样返回
pub fn remove(records: &[QrCodeRecord], id: &RecordId) -> Vec<QrCodeRecord> {
    let mut next = records.to_vec();
    if let Some(pos) = next.iter().position(|r| &r.id == id) {
        next.remove(pos);
    }
    next
}

/// 覆盖扫描次数
pub fn set_scan_count(records: &[QrCodeRecord], id: &RecordId, scans: u64) -> Vec<QrCodeRecord> {
    records
        .iter()
        .map(|r| {
            if &r.id == id {
                QrCodeRecord {
                    scan_count: scans,
                    ..r.clone()
                }
            } else {
                r.clone()
            }
        })
        .collect()
}

/// 生成不与现有记录冲突的本地 ID（同一毫秒内连续创建时顺延）
pub fn unique_local_id(records: &[QrCodeRecord], candidate: i64) -> RecordId {
    let mut id = candidate;
    while records.iter().any(|r| r.id == RecordId::Number(id)) {
        id += 1;
    }
    RecordId::Number(id)
}
