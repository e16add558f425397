// ==========================================
// ERP 导入引擎 - 导入作业会话
// ==========================================
// 职责: 作业标识 + 协作式取消句柄
// 取消只在批次之间生效，克隆的句柄共享同一取消标记
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ImportSession {
    job_id: String,
    cancelled: Arc<AtomicBool>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self::with_job_id(Uuid::new_v4().to_string())
    }

    pub fn with_job_id(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// 请求取消（当前批次写完后停止）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
