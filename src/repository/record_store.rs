// ==========================================
// ERP 导入引擎 - 目标表存储 Repository Trait
// ==========================================
// 职责: 导入管道对持久化存储的唯一依赖面
// 红线: Repository 不含业务规则，只做存在性查询与批量写入
// ==========================================

use crate::domain::canonical::CanonicalRecord;
use crate::domain::types::Destination;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore（rusqlite），测试中的内存实现
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 批量存在性查询
    ///
    /// # 参数
    /// - destination: 目标表
    /// - key_field: 键字段名（必须是该表的标准字段）
    /// - values: 待查询的键值
    ///
    /// # 返回
    /// - Ok(HashSet<String>): 已存在的键值（values 的子集）
    /// - Err: 连接/锁错误为不可达，其余为查询错误
    async fn exists_by_key(
        &self,
        destination: Destination,
        key_field: &str,
        values: &[String],
    ) -> RepositoryResult<HashSet<String>>;

    /// 批量插入（单次调用全部成功或全部回滚）
    ///
    /// # 返回
    /// - Ok(usize): 插入行数
    /// - Err: 整个调用回滚
    async fn insert_many(
        &self,
        destination: Destination,
        records: Vec<CanonicalRecord>,
    ) -> RepositoryResult<usize>;
}
