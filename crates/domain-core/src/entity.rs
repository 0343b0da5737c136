//! 实体基础 trait

use handyhub_common::{AuditInfo, UserId};
use uuid::Uuid;

/// 基于 UUID 的强类型 ID
pub trait Identifier: Clone + Send + Sync + 'static {
    fn as_uuid(&self) -> Uuid;
}

impl Identifier for UserId {
    fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// 实体 trait
pub trait Entity {
    type Id: Identifier;

    fn id(&self) -> &Self::Id;
}

/// 聚合根 trait
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;

    /// 当前版本号（乐观并发控制）
    fn version(&self) -> u64 {
        self.audit_info().version
    }
}
