//! 用户状态

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum UserStatus {
    #[default]
    Active,
    /// 被管理员锁定，禁止登录
    Locked,
}
