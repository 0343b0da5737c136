//! 强类型 ID 定义

use derive_more::{Display, From};
use handyhub_domain_core::Identifier;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
        #[display("{_0}")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Identifier for $name {
            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }
    };
}

define_id!(
    /// 服务需求 ID
    ServiceRequestId
);
define_id!(
    /// 承包商申请 ID
    ContractorApplicationId
);
define_id!(
    /// 材料需求 ID
    MaterialRequestId
);
define_id!(
    /// 供应商报价 ID
    DistributorApplicationId
);
define_id!(
    /// 合作伙伴入驻申请 ID
    PartnerRequestId
);
define_id!(
    /// 通知 ID
    NotificationId
);
define_id!(
    /// 会话 ID
    ConversationId
);
define_id!(
    /// 聊天消息 ID
    ChatMessageId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip_through_string() {
        let id = ServiceRequestId::new();
        let parsed: ServiceRequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ConversationId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let id = NotificationId::new();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.0.to_string()));
    }
}
