//! 领域实体

/// 为聚合实现 Entity / AggregateRoot / Document
macro_rules! impl_document {
    ($entity:ty, $id:ty, $collection:literal) => {
        impl handyhub_domain_core::Entity for $entity {
            type Id = $id;

            fn id(&self) -> &$id {
                &self.id
            }
        }

        impl handyhub_domain_core::AggregateRoot for $entity {
            fn audit_info(&self) -> &handyhub_common::AuditInfo {
                &self.audit_info
            }

            fn audit_info_mut(&mut self) -> &mut handyhub_common::AuditInfo {
                &mut self.audit_info
            }
        }

        impl handyhub_ports::Document for $entity {
            const COLLECTION: &'static str = $collection;
        }
    };
}

mod chat;
mod contractor_application;
mod distributor_application;
mod material_request;
mod notification;
mod partner_request;
mod service_request;
mod user;

pub use chat::*;
pub use contractor_application::*;
pub use distributor_application::*;
pub use material_request::*;
pub use notification::*;
pub use partner_request::*;
pub use service_request::*;
pub use user::*;
