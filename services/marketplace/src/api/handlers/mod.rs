//! HTTP 处理器，按业务区域划分

pub mod admin;
pub mod ai;
pub mod auth;
pub mod chat;
pub mod health;
pub mod material_requests;
pub mod notifications;
pub mod partners;
pub mod service_requests;
pub mod users;
