//! HandyHub 家装服务撮合平台
//!
//! 客户发布服务需求与材料需求，承包商投标、供应商报价；
//! 合作伙伴通过邮箱验证码与管理员审批入驻。

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod startup;
