//! handyhub-adapter-memory - 内存存储适配器
//!
//! 用于开发环境（未配置数据库时）和测试

mod repository;

pub use repository::InMemoryRepository;
