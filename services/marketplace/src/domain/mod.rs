//! 领域层
//!
//! 包含业务实体、值对象、枚举、领域事件和仓储集合

pub mod entities;
pub mod enums;
pub mod events;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use enums::*;
pub use events::*;
pub use repositories::*;
pub use value_objects::*;
