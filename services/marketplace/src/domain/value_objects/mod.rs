//! 值对象

mod ids;
mod material_item;

pub use ids::*;
pub use material_item::*;
