//! 领域枚举

mod application_status;
mod notification_kind;
mod partner;
mod request_status;
mod user_status;

pub use application_status::*;
pub use notification_kind::*;
pub use partner::*;
pub use request_status::*;
pub use user_status::*;
