//! 通知类型

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum NotificationKind {
    ServiceRequestCreated,
    ApplicationReceived,
    ApplicationAccepted,
    ApplicationRejected,
    ServiceRequestCancelled,
    ServiceRequestCompleted,
    MaterialRequestCreated,
    QuoteReceived,
    QuoteAccepted,
    QuoteRejected,
    MaterialRequestCancelled,
    MaterialRequestCompleted,
    PartnerRequestSubmitted,
    System,
}
