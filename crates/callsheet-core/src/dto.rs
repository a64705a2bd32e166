use crate::domain::{CallStatus, ContactId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactListItemDto {
    pub id: ContactId,
    pub full_name: String,
    pub phone: Option<String>,
    pub call_status: CallStatus,
    pub source: Option<String>,
    pub tags: Vec<String>,
}
