//! Exported record types.
//!
//! These are the flattened shapes handed to the directory synchronization
//! pipeline. Serialized key names follow the attribute names that pipeline
//! maps onto LDAP (`custom_name_pinyin`, `custom_username`, ...).

use serde::{Deserialize, Serialize};

/// A department, ready for directory import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "custom_name_pinyin")]
    pub name_pinyin: String,
    pub name_en: String,
    #[serde(rename = "parentid")]
    pub parent_id: i64,
    /// `<flag>_<id>`.
    pub namespaced_id: String,
    /// `<flag>_<parentid>`.
    pub namespaced_parent_id: String,
}

/// A user as seen through one department listing, with derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    #[serde(rename = "custom_name_pinyin")]
    pub name_pinyin: String,
    #[serde(rename = "custom_username")]
    pub username: String,
    pub userid: String,
    pub mobile: String,
    pub position: String,
    pub gender: String,

    /// Absent when the source field was empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        rename = "custom_nickname_email",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_nickname: Option<String>,
    /// Source personal email with its local part cleaned; see
    /// [`sanitize_email`](crate::derive::sanitize_email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_sanitized: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_email: Option<String>,
    #[serde(
        default,
        rename = "custom_nickname_biz_email",
        skip_serializing_if = "Option::is_none"
    )]
    pub biz_email_nickname: Option<String>,

    pub avatar: String,
    pub telephone: String,
    pub alias: String,
    pub external_position: String,
    pub address: String,
    pub open_userid: String,
    pub main_department: i64,
    pub english_name: String,

    /// Department memberships as `<flag>_<deptID>`, in source order.
    pub department_ids: Vec<String>,
}
