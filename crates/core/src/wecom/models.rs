//! Wire types for the WeCom contacts API.
//!
//! Only the fields orgsync exports are modelled. Keys the API omits (fields
//! the calling application has no permission to read) deserialize to empty
//! defaults.

use serde::{Deserialize, Serialize};

/// One department from `GET /cgi-bin/department/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeComDepartment {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub parentid: i64,
    #[serde(default)]
    pub order: i64,
}

/// One member from `GET /cgi-bin/user/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeComUser {
    pub userid: String,
    pub name: String,
    pub mobile: String,
    /// Department memberships, in the order the API lists them.
    pub department: Vec<i64>,
    pub position: String,
    /// `"0"` unknown, `"1"` male, `"2"` female.
    pub gender: String,
    pub email: String,
    pub biz_mail: String,
    pub avatar: String,
    pub telephone: String,
    pub alias: String,
    pub external_position: String,
    pub address: String,
    pub open_userid: String,
    pub main_department: i64,
    pub english_name: String,
}

/// Common response envelope: every body carries `errcode`/`errmsg` next to
/// the payload fields.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentListBody {
    #[serde(default)]
    pub department: Vec<WeComDepartment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListBody {
    #[serde(default)]
    pub userlist: Vec<WeComUser>,
}
