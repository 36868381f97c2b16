//! WeCom (WeChat Work) contacts API access.

pub mod client;
pub mod models;

use std::future::Future;

pub use client::WeComClient;
pub use models::{WeComDepartment, WeComUser};

use crate::errors::WeComError;

/// Source of departments and their members.
///
/// [`WeComClient`] is the production implementation; tests substitute an
/// in-memory directory.
pub trait DirectoryClient {
    /// List every department visible to the application.
    fn list_departments(
        &self,
    ) -> impl Future<Output = Result<Vec<WeComDepartment>, WeComError>> + Send;

    /// List the members of `department_id`, including members of its
    /// sub-departments when `include_descendants` is set.
    fn list_users(
        &self,
        department_id: i64,
        include_descendants: bool,
    ) -> impl Future<Output = Result<Vec<WeComUser>, WeComError>> + Send;
}

impl<D: DirectoryClient + ?Sized> DirectoryClient for &D {
    fn list_departments(
        &self,
    ) -> impl Future<Output = Result<Vec<WeComDepartment>, WeComError>> + Send {
        (**self).list_departments()
    }

    fn list_users(
        &self,
        department_id: i64,
        include_descendants: bool,
    ) -> impl Future<Output = Result<Vec<WeComUser>, WeComError>> + Send {
        (**self).list_users(department_id, include_descendants)
    }
}
