//! Builds exported records from a [`DirectoryClient`].
//!
//! Enumeration is strictly sequential: all departments first, then each
//! department's member list in turn. The first failing call aborts the run
//! and nothing collected so far is returned.

use tracing::{debug, info, instrument};

use crate::config::{DEFAULT_BIZ_FALLBACK_DOMAIN, DEFAULT_PERSONAL_FALLBACK_DOMAIN};
use crate::derive::{derive_username, resolve_email_field, sanitize_email};
use crate::errors::AssemblyError;
use crate::models::{DepartmentRecord, UserRecord};
use crate::transliterate::{PinyinTransliterator, Transliterator};
use crate::wecom::{DirectoryClient, WeComDepartment, WeComUser};

/// Static inputs to record assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblySettings {
    /// Source-system tag prefixed to department IDs.
    pub flag: String,
    pub personal_fallback_domain: String,
    pub biz_fallback_domain: String,
}

impl AssemblySettings {
    /// `<flag>_<id>`, unique across federated sources.
    pub fn namespaced_id(&self, id: i64) -> String {
        format!("{}_{}", self.flag, id)
    }
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            flag: "wecom".into(),
            personal_fallback_domain: DEFAULT_PERSONAL_FALLBACK_DOMAIN.into(),
            biz_fallback_domain: DEFAULT_BIZ_FALLBACK_DOMAIN.into(),
        }
    }
}

/// Turns directory listings into [`DepartmentRecord`]s and [`UserRecord`]s.
pub struct RecordAssembler<C, T = PinyinTransliterator> {
    client: C,
    transliterator: T,
    settings: AssemblySettings,
}

impl<C: DirectoryClient> RecordAssembler<C, PinyinTransliterator> {
    /// Assembler using pinyin for name romanization.
    pub fn with_pinyin(client: C, settings: AssemblySettings) -> Self {
        Self::new(client, PinyinTransliterator, settings)
    }
}

impl<C: DirectoryClient, T: Transliterator> RecordAssembler<C, T> {
    pub fn new(client: C, transliterator: T, settings: AssemblySettings) -> Self {
        Self {
            client,
            transliterator,
            settings,
        }
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    /// List every department as an exported record.
    #[instrument(skip(self))]
    pub async fn departments(&self) -> Result<Vec<DepartmentRecord>, AssemblyError> {
        let departments = self
            .client
            .list_departments()
            .await
            .map_err(AssemblyError::Departments)?;
        info!(count = departments.len(), "assembled departments");
        Ok(departments
            .iter()
            .map(|d| self.build_department(d))
            .collect())
    }

    /// List the members of every department, descendants included, as
    /// exported records.
    ///
    /// A user belonging to several listed departments appears once per
    /// listing that returns them, in API order.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<UserRecord>, AssemblyError> {
        let departments = self
            .client
            .list_departments()
            .await
            .map_err(AssemblyError::Departments)?;
        info!(departments = departments.len(), "enumerating department members");

        let mut records = Vec::new();
        for department in &departments {
            let users = self
                .client
                .list_users(department.id, true)
                .await
                .map_err(|source| AssemblyError::Users {
                    department_id: department.id,
                    source,
                })?;
            debug!(
                department_id = department.id,
                count = users.len(),
                "listed department members"
            );
            records.extend(users.iter().map(|u| self.build_user(u)));
        }

        info!(count = records.len(), "assembled users");
        Ok(records)
    }

    /// Build the exported record for one department.
    pub fn build_department(&self, department: &WeComDepartment) -> DepartmentRecord {
        DepartmentRecord {
            id: department.id,
            name: department.name.clone(),
            name_pinyin: self.transliterator.convert(&department.name),
            name_en: department.name_en.clone(),
            parent_id: department.parentid,
            namespaced_id: self.settings.namespaced_id(department.id),
            namespaced_parent_id: self.settings.namespaced_id(department.parentid),
        }
    }

    /// Build the exported record for one user.
    pub fn build_user(&self, user: &WeComUser) -> UserRecord {
        build_user_record(user, &self.transliterator, &self.settings)
    }
}

/// Build the exported record for one user. Pure: no I/O, no state.
pub fn build_user_record<T: Transliterator>(
    user: &WeComUser,
    transliterator: &T,
    settings: &AssemblySettings,
) -> UserRecord {
    let name_pinyin = transliterator.convert(&user.name);
    let username = derive_username(&name_pinyin, &user.mobile);

    let email = resolve_email_field(
        &user.email,
        &user.mobile,
        &user.userid,
        &settings.personal_fallback_domain,
    );
    let biz_email = resolve_email_field(
        &user.biz_mail,
        &user.mobile,
        &user.userid,
        &settings.biz_fallback_domain,
    );
    let mail_sanitized = (!user.email.is_empty()).then(|| sanitize_email(&user.email));
    let (email, email_nickname) = match email {
        Some(e) => (Some(e.address), Some(e.nickname)),
        None => (None, None),
    };
    let (biz_email, biz_email_nickname) = match biz_email {
        Some(e) => (Some(e.address), Some(e.nickname)),
        None => (None, None),
    };

    UserRecord {
        name: user.name.clone(),
        name_pinyin,
        username,
        userid: user.userid.clone(),
        mobile: user.mobile.clone(),
        position: user.position.clone(),
        gender: user.gender.clone(),
        email,
        email_nickname,
        mail_sanitized,
        biz_email,
        biz_email_nickname,
        avatar: user.avatar.clone(),
        telephone: user.telephone.clone(),
        alias: user.alias.clone(),
        external_position: user.external_position.clone(),
        address: user.address.clone(),
        open_userid: user.open_userid.clone(),
        main_department: user.main_department,
        english_name: user.english_name.clone(),
        department_ids: user
            .department
            .iter()
            .map(|id| settings.namespaced_id(*id))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WeComError;

    /// A client that is never called; `build_*` are pure.
    struct Unreachable;

    impl DirectoryClient for Unreachable {
        async fn list_departments(&self) -> Result<Vec<WeComDepartment>, WeComError> {
            unreachable!("build_* must not call the client")
        }

        async fn list_users(&self, _: i64, _: bool) -> Result<Vec<WeComUser>, WeComError> {
            unreachable!("build_* must not call the client")
        }
    }

    struct Upper;

    impl Transliterator for Upper {
        fn convert(&self, text: &str) -> String {
            text.to_uppercase()
        }
    }

    fn assembler() -> RecordAssembler<Unreachable, Upper> {
        RecordAssembler::new(
            Unreachable,
            Upper,
            AssemblySettings {
                flag: "wx".into(),
                personal_fallback_domain: "mail.example.com".into(),
                biz_fallback_domain: "biz.example.com".into(),
            },
        )
    }

    #[test]
    fn test_namespaced_id() {
        let settings = AssemblySettings::default();
        assert_eq!(settings.namespaced_id(12), "wecom_12");
    }

    #[test]
    fn test_build_department() {
        let dept = WeComDepartment {
            id: 5,
            name: "rd".into(),
            name_en: "R&D".into(),
            parentid: 1,
            order: 100,
        };
        let record = assembler().build_department(&dept);
        assert_eq!(record.name_pinyin, "RD");
        assert_eq!(record.namespaced_id, "wx_5");
        assert_eq!(record.namespaced_parent_id, "wx_1");
        assert_eq!(record.parent_id, 1);
    }

    #[test]
    fn test_build_user_derives_fields() {
        let user = WeComUser {
            userid: "U001".into(),
            name: "li".into(),
            mobile: "138-0000-1234".into(),
            email: "user@bad..".into(),
            biz_mail: "li@corp.com".into(),
            department: vec![3, 1],
            position: "dev".into(),
            ..Default::default()
        };
        let record = assembler().build_user(&user);
        assert_eq!(record.name_pinyin, "LI");
        assert_eq!(record.username, "LI1234");
        assert_eq!(record.email.as_deref(), Some("13800001234@mail.example.com"));
        assert_eq!(record.email_nickname.as_deref(), Some("13800001234"));
        assert_eq!(record.mail_sanitized.as_deref(), Some("user@bad.."));
        assert_eq!(record.biz_email.as_deref(), Some("li@corp.com"));
        assert_eq!(record.biz_email_nickname.as_deref(), Some("li"));
        assert_eq!(record.department_ids, vec!["wx_3", "wx_1"]);
        assert_eq!(record.position, "dev");
    }

    #[test]
    fn test_build_user_empty_emails_absent() {
        let user = WeComUser {
            userid: "U002".into(),
            name: "wu".into(),
            mobile: "12".into(),
            ..Default::default()
        };
        let record = assembler().build_user(&user);
        assert_eq!(record.username, "WU");
        assert!(record.email.is_none() && record.email_nickname.is_none());
        assert!(record.mail_sanitized.is_none());
        assert!(record.biz_email.is_none() && record.biz_email_nickname.is_none());
        assert!(record.department_ids.is_empty());
    }

    #[test]
    fn test_build_user_is_repeatable() {
        let user = WeComUser {
            userid: "U003".into(),
            name: "zhao".into(),
            email: "好@weird".into(),
            ..Default::default()
        };
        let a = assembler();
        assert_eq!(a.build_user(&user), a.build_user(&user));
        assert_eq!(a.build_user(&user).email.as_deref(), Some("U003@mail.example.com"));
    }
}
