//! Login accounts, roles, and sessions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Teacher,
  Student,
}

impl Role {
  pub fn parse(s: &str) -> Result<Self> {
    Role::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }

  /// Landing page a client should open after login.
  pub fn home_path(self) -> &'static str {
    match self {
      Role::Teacher => "/teacher/dashboard",
      Role::Student => "/student/dashboard",
    }
  }
}

/// A set of login credentials. Student accounts point at their student row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub student_id:    Option<Uuid>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::SchoolStore::add_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub student_id:    Option<Uuid>,
}

/// A login session. Only the SHA-256 digest of the bearer token is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token_hash: String,
  pub account_id: Uuid,
  pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
  pub account_id: Uuid,
  pub email:      String,
  pub role:       Role,
  pub student_id: Option<Uuid>,
  /// Local part of the email address.
  pub username:   String,
}

impl From<Account> for Principal {
  fn from(account: Account) -> Self {
    let username = account
      .email
      .split_once('@')
      .map(|(local, _)| local.to_owned())
      .unwrap_or_else(|| account.email.clone());
    Principal {
      account_id: account.account_id,
      email: account.email,
      role: account.role,
      student_id: account.student_id,
      username,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn principal_username_is_email_local_part() {
    let account = Account {
      account_id:    Uuid::new_v4(),
      email:         "ana.reyes@school.edu".into(),
      password_hash: String::new(),
      role:          Role::Teacher,
      student_id:    None,
      created_at:    Utc::now(),
    };
    let principal = Principal::from(account);
    assert_eq!(principal.username, "ana.reyes");
    assert_eq!(principal.role.home_path(), "/teacher/dashboard");
  }

  #[test]
  fn role_round_trips_through_strings() {
    assert_eq!(Role::parse("student").unwrap(), Role::Student);
    assert_eq!(Role::Teacher.as_ref(), "teacher");
    assert!(matches!(Role::parse("admin"), Err(Error::UnknownRole(_))));
  }
}
