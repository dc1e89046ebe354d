//! The resolved identity of whoever is calling the gateway.
//!
//! Authentication happens upstream; the pair arrives already trusted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::submission::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  User,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::User => "user",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Self::Admin),
      "user" => Ok(Self::User),
      other => Err(UnknownVariant::new("role", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub id:   Uuid,
  pub role: Role,
}

impl Caller {
  pub fn admin(id: Uuid) -> Self { Self { id, role: Role::Admin } }

  pub fn user(id: Uuid) -> Self { Self { id, role: Role::User } }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}
