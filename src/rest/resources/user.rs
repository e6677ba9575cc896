//! User resource and user roles.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rest::collection::NoFilters;
use crate::rest::errors::FieldError;
use crate::rest::fields::{Field, FieldKind, LocalValue, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    Field::new("login", FieldKind::String),
    Field::new("password", FieldKind::String).mutable(),
    Field::new("name", FieldKind::String).mutable(),
    Field::new("email", FieldKind::String).mutable(),
    Field::new("roles", FieldKind::Set(&FieldKind::String)).mutable(),
    Field::new("added", FieldKind::DateTime),
];

/// A user role, granting permissions on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Can do anything.
    Admin,
    /// Can import samples.
    Importer,
    /// Can annotate variants.
    Annotator,
    /// Can annotate variants if they are in an active sample.
    Trader,
    /// Can use any query expression when annotating.
    Querier,
    /// Can use group query expressions when annotating.
    GroupQuerier,
}

/// Every role, in the order the server lists them.
pub const USER_ROLES: [Role; 6] = [
    Role::Admin,
    Role::Importer,
    Role::Annotator,
    Role::Trader,
    Role::Querier,
    Role::GroupQuerier,
];

impl Role {
    /// Returns the role name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Importer => "importer",
            Self::Annotator => "annotator",
            Self::Trader => "trader",
            Self::Querier => "querier",
            Self::GroupQuerier => "group-querier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown user role '{0}'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        USER_ROLES
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl From<Role> for LocalValue {
    fn from(role: Role) -> Self {
        Self::String(role.as_str().to_string())
    }
}

typed_resource!(
    /// A user account.
    User,
    User,
    NoFilters,
    NewUser
);

impl User {
    /// Login name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn login(&self) -> Result<Option<String>, FieldError> {
        self.0.value("login")
    }

    /// Human readable name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn name(&self) -> Result<Option<String>, FieldError> {
        self.0.value("name")
    }

    /// Email address.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn email(&self) -> Result<Option<String>, FieldError> {
        self.0.value("email")
    }

    /// The user's roles.
    ///
    /// This is a copy; use [`add_role`](Self::add_role),
    /// [`remove_role`](Self::remove_role), or [`set_roles`](Self::set_roles)
    /// to change roles.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidWireValue`] if the server reports a role
    /// this client does not know.
    pub fn roles(&self) -> Result<BTreeSet<Role>, FieldError> {
        let names = self
            .0
            .value::<Option<BTreeSet<String>>>("roles")?
            .unwrap_or_default();
        names
            .iter()
            .map(|name| {
                name.parse::<Role>().map_err(|e| FieldError::InvalidWireValue {
                    field: "roles".to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// When the user was added.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn added(&self) -> Result<Option<NaiveDateTime>, FieldError> {
        self.0.value("added")
    }

    /// Changes the password.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_password(&mut self, password: impl Into<String>) -> Result<(), FieldError> {
        self.0.set_field("password", password.into())
    }

    /// Changes the name.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FieldError> {
        self.0.set_field("name", name.into())
    }

    /// Sets or clears the email address.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_email(&mut self, email: Option<String>) -> Result<(), FieldError> {
        self.0.set_field("email", email)
    }

    /// Replaces the roles.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = Role>) -> Result<(), FieldError> {
        self.0.set_field("roles", roles.into_iter().collect::<BTreeSet<_>>())
    }

    /// Grants a role.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn add_role(&mut self, role: Role) -> Result<(), FieldError> {
        self.0.add_to_set("roles", role)
    }

    /// Revokes a role.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn remove_role(&mut self, role: Role) -> Result<(), FieldError> {
        self.0.remove_from_set("roles", role)
    }
}

/// Parameters for creating a [`User`].
///
/// The name defaults to the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    login: String,
    password: String,
    name: Option<String>,
    email: Option<String>,
    roles: BTreeSet<Role>,
}

impl NewUser {
    /// Creates parameters for a user with `login` and `password`.
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            name: None,
            email: None,
            roles: BTreeSet::new(),
        }
    }

    /// Sets the human readable name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Grants a role.
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }
}

impl CreateParams for NewUser {
    fn into_payload(self) -> CreatePayload {
        let name = self.name.unwrap_or_else(|| self.login.clone());
        CreatePayload::new()
            .value("login", self.login)
            .value("password", self.password)
            .value("name", name)
            .value("roles", self.roles)
            .optional("email", self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in USER_ROLES {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::Value::String(role.to_string())
            );
        }
        assert_eq!(
            "superuser".parse::<Role>(),
            Err(ParseRoleError("superuser".to_string()))
        );
    }

    #[test]
    fn test_new_user_name_defaults_to_login() {
        let payload = NewUser::new("alice", "secret").role(Role::Importer).into_payload();

        assert_eq!(
            payload.values,
            vec![
                ("login", LocalValue::from("alice")),
                ("password", LocalValue::from("secret")),
                ("name", LocalValue::from("alice")),
                (
                    "roles",
                    LocalValue::Set(BTreeSet::from([LocalValue::from("importer")]))
                ),
            ]
        );
    }

    #[test]
    fn test_new_user_with_email() {
        let payload = NewUser::new("bob", "pw").name("Bob").email("bob@example.com").into_payload();
        assert_eq!(payload.values[2], ("name", LocalValue::from("Bob")));
        assert_eq!(payload.values[4], ("email", LocalValue::from("bob@example.com")));
    }
}
