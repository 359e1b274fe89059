use serde::{Deserialize, Serialize};

use super::role::{HasRoles, Role};

/// A helpdesk account. `hash` is never serialized, so every JSON rendering of a
/// user (API responses, token claims) leaves it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub local: bool,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl User {
    /// "First Last", falling back to the username when no name is on file.
    pub fn full_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.username.clone()
        } else {
            name
        }
    }
}

impl HasRoles for User {
    fn roles(&self) -> &[Role] {
        &self.roles
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UserError {
    #[error("Missing required field(s)")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidUsername(String),
    #[error("{0}")]
    InvalidEmail(String),
}

impl UserError {
    pub fn field(&self) -> &'static str {
        match self {
            UserError::MissingField(field) => field,
            UserError::InvalidUsername(_) => "username",
            UserError::InvalidEmail(_) => "email",
        }
    }
}

/// Usernames and emails are compared case-insensitively and stored lower-cased.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), UserError> {
    if username.is_empty() {
        return Err(UserError::MissingField("username"));
    }
    if username.len() < 2 || username.len() > 64 {
        return Err(UserError::InvalidUsername(
            "Username must be between 2 and 64 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(UserError::InvalidUsername(
            "Username can only contain letters, numbers, dot, underscore, and hyphen".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), UserError> {
    if email.is_empty() {
        return Err(UserError::MissingField("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(UserError::InvalidEmail("Invalid email format".to_string())),
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub local: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

fn default_true() -> bool {
    true
}

impl NewUser {
    /// Normalizes identifiers and checks required fields. A local account
    /// needs a password; directory accounts never carry one.
    pub fn validate(&mut self) -> Result<(), UserError> {
        self.username = normalize_identifier(&self.username);
        self.email = normalize_identifier(&self.email);
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.local && self.password.as_deref().map_or(true, str::is_empty) {
            return Err(UserError::MissingField("password"));
        }
        Ok(())
    }

    pub fn into_user(self, id: i64, hash: Option<String>) -> User {
        let mut roles = self.roles;
        roles.sort();
        roles.dedup();
        User {
            id,
            username: self.username,
            hash: if self.local { hash } else { None },
            roles,
            local: self.local,
            enabled: self.enabled,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            department: self.department,
        }
    }
}

/// Body of `PATCH /api/users/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub local: Option<bool>,
    pub enabled: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl UserPatch {
    /// Drops everything a user may not change on their own account.
    pub fn restrict_to_profile(&mut self) {
        self.username = None;
        self.roles = None;
        self.local = None;
        self.enabled = None;
    }

    /// Applies the patch (except the password, which needs hashing first).
    pub fn apply(self, user: &mut User) -> Result<(), UserError> {
        if let Some(username) = self.username {
            let username = normalize_identifier(&username);
            validate_username(&username)?;
            user.username = username;
        }
        if let Some(email) = self.email {
            let email = normalize_identifier(&email);
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(mut roles) = self.roles {
            roles.sort();
            roles.dedup();
            user.roles = roles;
        }
        if let Some(local) = self.local {
            user.local = local;
            if !local {
                user.hash = None;
            }
        }
        if let Some(enabled) = self.enabled {
            user.enabled = enabled;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = self.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(department) = self.department {
            user.department = Some(department);
        }
        Ok(())
    }
}
