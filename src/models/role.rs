use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Elevated roles a user may hold. A user with no roles is a plain submitter.
///
/// Roles form a strict chain: every tier satisfies the checks of the tiers
/// below it, so authorization only ever compares ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Technician,
    Supervisor,
    Admin,
}

/// Rank of a user holding no elevated role.
pub const RANK_NONE: u8 = 0;

impl Role {
    pub const ALL: [Role; 3] = [Role::Technician, Role::Supervisor, Role::Admin];

    pub fn rank(self) -> u8 {
        match self {
            Role::Technician => 1,
            Role::Supervisor => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Technician => "TECHNICIAN",
            Role::Supervisor => "SUPERVISOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TECHNICIAN" => Ok(Role::Technician),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Capability checks for anything carrying a role set.
pub trait HasRoles {
    fn roles(&self) -> &[Role];

    /// Highest rank among the held roles, `RANK_NONE` for plain users.
    fn rank(&self) -> u8 {
        self.roles()
            .iter()
            .map(|role| role.rank())
            .max()
            .unwrap_or(RANK_NONE)
    }

    /// True when the role set satisfies the given minimum tier.
    fn satisfies(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    fn is_admin(&self) -> bool {
        self.satisfies(Role::Admin)
    }

    fn is_supervisor(&self) -> bool {
        self.satisfies(Role::Supervisor)
    }

    fn is_technician(&self) -> bool {
        self.satisfies(Role::Technician)
    }
}

impl HasRoles for [Role] {
    fn roles(&self) -> &[Role] {
        self
    }
}

impl HasRoles for Vec<Role> {
    fn roles(&self) -> &[Role] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every subset of {TECHNICIAN, SUPERVISOR, ADMIN}.
    fn all_role_sets() -> Vec<Vec<Role>> {
        (0u8..8)
            .map(|mask| {
                Role::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, role)| *role)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn predicates_match_role_membership() {
        for roles in all_role_sets() {
            let has = |r: Role| roles.contains(&r);
            assert_eq!(roles.is_admin(), has(Role::Admin), "{:?}", roles);
            assert_eq!(
                roles.is_supervisor(),
                has(Role::Supervisor) || has(Role::Admin),
                "{:?}",
                roles
            );
            assert_eq!(
                roles.is_technician(),
                has(Role::Technician) || has(Role::Supervisor) || has(Role::Admin),
                "{:?}",
                roles
            );
        }
    }

    #[test]
    fn hierarchy_is_monotonic() {
        for roles in all_role_sets() {
            if roles.is_admin() {
                assert!(roles.is_supervisor());
            }
            if roles.is_supervisor() {
                assert!(roles.is_technician());
            }
        }
    }

    #[test]
    fn plain_user_has_rank_none() {
        let roles: Vec<Role> = vec![];
        assert_eq!(roles.rank(), RANK_NONE);
        assert!(!roles.is_technician());
    }

    #[test]
    fn parses_and_serializes_upper_case_names() {
        assert_eq!("SUPERVISOR".parse::<Role>().unwrap(), Role::Supervisor);
        assert!("supervisor".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let parsed: Vec<Role> = serde_json::from_str(r#"["TECHNICIAN","ADMIN"]"#).unwrap();
        assert_eq!(parsed, vec![Role::Technician, Role::Admin]);
    }
}
