//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Role stored on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular signed-in user.
    #[default]
    User,
    /// Can manage announcements, contacts and moderate reviews.
    Admin,
}

impl UserRole {
    /// Whether this role grants access to the admin API.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Lifecycle of a contact submission.
///
/// ```text
/// pending -> in_progress -> completed
///    |            |      \-> closed
///    \------------+--------> completed | closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contact_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Closed,
}

impl ContactStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Completed | Self::Closed => 2,
        }
    }

    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// Whether an admin may move a submission from `self` to `next`.
    ///
    /// Staying in the same status is allowed so notes can be edited.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("invalid contact status: {s}")),
        }
    }
}

/// What a contact submission is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contact_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ContactCategory {
    #[default]
    General,
    /// Wrong or outdated store information.
    StoreInfo,
    /// Request to list a new store.
    StoreRequest,
    Bug,
    Partnership,
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_status_forward_transitions() {
        use ContactStatus::{Closed, Completed, InProgress, Pending};

        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Closed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Closed));
    }

    #[test]
    fn test_contact_status_rejects_backward_and_terminal_moves() {
        use ContactStatus::{Closed, Completed, InProgress, Pending};

        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Completed));
        assert!(!Closed.can_transition_to(Pending));
    }

    #[test]
    fn test_contact_status_same_state_allowed() {
        assert!(ContactStatus::Closed.can_transition_to(ContactStatus::Closed));
        assert!(ContactStatus::Pending.can_transition_to(ContactStatus::Pending));
    }

    #[test]
    fn test_contact_status_parse_and_display() {
        for status in [
            ContactStatus::Pending,
            ContactStatus::InProgress,
            ContactStatus::Completed,
            ContactStatus::Closed,
        ] {
            assert_eq!(status.to_string().parse::<ContactStatus>().unwrap(), status);
        }
        assert!("done".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn test_contact_status_serde_snake_case() {
        let json = serde_json::to_string(&ContactStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_user_role() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("root".parse::<UserRole>().is_err());
    }
}
