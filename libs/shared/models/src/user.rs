use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Doctor,
    Patient,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Admin => write!(f, "admin"),
            UserType::Doctor => write!(f, "doctor"),
            UserType::Patient => write!(f, "patient"),
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserType::Admin),
            "doctor" => Ok(UserType::Doctor),
            "patient" => Ok(UserType::Patient),
            other => Err(format!("Unknown user type: {}", other)),
        }
    }
}

/// Full `users` row as stored. The password hash never leaves the backend;
/// respond with [`UserProfile`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub user_type: UserType,
    /// Doctor working hours as "HH:MM-HH:MM"; absent for other roles.
    pub available_timeslots: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub user_type: UserType,
    pub available_timeslots: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            mobile: user.mobile,
            user_type: user.user_type,
            available_timeslots: user.available_timeslots,
            profile_image: user.profile_image,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_roundtrips_through_display() {
        for ty in [UserType::Admin, UserType::Doctor, UserType::Patient] {
            assert_eq!(ty.to_string().parse::<UserType>().unwrap(), ty);
        }
    }

    #[test]
    fn unknown_user_type_is_rejected() {
        assert!("nurse".parse::<UserType>().is_err());
    }
}
