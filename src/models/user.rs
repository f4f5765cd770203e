//! User model.

use serde::{Deserialize, Serialize};

/// Role of a user, globally or within a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "opiskelija", alias = "student")]
    Student,
    #[serde(rename = "opettaja", alias = "teacher")]
    Teacher,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// Teachers and admins may moderate content they did not write.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Teacher | Self::Admin)
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Student => "role.student",
            Self::Teacher => "role.teacher",
            Self::Admin => "role.admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "opiskelija"),
            Self::Teacher => write!(f, "opettaja"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The signed-in user, or the author of a ticket/comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Display name.
    #[serde(rename = "nimi")]
    pub name: String,

    #[serde(rename = "sposti", default)]
    pub email: Option<String>,

    #[serde(rename = "asema", default)]
    pub role: Option<Role>,
}
