//! Course, enrolment and invitation models.

use super::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A course as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    #[serde(rename = "nimi")]
    pub name: String,
}

/// One of the signed-in user's enrolments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyCourse {
    #[serde(rename = "kurssi")]
    pub course_id: i64,
    #[serde(rename = "nimi", default)]
    pub name: Option<String>,
    #[serde(rename = "asema")]
    pub role: Role,
}

/// Details of a pending invitation, looked up by its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitedInfo {
    pub id: Uuid,
    #[serde(rename = "kurssi")]
    pub course_id: i64,
    #[serde(rename = "sposti")]
    pub email: String,
    #[serde(rename = "rooli", default)]
    pub role: Option<Role>,
}

/// Request body for inviting an external user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInvitation {
    #[serde(rename = "sposti")]
    pub email: String,
    #[serde(rename = "rooli")]
    pub role: Role,
}

/// Response of an invitation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "kutsu")]
    pub token: Option<Uuid>,
}

/// Request body for consuming an invitation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinRequest {
    #[serde(rename = "kutsu")]
    pub token: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invited_info() {
        let json = r#"{"id":"6f1c7c0e-3d8e-4a53-9f43-3a9f5f3b9a10","kurssi":1,"sposti":"new@example.com","rooli":"opiskelija"}"#;
        let info: InvitedInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.course_id, 1);
        assert_eq!(info.role, Some(Role::Student));
    }

    #[test]
    fn test_join_request_wire_shape() {
        let token = Uuid::nil();
        let json = serde_json::to_string(&JoinRequest { token }).unwrap();
        assert_eq!(json, format!("{{\"kutsu\":\"{}\"}}", token));
    }
}
