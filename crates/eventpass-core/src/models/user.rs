use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organizer,
    Student,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Organizer => write!(f, "Organizer"),
            Role::Student => write!(f, "Student"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
}

impl UserProfile {
    pub fn is_organizer(&self) -> bool {
        self.role == Role::Organizer
    }
}
