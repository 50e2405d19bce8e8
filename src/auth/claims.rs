use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a credential or of an admin-claim token.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Who a token speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSubject {
    /// Admin identity carried entirely inside the token.
    Admin,
    /// A credential row, resolved on every request.
    User(Uuid),
}

/// JWT payload. Carries either `role: "admin"` or `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// The admin claim wins over a subject id.
    pub fn subject(&self) -> Option<TokenSubject> {
        if self.role == Some(Role::Admin) {
            return Some(TokenSubject::Admin);
        }
        self.sub.map(TokenSubject::User)
    }
}
