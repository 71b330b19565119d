//! Authentication session state.
//!
//! A session exists only while the user is authenticated; the stores treat
//! `Option<AuthSession>` as the whole truth, so "no session" and "logged
//! out" are the same thing.

use secrecy::{ExposeSecret, SecretString};

use super::image::ImageRef;

/// What the authenticated user is allowed to see.
///
/// Gates admin-only navigation affordances; it never grants anything on the
/// backend, which re-checks the token on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store staff; sees the admin navigation entries.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The authenticated user's identity and bearer token.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AuthSession {
    /// Bearer token issued by the backend.
    pub token: SecretString,
    /// Display name shown in the header.
    pub user_name: String,
    /// Avatar shown next to the name, when the account has one.
    pub profile_image: Option<ImageRef>,
    /// Permission level for navigation affordances.
    pub role: Role,
}

impl AuthSession {
    /// Build a session for a user the backend just authenticated.
    #[must_use]
    pub fn new(token: impl Into<String>, user_name: impl Into<String>, role: Role) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user_name: user_name.into(),
            profile_image: None,
            role,
        }
    }

    /// Attach a profile image reference.
    #[must_use]
    pub fn with_profile_image(mut self, image: ImageRef) -> Self {
        self.profile_image = Some(image);
        self
    }

    /// Whether this session may see admin-only navigation entries.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user_name", &self.user_name)
            .field("profile_image", &self.profile_image)
            .field("role", &self.role)
            .finish()
    }
}

impl PartialEq for AuthSession {
    fn eq(&self, other: &Self) -> bool {
        self.token.expose_secret() == other.token.expose_secret()
            && self.user_name == other.user_name
            && self.profile_image == other.profile_image
            && self.role == other.role
    }
}
