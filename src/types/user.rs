use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Avatar assigned to new accounts. Never removed from the avatar directory.
pub const DEFAULT_AVATAR: &str = "default_avatar.png";

/// A user as seen by the rest of the server: every column except the
/// password hash and its salt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub mbti_type: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub grade: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            bail!("username is required");
        }
        if self.email.trim().is_empty() {
            bail!("email is required");
        }
        if !is_email(&self.email) {
            bail!("email '{}' is invalid", self.email);
        }
        if self.password.is_empty() {
            bail!("password is required");
        }
        Ok(())
    }
}

/// Loose shape check: one '@' with a non-empty local part and a dotted domain.
fn is_email(s: &str) -> bool {
    let (local, domain) = match s.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    if local.is_empty() || domain.contains('@') || s.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial profile update. An absent field is left unchanged (`None`), an
/// explicit `null` clears it (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
}

/// Only called for keys that appear in the input, so `null` becomes
/// `Some(None)` instead of collapsing into the missing case.
fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.gender.is_none() && self.grade.is_none() && self.bio.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_register() {
        let cases = [
            ("alice", "alice@example.com", "123456", true),
            ("", "alice@example.com", "123456", false),
            ("  ", "alice@example.com", "123456", false),
            ("alice", "", "123456", false),
            ("alice", "alice@example.com", "", false),
            ("alice", "alice", "123456", false),
            ("alice", "@example.com", "123456", false),
            ("alice", "alice@example", "123456", false),
            ("alice", "alice@@example.com", "123456", false),
            ("alice", "al ice@example.com", "123456", false),
            ("alice", "alice@mail.example.com", "123456", true),
        ];
        for (username, email, password, expect) in cases {
            let req = RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            };
            assert_eq!(req.validate().is_ok(), expect, "{username:?} {email:?}");
        }
    }

    #[test]
    fn test_profile_patch() {
        let patch: ProfilePatch = serde_json::from_str(r#"{"age": 21, "bio": null}"#).unwrap();
        assert_eq!(
            patch,
            ProfilePatch {
                age: Some(Some(21)),
                bio: Some(None),
                ..Default::default()
            }
        );
        assert!(!patch.is_empty());

        let patch: ProfilePatch = serde_json::from_str(r#"{"gender": null}"#).unwrap();
        assert_eq!(patch.gender, Some(None));
        assert!(!patch.is_empty());

        let patch: ProfilePatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        assert!(serde_json::from_str::<ProfilePatch>(r#"{"age": -1}"#).is_err());
    }

    #[test]
    fn test_change_password() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword": "old", "newPassword": "new"}"#).unwrap();
        assert_eq!(req.current_password, "old");
        assert_eq!(req.new_password, "new");
    }
}
