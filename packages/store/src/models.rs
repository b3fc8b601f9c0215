//! # Cached user profile
//!
//! [`UserInfo`] is the profile blob the backend returns from login and from
//! `/api/user/profile`. It is stored verbatim under the `userInfo` key and read
//! back by the pages to greet the user without a round-trip.
//!
//! Fields the backend adds beyond these (timestamps and so on) are ignored on
//! read, so newer servers stay compatible.

use serde::{Deserialize, Serialize};

/// User profile as cached on the device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to the phone number if no nickname is set.
    pub fn display_name(&self) -> &str {
        if self.nickname.trim().is_empty() {
            &self.phone
        } else {
            &self.nickname
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut user = UserInfo {
            phone: "13812345678".to_string(),
            nickname: "Surveyor".to_string(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "Surveyor");

        user.nickname = "  ".to_string();
        assert_eq!(user.display_name(), "13812345678");
    }

    #[test]
    fn test_ignores_extra_fields() {
        let user: UserInfo = serde_json::from_str(
            r#"{"id": 3, "phone": "13812345678", "nickname": "n", "avatar": null,
                "created_at": "2026-01-05T10:30:00", "updated_at": "2026-01-05T10:30:00"}"#,
        )
        .unwrap();
        assert_eq!(user.id, Some(3));
        assert_eq!(user.nickname, "n");
        assert!(user.avatar.is_none());
    }
}
