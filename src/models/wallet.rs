//! Shared wallet data models and API request types.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{DEFAULT_CURRENCY, ObjectId},
    validation::Violations,
};

/// What a member may do with a wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    Owner,
    Editor,
    #[default]
    Viewer,
}

impl WalletRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletRole::Owner => "owner",
            WalletRole::Editor => "editor",
            WalletRole::Viewer => "viewer",
        }
    }
}

impl fmt::Display for WalletRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no wallet role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Must be one of owner, editor, viewer")]
pub struct InvalidWalletRole;

impl FromStr for WalletRole {
    type Err = InvalidWalletRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(WalletRole::Owner),
            "editor" => Ok(WalletRole::Editor),
            "viewer" => Ok(WalletRole::Viewer),
            _ => Err(InvalidWalletRole),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMember {
    pub user_id: ObjectId,
    pub role: WalletRole,
}

/// A wallet shared between users.
///
/// # Database Table
///
/// Maps to the `wallets` table. `members` is a JSONB array of
/// `{"userId": ..., "role": ...}` objects.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub owner_id: ObjectId,
    #[sqlx(json)]
    pub members: Vec<WalletMember>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub name: String,
    pub owner_id: ObjectId,
    pub members: Vec<WalletMember>,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub owner_id: Option<ObjectId>,
    /// Replaces the whole member list when present.
    pub members: Option<Vec<WalletMember>>,
    pub currency: Option<String>,
}

/// A member as submitted by a client. `role` defaults to viewer.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

impl MemberRequest {
    pub fn validate(self) -> Result<WalletMember, AppError> {
        let mut v = Violations::new();
        let member = member(&mut v, "", self);
        match member {
            Some(member) => v.finish(member),
            None => Err(v.into_error()),
        }
    }
}

/// Validate one member, prefixing field paths with `prefix`.
fn member(v: &mut Violations, prefix: &str, request: MemberRequest) -> Option<WalletMember> {
    let user_path = format!("{prefix}userId");
    let user_id = match request.user_id {
        None => {
            v.push(user_path, "Required");
            None
        }
        Some(raw) => v.object_id(&user_path, Some(&raw)),
    };
    let role = match request.role.as_deref().map(str::trim) {
        None => Some(WalletRole::default()),
        Some(raw) => match raw.parse::<WalletRole>() {
            Ok(role) => Some(role),
            Err(e) => {
                v.push(format!("{prefix}role"), e.to_string());
                None
            }
        },
    };

    Some(WalletMember {
        user_id: user_id?,
        role: role?,
    })
}

fn members(v: &mut Violations, requests: Vec<MemberRequest>) -> Vec<WalletMember> {
    requests
        .into_iter()
        .enumerate()
        .filter_map(|(index, request)| member(v, &format!("members.{index}."), request))
        .collect()
}

/// Request body for creating a wallet.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Household",
///   "ownerId": "65f1a2b3c4d5e6f708192a3b",
///   "members": [{ "userId": "65f1a2b3c4d5e6f708192a3c", "role": "editor" }],
///   "currency": "eur"
/// }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub name: Option<String>,
    pub owner_id: Option<String>,
    pub members: Option<Vec<MemberRequest>>,
    pub currency: Option<String>,
}

impl CreateWalletRequest {
    pub fn validate(self) -> Result<NewWallet, AppError> {
        let mut v = Violations::new();

        let name = v.required_text("name", self.name);
        let owner_id = match self.owner_id {
            None => {
                v.push("ownerId", "Required");
                None
            }
            Some(raw) => v.object_id("ownerId", Some(&raw)),
        };
        let members = members(&mut v, self.members.unwrap_or_default());
        let currency = v.currency("currency", self.currency);

        let (Some(name), Some(owner_id)) = (name, owner_id) else {
            return Err(v.into_error());
        };

        v.finish(NewWallet {
            name,
            owner_id,
            members,
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWalletRequest {
    pub name: Option<String>,
    pub owner_id: Option<String>,
    pub members: Option<Vec<MemberRequest>>,
    pub currency: Option<String>,
}

impl UpdateWalletRequest {
    pub fn validate(self) -> Result<WalletPatch, AppError> {
        let mut v = Violations::new();

        let patch = WalletPatch {
            name: self.name.and_then(|name| v.non_empty_text("name", name)),
            owner_id: v.object_id("ownerId", self.owner_id.as_deref()),
            members: self.members.map(|requests| members(&mut v, requests)),
            currency: v.currency("currency", self.currency),
        };

        if v.is_empty() && patch == WalletPatch::default() {
            v.push("body", "Request body cannot be empty");
        }

        v.finish(patch)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletQueryParams {
    pub owner_id: Option<String>,
}

impl WalletQueryParams {
    pub fn validate(&self) -> Result<Option<ObjectId>, AppError> {
        let mut v = Violations::new();
        let owner_id = v.object_id("ownerId", self.owner_id.as_deref());
        v.finish(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "65f1a2b3c4d5e6f708192a3b";
    const MEMBER: &str = "65f1a2b3c4d5e6f708192a3c";

    #[test]
    fn create_applies_defaults() {
        let wallet = CreateWalletRequest {
            name: Some(" Household ".to_string()),
            owner_id: Some(OWNER.to_string()),
            members: Some(vec![MemberRequest {
                user_id: Some(MEMBER.to_string()),
                role: None,
            }]),
            currency: None,
        }
        .validate()
        .unwrap();

        assert_eq!(wallet.name, "Household");
        assert_eq!(wallet.currency, "USD");
        assert_eq!(wallet.members[0].role, WalletRole::Viewer);
    }

    #[test]
    fn currency_is_uppercased() {
        let wallet = CreateWalletRequest {
            name: Some("Trip".to_string()),
            owner_id: Some(OWNER.to_string()),
            currency: Some("eur".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(wallet.currency, "EUR");
    }

    #[test]
    fn member_errors_are_indexed() {
        let Err(AppError::Validation(details)) = CreateWalletRequest {
            name: Some("Trip".to_string()),
            owner_id: Some(OWNER.to_string()),
            members: Some(vec![
                MemberRequest {
                    user_id: Some(MEMBER.to_string()),
                    role: Some("editor".to_string()),
                },
                MemberRequest {
                    user_id: Some("nope".to_string()),
                    role: Some("admin".to_string()),
                },
            ]),
            ..Default::default()
        }
        .validate() else {
            panic!("expected a validation error");
        };

        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["members.1.userId", "members.1.role"]);
    }

    #[test]
    fn roles_parse_from_their_lowercase_names() {
        for role in [WalletRole::Owner, WalletRole::Editor, WalletRole::Viewer] {
            assert_eq!(role.as_str().parse::<WalletRole>(), Ok(role));
        }
        assert_eq!("Owner".parse::<WalletRole>(), Err(InvalidWalletRole));
        assert_eq!(
            "admin".parse::<WalletRole>().unwrap_err().to_string(),
            "Must be one of owner, editor, viewer"
        );
    }

    #[test]
    fn member_serializes_with_lowercase_role() {
        let member = WalletMember {
            user_id: MEMBER.parse().unwrap(),
            role: WalletRole::Editor,
        };

        assert_eq!(
            serde_json::to_value(&member).unwrap(),
            serde_json::json!({ "userId": MEMBER, "role": "editor" })
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(matches!(
            UpdateWalletRequest::default().validate(),
            Err(AppError::Validation(_))
        ));
    }
}
