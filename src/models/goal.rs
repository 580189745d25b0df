//! Savings goal data models and API request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::ObjectId,
    validation::{Violations, parse_flag},
};

/// A savings target and the progress made towards it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub deadline: Option<String>,
}

impl CreateGoalRequest {
    pub fn validate(self) -> Result<NewGoal, AppError> {
        let mut v = Violations::new();

        let name = v.required_text("name", self.name);
        let description = v.note("description", self.description);
        let target_amount = match self.target_amount {
            None => {
                v.push("targetAmount", "Required");
                None
            }
            amount => v.non_negative("targetAmount", amount),
        };
        let current_amount = v.non_negative("currentAmount", self.current_amount);
        let wallet_id = v.object_id("walletId", self.wallet_id.as_deref());
        let user_id = v.object_id("userId", self.user_id.as_deref());
        let deadline = v.date("deadline", self.deadline.as_deref());

        let (Some(name), Some(target_amount)) = (name, target_amount) else {
            return Err(v.into_error());
        };

        v.finish(NewGoal {
            name,
            description,
            target_amount,
            current_amount: current_amount.unwrap_or(0.0),
            wallet_id,
            user_id,
            deadline,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub deadline: Option<String>,
}

impl UpdateGoalRequest {
    pub fn validate(self) -> Result<GoalPatch, AppError> {
        let mut v = Violations::new();

        let patch = GoalPatch {
            name: self.name.and_then(|name| v.non_empty_text("name", name)),
            description: v.note("description", self.description),
            target_amount: v.non_negative("targetAmount", self.target_amount),
            current_amount: v.non_negative("currentAmount", self.current_amount),
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            deadline: v.date("deadline", self.deadline.as_deref()),
        };

        if v.is_empty() && patch == GoalPatch::default() {
            v.push("body", "Request body cannot be empty");
        }

        v.finish(patch)
    }
}

/// Body of `PATCH /api/goals/{id}/progress`. Negative deltas withdraw.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustProgressRequest {
    pub amount_delta: Option<f64>,
}

impl AdjustProgressRequest {
    pub fn validate(self) -> Result<f64, AppError> {
        match self.amount_delta {
            Some(delta) if delta.is_finite() => Ok(delta),
            Some(_) => Err(AppError::invalid_field("amountDelta", "Must be a finite number")),
            None => Err(AppError::invalid_field("amountDelta", "Required")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalFilter {
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    /// Only goals with a positive target that is not yet reached.
    pub active_only: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalQueryParams {
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub active_only: Option<String>,
}

impl GoalQueryParams {
    pub fn validate(&self) -> Result<GoalFilter, AppError> {
        let mut v = Violations::new();

        let filter = GoalFilter {
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            active_only: parse_flag(&mut v, "activeOnly", self.active_only.as_deref())
                .unwrap_or(false),
        };

        v.finish(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_current_amount_to_zero() {
        let goal = CreateGoalRequest {
            name: Some("Holiday".to_string()),
            target_amount: Some(2000.0),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(goal.current_amount, 0.0);
        assert_eq!(goal.deadline, None);
    }

    #[test]
    fn create_rejects_negative_amounts() {
        let Err(AppError::Validation(details)) = CreateGoalRequest {
            name: Some("Holiday".to_string()),
            target_amount: Some(-1.0),
            current_amount: Some(-5.0),
            ..Default::default()
        }
        .validate() else {
            panic!("expected a validation error");
        };

        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["targetAmount", "currentAmount"]);
    }

    #[test]
    fn progress_delta_is_required() {
        assert!(AdjustProgressRequest::default().validate().is_err());
        assert_eq!(
            AdjustProgressRequest {
                amount_delta: Some(-25.0)
            }
            .validate()
            .unwrap(),
            -25.0
        );
    }

    #[test]
    fn query_rejects_bad_flag() {
        let params = GoalQueryParams {
            active_only: Some("yes".to_string()),
            ..Default::default()
        };

        assert!(matches!(params.validate(), Err(AppError::Validation(_))));
    }
}
