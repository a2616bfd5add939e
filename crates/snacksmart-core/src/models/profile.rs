use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Gain mass
    Bulk,
    /// Lose weight
    Cut,
}

/// Body profile a meal-plan chat starts from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub gender: Gender,
    pub goal: Goal,
    pub age: u32,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub height_cm: f64,
    pub workouts_per_week: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meals_per_day: Option<u32>,
}

impl UserProfile {
    pub fn validate(&self) -> Result<()> {
        if !(1..=120).contains(&self.age) {
            return Err(CoreError::validation("Age must be between 1 and 120"));
        }
        for (field, value) in [
            ("weight_kg", self.weight_kg),
            ("target_weight_kg", self.target_weight_kg),
            ("height_cm", self.height_cm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::validation(format!("{field} must be positive")));
            }
        }
        if self.workouts_per_week > 21 {
            return Err(CoreError::validation("workouts_per_week must be at most 21"));
        }
        if self.meals_per_day == Some(0) {
            return Err(CoreError::validation("meals_per_day must be positive"));
        }
        Ok(())
    }
}
