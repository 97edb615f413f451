//! Client-side input checks. Nothing that fails here is sent to the backend.

use std::str::FromStr;

use thiserror::Error;
use validator::ValidateEmail;

use crate::api::models::{Gender, LoginRequest, SignupRequest, UserInfoRequest, WorkoutGoal};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter your email and password")]
    MissingCredentials,
    #[error("Fill in every field")]
    MissingFields,
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Enter your height")]
    MissingHeight,
    #[error("Height must be a whole number of centimeters")]
    InvalidHeight,
    #[error("Enter your weight")]
    MissingWeight,
    #[error("Weight must be a number of kilograms")]
    InvalidWeight,
    #[error("Select a gender")]
    MissingGender,
    #[error("Select a workout goal")]
    MissingGoal,
    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

pub fn validate_login(email: &str, password: &str) -> Result<LoginRequest, ValidationError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(LoginRequest {
        email: email.to_owned(),
        password: password.to_owned(),
    })
}

pub fn validate_signup(
    email: &str,
    name: &str,
    password: &str,
    password_confirm: &str,
) -> Result<SignupRequest, ValidationError> {
    let (email, name) = (email.trim(), name.trim());
    if email.is_empty() || name.is_empty() || password.is_empty() || password_confirm.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != password_confirm {
        return Err(ValidationError::PasswordMismatch);
    }

    Ok(SignupRequest {
        email: email.to_owned(),
        password: password.to_owned(),
        name: name.to_owned(),
    })
}

pub fn validate_user_info(
    email: &str,
    height: &str,
    weight: &str,
    gender: Option<Gender>,
    goal: Option<WorkoutGoal>,
) -> Result<UserInfoRequest, ValidationError> {
    let (height, weight) = (height.trim(), weight.trim());
    if height.is_empty() {
        return Err(ValidationError::MissingHeight);
    }
    if weight.is_empty() {
        return Err(ValidationError::MissingWeight);
    }
    let gender = gender.ok_or(ValidationError::MissingGender)?;
    let workout_goal = goal.ok_or(ValidationError::MissingGoal)?;

    let height_cm = height
        .parse::<i32>()
        .ok()
        .filter(|h| *h > 0)
        .ok_or(ValidationError::InvalidHeight)?;
    let weight_kg = weight
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite() && *w > 0.0)
        .ok_or(ValidationError::InvalidWeight)?;

    Ok(UserInfoRequest {
        email: email.trim().to_owned(),
        height_cm,
        weight_kg,
        gender,
        workout_goal,
    })
}

/// `local@domain.tld`. Single-label domains such as `me@localhost` are refused.
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
        && email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'))
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(ValidationError::UnknownOption(other.to_owned())),
        }
    }
}

impl FromStr for WorkoutGoal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight-loss" => Ok(WorkoutGoal::WeightLoss),
            "muscle-gain" => Ok(WorkoutGoal::MuscleGain),
            "fitness" => Ok(WorkoutGoal::Fitness),
            "mass-gain" => Ok(WorkoutGoal::MassGain),
            "balance" => Ok(WorkoutGoal::Balance),
            other => Err(ValidationError::UnknownOption(other.to_owned())),
        }
    }
}
