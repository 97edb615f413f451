//! Wire types for the backend JSON API

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutGoal {
    WeightLoss,
    MuscleGain,
    Fitness,
    MassGain,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfoRequest {
    pub email: String,
    pub height_cm: i32,
    pub weight_kg: f64,
    pub gender: Gender,
    pub workout_goal: WorkoutGoal,
}

/// Reply shape shared by signup, login and user-info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseImageRequest {
    pub image_base64: String,
}

/// Server-side pose analysis of one sample. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseAnalysis {
    pub knee_angle: f32,
    pub hip_angle: f32,
    pub torso_tilt: f32,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}
