//! Persistence handle consumed by the context provider and the catalog tools.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub units: Units,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    pub user_id: String,
    pub performed_at: DateTime<Utc>,
    pub kind: String,
    pub duration_minutes: u32,
    /// Sum of weight x reps across all sets, in kilograms.
    pub volume_kg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub user_id: String,
    pub exercise: String,
    pub weight_kg: f64,
    pub reps: u32,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
}

/// One athlete on a coach's roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub coach_id: String,
    pub client_id: Uuid,
    pub user_id: String,
    pub status: ClientStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub client_id: Uuid,
    pub name: String,
    pub status: ClientStatus,
    pub last_workout_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub client_id: Uuid,
    pub status: ClientStatus,
    pub profile: UserProfile,
    pub recent_workouts: Vec<Workout>,
}

/// Durable storage as seen by the dispatch layer.
///
/// Implementations must be safe to call concurrently; tools fanned out in
/// the same step share one handle.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persisted subscription tier, `None` when the user has no subscription.
    async fn subscription_tier(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Most recent workouts first.
    async fn recent_workouts(&self, user_id: &str, limit: usize)
        -> Result<Vec<Workout>, StoreError>;

    async fn workouts_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Workout>, StoreError>;

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, StoreError>;

    async fn clients(
        &self,
        coach_id: &str,
        status: Option<ClientStatus>,
    ) -> Result<Vec<ClientSummary>, StoreError>;

    /// `None` when `client_id` is not on the coach's roster.
    async fn client_profile(
        &self,
        coach_id: &str,
        client_id: Uuid,
    ) -> Result<Option<ClientProfile>, StoreError>;
}
