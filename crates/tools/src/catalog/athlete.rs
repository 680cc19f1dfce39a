use crate::context::ToolContext;
use crate::definition::ToolDefinition;
use crate::error::ToolError;
use crate::role::Role;
use crate::store::{PersonalRecord, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DEFAULT_WORKOUT_LIMIT: u32 = 10;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecentWorkoutsParams {
    /// How many workouts to return, newest first. Defaults to 10.
    #[serde(default)]
    #[schemars(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

pub struct GetRecentWorkouts;

#[async_trait]
impl ToolDefinition for GetRecentWorkouts {
    type Params = RecentWorkoutsParams;
    type Output = Vec<Workout>;

    fn name(&self) -> &'static str {
        "getRecentWorkouts"
    }

    fn description(&self) -> &'static str {
        "List the user's most recent logged workouts, newest first."
    }

    async fn execute(
        &self,
        params: RecentWorkoutsParams,
        ctx: &ToolContext,
    ) -> Result<Vec<Workout>, ToolError> {
        let limit = params.limit.unwrap_or(DEFAULT_WORKOUT_LIMIT) as usize;
        Ok(ctx.store().recent_workouts(ctx.user_id(), limit).await?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    /// Start of the rolling window ending at `now`.
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 365,
        };
        now - Duration::days(days)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VolumeAnalyticsParams {
    pub period: Period,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalytics {
    pub period: Period,
    pub since: DateTime<Utc>,
    pub workouts: usize,
    pub total_minutes: u64,
    pub total_volume_kg: f64,
    pub average_volume_kg: f64,
}

impl VolumeAnalytics {
    pub fn summarize(period: Period, since: DateTime<Utc>, workouts: &[Workout]) -> Self {
        let total_volume_kg: f64 = workouts.iter().map(|w| w.volume_kg).sum();
        let total_minutes = workouts.iter().map(|w| u64::from(w.duration_minutes)).sum();
        let average_volume_kg = if workouts.is_empty() {
            0.0
        } else {
            total_volume_kg / workouts.len() as f64
        };

        Self {
            period,
            since,
            workouts: workouts.len(),
            total_minutes,
            total_volume_kg,
            average_volume_kg,
        }
    }
}

pub struct GetVolumeAnalytics;

#[async_trait]
impl ToolDefinition for GetVolumeAnalytics {
    type Params = VolumeAnalyticsParams;
    type Output = VolumeAnalytics;

    fn name(&self) -> &'static str {
        "getVolumeAnalytics"
    }

    fn description(&self) -> &'static str {
        "Summarize training volume and time over the last week, month or year."
    }

    fn minimum_role(&self) -> Option<Role> {
        Some(Role::Premium)
    }

    async fn execute(
        &self,
        params: VolumeAnalyticsParams,
        ctx: &ToolContext,
    ) -> Result<VolumeAnalytics, ToolError> {
        let since = params.period.start(Utc::now());
        let workouts = ctx.store().workouts_since(ctx.user_id(), since).await?;
        Ok(VolumeAnalytics::summarize(params.period, since, &workouts))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonalRecordsParams {
    /// Only records whose exercise name contains this text.
    #[serde(default)]
    #[schemars(length(min = 1, max = 100))]
    pub exercise: Option<String>,
}

pub struct GetPersonalRecords;

#[async_trait]
impl ToolDefinition for GetPersonalRecords {
    type Params = PersonalRecordsParams;
    type Output = Vec<PersonalRecord>;

    fn name(&self) -> &'static str {
        "getPersonalRecords"
    }

    fn description(&self) -> &'static str {
        "List the user's personal records, optionally for one exercise."
    }

    fn minimum_role(&self) -> Option<Role> {
        Some(Role::Premium)
    }

    async fn execute(
        &self,
        params: PersonalRecordsParams,
        ctx: &ToolContext,
    ) -> Result<Vec<PersonalRecord>, ToolError> {
        let mut records = ctx.store().personal_records(ctx.user_id()).await?;
        if let Some(exercise) = params.exercise {
            let needle = exercise.to_lowercase();
            records.retain(|r| r.exercise.to_lowercase().contains(&needle));
        }
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::privileged::create_context_with_role;
    use crate::memory_store::{demo_ids, MemoryStore};
    use std::sync::Arc;
    use uuid::Uuid;

    fn premium() -> ToolContext {
        create_context_with_role(
            Arc::new(MemoryStore::demo()),
            demo_ids::PREMIUM_ATHLETE,
            Role::Premium,
        )
    }

    #[tokio::test]
    async fn test_recent_workouts_default_limit() {
        let workouts = GetRecentWorkouts
            .execute(RecentWorkoutsParams { limit: None }, &premium())
            .await
            .unwrap();
        assert_eq!(workouts.len(), 4);

        let limited = GetRecentWorkouts
            .execute(RecentWorkoutsParams { limit: Some(1) }, &premium())
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_volume_window() {
        let week = GetVolumeAnalytics
            .execute(VolumeAnalyticsParams { period: Period::Week }, &premium())
            .await
            .unwrap();
        assert_eq!(week.workouts, 2);
        assert_eq!(week.total_volume_kg, 16_350.0);

        let month = GetVolumeAnalytics
            .execute(VolumeAnalyticsParams { period: Period::Month }, &premium())
            .await
            .unwrap();
        assert_eq!(month.workouts, 3);
    }

    #[test]
    fn test_summarize_empty() {
        let now = Utc::now();
        let summary = VolumeAnalytics::summarize(Period::Year, now, &[]);
        assert_eq!(summary.workouts, 0);
        assert_eq!(summary.average_volume_kg, 0.0);
    }

    #[test]
    fn test_summarize_average() {
        let now = Utc::now();
        let workout = |volume: f64| Workout {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            performed_at: now,
            kind: "strength".into(),
            duration_minutes: 30,
            volume_kg: volume,
        };
        let summary = VolumeAnalytics::summarize(Period::Week, now, &[workout(100.0), workout(300.0)]);
        assert_eq!(summary.average_volume_kg, 200.0);
        assert_eq!(summary.total_minutes, 60);
    }

    #[tokio::test]
    async fn test_personal_records_filter() {
        let all = GetPersonalRecords
            .execute(PersonalRecordsParams { exercise: None }, &premium())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let squat = GetPersonalRecords
            .execute(
                PersonalRecordsParams {
                    exercise: Some("SQUAT".into()),
                },
                &premium(),
            )
            .await
            .unwrap();
        assert_eq!(squat.len(), 1);

        let bench = GetPersonalRecords
            .execute(
                PersonalRecordsParams {
                    exercise: Some("bench".into()),
                },
                &premium(),
            )
            .await
            .unwrap();
        assert!(bench.is_empty());
    }

    #[test]
    fn test_period_start() {
        let now = Utc::now();
        assert_eq!(now - Period::Week.start(now), Duration::days(7));
        assert_eq!(now - Period::Year.start(now), Duration::days(365));
    }
}
