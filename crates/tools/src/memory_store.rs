//! In-memory [`Store`] used by the CLI, demos and tests.

use crate::error::StoreError;
use crate::store::{
    ClientProfile, ClientStatus, ClientSummary, PersonalRecord, RosterEntry, Store, Units,
    UserProfile, Workout,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use uuid::Uuid;

const CLIENT_PROFILE_WORKOUTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub units: Units,
}

/// Seed data, loadable from YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub personal_records: Vec<PersonalRecord>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

pub struct MemoryStore {
    data: RwLock<Fixtures>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_fixtures(Fixtures::default())
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            data: RwLock::new(fixtures),
        }
    }

    /// Store seeded with one athlete per tier and a coach with two clients.
    pub fn demo() -> Self {
        Self::from_fixtures(demo_fixtures(Utc::now()))
    }

    pub fn insert_user(&self, user: UserRecord) -> &Self {
        let mut data = self.data.write();
        data.users.retain(|u| u.user_id != user.user_id);
        data.users.push(user);
        self
    }

    pub fn insert_workout(&self, workout: Workout) -> &Self {
        self.data.write().workouts.push(workout);
        self
    }

    pub fn insert_personal_record(&self, record: PersonalRecord) -> &Self {
        self.data.write().personal_records.push(record);
        self
    }

    pub fn assign_client(&self, entry: RosterEntry) -> &Self {
        let mut data = self.data.write();
        data.roster
            .retain(|r| !(r.coach_id == entry.coach_id && r.client_id == entry.client_id));
        data.roster.push(entry);
        self
    }

    fn profile_of(data: &Fixtures, user_id: &str) -> Option<UserProfile> {
        data.users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| UserProfile {
                user_id: u.user_id.clone(),
                name: u.name.clone(),
                goals: u.goals.clone(),
                units: u.units,
            })
    }

    fn workouts_of(data: &Fixtures, user_id: &str) -> Vec<Workout> {
        let mut workouts: Vec<Workout> = data
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
        workouts
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn subscription_tier(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read();
        Ok(data
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .and_then(|u| u.tier.clone()))
    }

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(Self::profile_of(&self.data.read(), user_id))
    }

    async fn recent_workouts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Workout>, StoreError> {
        let mut workouts = Self::workouts_of(&self.data.read(), user_id);
        workouts.truncate(limit);
        Ok(workouts)
    }

    async fn workouts_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Workout>, StoreError> {
        let mut workouts = Self::workouts_of(&self.data.read(), user_id);
        workouts.retain(|w| w.performed_at >= since);
        Ok(workouts)
    }

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, StoreError> {
        let data = self.data.read();
        Ok(data
            .personal_records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn clients(
        &self,
        coach_id: &str,
        status: Option<ClientStatus>,
    ) -> Result<Vec<ClientSummary>, StoreError> {
        let data = self.data.read();
        let mut clients = Vec::new();

        for entry in data.roster.iter().filter(|r| r.coach_id == coach_id) {
            if status.is_some_and(|s| s != entry.status) {
                continue;
            }
            let profile = Self::profile_of(&data, &entry.user_id).ok_or_else(|| {
                StoreError::Corrupt(format!("roster entry {} has no user", entry.client_id))
            })?;
            let last_workout_at = Self::workouts_of(&data, &entry.user_id)
                .first()
                .map(|w| w.performed_at);

            clients.push(ClientSummary {
                client_id: entry.client_id,
                name: profile.name,
                status: entry.status,
                last_workout_at,
            });
        }

        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn client_profile(
        &self,
        coach_id: &str,
        client_id: Uuid,
    ) -> Result<Option<ClientProfile>, StoreError> {
        let data = self.data.read();
        let Some(entry) = data
            .roster
            .iter()
            .find(|r| r.coach_id == coach_id && r.client_id == client_id)
        else {
            return Ok(None);
        };

        let profile = Self::profile_of(&data, &entry.user_id).ok_or_else(|| {
            StoreError::Corrupt(format!("roster entry {client_id} has no user"))
        })?;
        let mut recent_workouts = Self::workouts_of(&data, &entry.user_id);
        recent_workouts.truncate(CLIENT_PROFILE_WORKOUTS);

        Ok(Some(ClientProfile {
            client_id,
            status: entry.status,
            profile,
            recent_workouts,
        }))
    }
}

/// Well-known ids in [`MemoryStore::demo`].
pub mod demo_ids {
    use uuid::Uuid;

    pub const FREE_ATHLETE: &str = "free-athlete";
    pub const PREMIUM_ATHLETE: &str = "premium-athlete";
    pub const COACH: &str = "coach-1";
    pub const ACTIVE_CLIENT: Uuid = Uuid::from_u128(0x6f1c_2a4e_8d3b_4c7a_9e21_0b5d_3f8a_1c01);
    pub const INACTIVE_CLIENT: Uuid = Uuid::from_u128(0x6f1c_2a4e_8d3b_4c7a_9e21_0b5d_3f8a_1c02);
}

fn demo_fixtures(now: DateTime<Utc>) -> Fixtures {
    use demo_ids::*;

    let user = |user_id: &str, name: &str, tier: Option<&str>, goals: &[&str]| UserRecord {
        user_id: user_id.to_string(),
        name: name.to_string(),
        tier: tier.map(str::to_string),
        goals: goals.iter().map(|g| g.to_string()).collect(),
        units: Units::Metric,
    };
    let workout = |user_id: &str, days_ago: i64, kind: &str, minutes: u32, volume: f64| Workout {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        performed_at: now - Duration::days(days_ago),
        kind: kind.to_string(),
        duration_minutes: minutes,
        volume_kg: volume,
    };

    Fixtures {
        users: vec![
            user(FREE_ATHLETE, "Free Tier Athlete", Some("free"), &["consistency"]),
            user(
                PREMIUM_ATHLETE,
                "Premium Tier Athlete",
                Some("premium"),
                &["squat 180kg", "sub-25 5k"],
            ),
            user(COACH, "Head Coach", Some("coach"), &[]),
            user("client-active", "Active Client", Some("premium"), &["hypertrophy"]),
            user("client-inactive", "Inactive Client", None, &[]),
        ],
        workouts: vec![
            workout(FREE_ATHLETE, 1, "run", 30, 0.0),
            workout(PREMIUM_ATHLETE, 1, "strength", 70, 8_450.0),
            workout(PREMIUM_ATHLETE, 3, "strength", 65, 7_900.0),
            workout(PREMIUM_ATHLETE, 12, "strength", 60, 7_200.0),
            workout(PREMIUM_ATHLETE, 40, "strength", 55, 6_100.0),
            workout("client-active", 2, "strength", 50, 5_300.0),
        ],
        personal_records: vec![PersonalRecord {
            user_id: PREMIUM_ATHLETE.to_string(),
            exercise: "back squat".to_string(),
            weight_kg: 170.0,
            reps: 1,
            achieved_at: now - Duration::days(20),
        }],
        roster: vec![
            RosterEntry {
                coach_id: COACH.to_string(),
                client_id: ACTIVE_CLIENT,
                user_id: "client-active".to_string(),
                status: ClientStatus::Active,
            },
            RosterEntry {
                coach_id: COACH.to_string(),
                client_id: INACTIVE_CLIENT,
                user_id: "client-inactive".to_string(),
                status: ClientStatus::Inactive,
            },
        ],
    }
}
