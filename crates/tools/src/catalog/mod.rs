//! Demo tool catalog for the athlete and coach personas.
//!
//! Both sets share `getUserProfile`; everything else is curated into exactly
//! one persona.

mod athlete;
mod coach;
mod profile;

pub use athlete::{
    GetPersonalRecords, GetRecentWorkouts, GetVolumeAnalytics, Period, PersonalRecordsParams,
    RecentWorkoutsParams, VolumeAnalytics, VolumeAnalyticsParams,
};
pub use coach::{ClientListParams, ClientProfileParams, GetClientList, GetClientProfile};
pub use profile::{GetUserProfile, NoParams};

use crate::definition::ToolOutput;
use crate::error::RegistryError;
use crate::registry::ToolSet;
use crate::store::{ClientProfile, UserProfile};

impl ToolOutput for UserProfile {}
impl ToolOutput for ClientProfile {}
impl ToolOutput for VolumeAnalytics {}

pub const ATHLETE_PERSONA: &str = "athlete";
pub const COACH_PERSONA: &str = "coach";

pub fn athlete_tools() -> Result<ToolSet, RegistryError> {
    let mut set = ToolSet::new(ATHLETE_PERSONA);
    set.register(GetUserProfile)?
        .register(GetRecentWorkouts)?
        .register(GetVolumeAnalytics)?
        .register(GetPersonalRecords)?;
    Ok(set)
}

pub fn coach_tools() -> Result<ToolSet, RegistryError> {
    let mut set = ToolSet::new(COACH_PERSONA);
    set.register(GetUserProfile)?
        .register(GetClientList)?
        .register(GetClientProfile)?;
    Ok(set)
}
