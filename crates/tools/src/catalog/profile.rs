use crate::context::ToolContext;
use crate::definition::ToolDefinition;
use crate::error::ToolError;
use crate::store::UserProfile;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments of tools that take none.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

/// The caller's own profile.
pub struct GetUserProfile;

#[async_trait]
impl ToolDefinition for GetUserProfile {
    type Params = NoParams;
    type Output = UserProfile;

    fn name(&self) -> &'static str {
        "getUserProfile"
    }

    fn description(&self) -> &'static str {
        "Get the current user's profile: name, training goals and preferred units."
    }

    async fn execute(&self, _params: NoParams, ctx: &ToolContext) -> Result<UserProfile, ToolError> {
        ctx.store()
            .user_profile(ctx.user_id())
            .await?
            .ok_or_else(|| ToolError::NotFound("No profile exists for this user".into()))
    }
}
