use crate::context::ToolContext;
use crate::definition::ToolDefinition;
use crate::error::ToolError;
use crate::role::Role;
use crate::store::{ClientProfile, ClientStatus, ClientSummary};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientListParams {
    /// Restrict to active or inactive clients.
    #[serde(default)]
    pub status: Option<ClientStatus>,
}

pub struct GetClientList;

#[async_trait]
impl ToolDefinition for GetClientList {
    type Params = ClientListParams;
    type Output = Vec<ClientSummary>;

    fn name(&self) -> &'static str {
        "getClientList"
    }

    fn description(&self) -> &'static str {
        "List the clients on the coach's roster with their last workout date."
    }

    fn minimum_role(&self) -> Option<Role> {
        Some(Role::Coach)
    }

    async fn execute(
        &self,
        params: ClientListParams,
        ctx: &ToolContext,
    ) -> Result<Vec<ClientSummary>, ToolError> {
        Ok(ctx.store().clients(ctx.user_id(), params.status).await?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientProfileParams {
    /// Client id as returned by getClientList.
    #[schemars(regex(
        pattern = "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ))]
    pub client_id: Uuid,
}

pub struct GetClientProfile;

#[async_trait]
impl ToolDefinition for GetClientProfile {
    type Params = ClientProfileParams;
    type Output = ClientProfile;

    fn name(&self) -> &'static str {
        "getClientProfile"
    }

    fn description(&self) -> &'static str {
        "Get one client's profile and recent workouts. The client must be on the coach's roster."
    }

    fn minimum_role(&self) -> Option<Role> {
        Some(Role::Coach)
    }

    async fn execute(
        &self,
        params: ClientProfileParams,
        ctx: &ToolContext,
    ) -> Result<ClientProfile, ToolError> {
        ctx.store()
            .client_profile(ctx.user_id(), params.client_id)
            .await?
            .ok_or_else(|| {
                ToolError::NotFound(format!("No client {} on your roster", params.client_id))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::privileged::create_context_with_role;
    use crate::memory_store::{demo_ids, MemoryStore};
    use std::sync::Arc;

    fn coach() -> ToolContext {
        create_context_with_role(Arc::new(MemoryStore::demo()), demo_ids::COACH, Role::Coach)
    }

    #[tokio::test]
    async fn test_client_list_status_filter() {
        let inactive = GetClientList
            .execute(
                ClientListParams {
                    status: Some(ClientStatus::Inactive),
                },
                &coach(),
            )
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].client_id, demo_ids::INACTIVE_CLIENT);
    }

    #[tokio::test]
    async fn test_client_profile_on_roster() {
        let profile = GetClientProfile
            .execute(
                ClientProfileParams {
                    client_id: demo_ids::ACTIVE_CLIENT,
                },
                &coach(),
            )
            .await
            .unwrap();
        assert_eq!(profile.status, ClientStatus::Active);
        assert_eq!(profile.recent_workouts.len(), 1);
    }

    #[tokio::test]
    async fn test_client_profile_off_roster() {
        let result = GetClientProfile
            .execute(
                ClientProfileParams {
                    client_id: Uuid::new_v4(),
                },
                &coach(),
            )
            .await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }
}
