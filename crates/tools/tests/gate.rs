#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Permission gate behavior across the bind → dispatch path.

use async_trait::async_trait;
use proptest::prelude::*;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stride_tools::context::privileged::create_context_with_role;
use stride_tools::memory_store::demo_ids;
use stride_tools::*;

#[derive(Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct SpyParams {
    #[schemars(range(min = 1, max = 10))]
    sets: u32,
}

/// Counts executions so tests can prove the gate stopped a call.
struct Spy {
    name: &'static str,
    minimum: Option<Role>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolDefinition for Spy {
    type Params = SpyParams;
    type Output = Value;

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Counts its executions"
    }

    fn minimum_role(&self) -> Option<Role> {
        self.minimum
    }

    async fn execute(&self, params: SpyParams, _ctx: &ToolContext) -> Result<Value, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"sets": params.sets}))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct Empty {}

struct Panics;

#[async_trait]
impl ToolDefinition for Panics {
    type Params = Empty;
    type Output = Value;

    fn name(&self) -> &'static str {
        "panics"
    }

    fn description(&self) -> &'static str {
        "Always panics"
    }

    async fn execute(&self, _params: Empty, _ctx: &ToolContext) -> Result<Value, ToolError> {
        panic!("connection string leaked: postgres://admin:hunter2@db");
    }
}

struct Sleeps(Arc<AtomicUsize>);

#[async_trait]
impl ToolDefinition for Sleeps {
    type Params = Empty;
    type Output = Value;

    fn name(&self) -> &'static str {
        "sleeps"
    }

    fn description(&self) -> &'static str {
        "Never finishes in time"
    }

    async fn execute(&self, _params: Empty, _ctx: &ToolContext) -> Result<Value, ToolError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct WorkoutLookup {
    id: String,
}

/// Reports its own outcome through the envelope instead of `ToolError`.
struct FindsWorkout;

#[async_trait]
impl ToolDefinition for FindsWorkout {
    type Params = WorkoutLookup;
    type Output = ToolResult<Value>;

    fn name(&self) -> &'static str {
        "findWorkout"
    }

    fn description(&self) -> &'static str {
        "Looks up one workout by id"
    }

    async fn execute(
        &self,
        params: WorkoutLookup,
        _ctx: &ToolContext,
    ) -> Result<ToolResult<Value>, ToolError> {
        if params.id == "w-1" {
            Ok(ToolResult::success(json!({"id": "w-1", "kind": "run"})))
        } else {
            Ok(ToolResult::failure(ErrorKind::NotFound, "no such workout"))
        }
    }
}

fn spy_set(minimum: Option<Role>) -> (ToolSet, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut set = ToolSet::new("test");
    set.register(Spy {
        name: "spy",
        minimum,
        calls: calls.clone(),
    })
    .unwrap();
    (set, calls)
}

fn context(role: Role) -> ToolContext {
    create_context_with_role(Arc::new(MemoryStore::demo()), demo_ids::PREMIUM_ATHLETE, role)
}

async fn resolved(user_id: &str) -> ToolContext {
    create_context(Arc::new(MemoryStore::demo()), user_id).await.unwrap()
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn minimum_strategy() -> impl Strategy<Value = Option<Role>> {
    prop::option::of(role_strategy())
}

proptest! {
    #[test]
    fn prop_insufficient_role_never_executes(role in role_strategy(), minimum in role_strategy(), sets in 1u32..=10) {
        prop_assume!(role < minimum);
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (set, calls) = spy_set(Some(minimum));
        let bound = bind(&context(role), &set);

        let result = rt.block_on(bound.dispatch("spy", &json!({"sets": sets})));

        prop_assert_eq!(result.error_kind(), Some(ErrorKind::PermissionDenied));
        prop_assert_eq!(&result.error().unwrap().message, PLAN_RESTRICTED_MESSAGE);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_sufficient_role_is_never_denied(role in role_strategy(), minimum in minimum_strategy(), sets in 1u32..=10) {
        prop_assume!(role.satisfies(minimum));
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (set, calls) = spy_set(minimum);
        let bound = bind(&context(role), &set);

        let result = rt.block_on(bound.dispatch("spy", &json!({"sets": sets})));

        prop_assert!(result.error_kind() != Some(ErrorKind::PermissionDenied));
        prop_assert_eq!(result.data(), Some(&json!({"sets": sets})));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prop_invalid_arguments_never_execute(role in role_strategy(), minimum in minimum_strategy(), sets in 11u32..1000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (set, calls) = spy_set(minimum);
        let bound = bind(&context(role), &set);

        let result = rt.block_on(bound.dispatch("spy", &json!({"sets": sets})));

        prop_assert_eq!(result.error_kind(), Some(ErrorKind::ValidationError));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_validation_runs_before_authorization() {
    let (set, calls) = spy_set(Some(Role::Coach));
    let bound = bind(&context(Role::Free), &set);

    let invalid = bound.dispatch("spy", &json!({"sets": "many"})).await;
    assert_eq!(invalid.error_kind(), Some(ErrorKind::ValidationError));
    assert!(invalid.error().unwrap().message.contains("sets"));

    let valid = bound.dispatch("spy", &json!({"sets": 3})).await;
    assert_eq!(valid.error_kind(), Some(ErrorKind::PermissionDenied));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tool_envelope_is_not_rewrapped() {
    let mut set = ToolSet::new("test");
    set.register(FindsWorkout).unwrap();
    let bound = bind(&context(Role::Free), &set);

    let missing = bound.dispatch("findWorkout", &json!({"id": "w-9"})).await;
    assert_eq!(missing.error_kind(), Some(ErrorKind::NotFound));
    assert_eq!(
        serde_json::to_value(&missing).unwrap(),
        json!({"success": false, "error": {"code": "NOT_FOUND", "message": "no such workout"}})
    );

    let found = bound.dispatch("findWorkout", &json!({"id": "w-1"})).await;
    assert_eq!(found.data(), Some(&json!({"id": "w-1", "kind": "run"})));
}

#[tokio::test]
async fn test_panic_becomes_internal_error() {
    let mut set = ToolSet::new("test");
    set.register(Panics).unwrap();
    let bound = bind(&context(Role::Coach), &set);

    let result = bound.dispatch("panics", &json!({})).await;
    let body = result.error().unwrap();
    assert_eq!(body.code, ErrorKind::InternalError);
    assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
    assert!(!serde_json::to_string(&result).unwrap().contains("hunter2"));

    // The bound set stays usable after a panic.
    let again = bound.dispatch("panics", &json!(null)).await;
    assert_eq!(again.error_kind(), Some(ErrorKind::InternalError));
}

#[tokio::test]
async fn test_timeout_becomes_internal_error() {
    let finished = Arc::new(AtomicUsize::new(0));
    let mut set = ToolSet::new("test");
    set.register(Sleeps(finished.clone())).unwrap();
    let bound = Binder::with_timeout(Duration::from_millis(50)).bind(&context(Role::Free), &set);

    let result = bound.dispatch("sleeps", &json!({})).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::InternalError));

    // Aborted tasks never finish.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_membership_is_an_independent_gate() {
    let athlete = athlete_tools().unwrap();
    let bound = bind(&context(Role::Coach), &athlete);

    let result = bound.dispatch("getClientList", &json!({})).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::ValidationError));
    assert!(!bound.names().contains(&"getClientList".to_string()));
}

#[tokio::test]
async fn test_bound_decision_is_fixed_per_context() {
    let (set, calls) = spy_set(Some(Role::Premium));
    let free = bind(&context(Role::Free), &set);
    let premium = bind(&context(Role::Premium), &set);

    assert!(!free.get("spy").unwrap().is_permitted());
    assert!(premium.get("spy").unwrap().is_permitted());

    assert!(premium.dispatch("spy", &json!({"sets": 1})).await.is_success());
    assert!(!free.dispatch("spy", &json!({"sets": 1})).await.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_manifest_matches_enforced_schema() {
    let (set, _) = spy_set(None);
    let bound = bind(&context(Role::Free), &set);
    let manifest = bound.manifest();

    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].schema["properties"]["sets"]["maximum"].as_f64(), Some(10.0));
    assert_eq!(manifest[0].schema["required"], json!(["sets"]));
}

// Scenario: free athlete asks for premium analytics.
#[tokio::test]
async fn test_scenario_free_volume_analytics_denied() {
    let ctx = resolved(demo_ids::FREE_ATHLETE).await;
    assert_eq!(ctx.role(), Role::Free);
    let bound = bind(&ctx, &athlete_tools().unwrap());

    let result = bound
        .dispatch("getVolumeAnalytics", &json!({"period": "week"}))
        .await;
    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["success"], json!(false));
    assert_eq!(wire["error"]["code"], json!("PERMISSION_DENIED"));
}

// Scenario: premium athlete reads their own profile.
#[tokio::test]
async fn test_scenario_premium_user_profile() {
    let ctx = resolved(demo_ids::PREMIUM_ATHLETE).await;
    assert_eq!(ctx.role(), Role::Premium);
    let bound = bind(&ctx, &athlete_tools().unwrap());

    let result = bound.dispatch("getUserProfile", &json!({})).await;
    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["success"], json!(true));
    assert_eq!(wire["data"]["name"], json!("Premium Tier Athlete"));
}

// Scenario: coach lists active clients.
#[tokio::test]
async fn test_scenario_coach_client_list() {
    let ctx = resolved(demo_ids::COACH).await;
    assert_eq!(ctx.role(), Role::Coach);
    let bound = bind(&ctx, &coach_tools().unwrap());

    let result = bound
        .dispatch("getClientList", &json!({"status": "active"}))
        .await;
    assert!(result.is_success());
    let clients = result.data().unwrap().as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["clientId"], json!(demo_ids::ACTIVE_CLIENT.to_string()));
}

// Scenario: premium athlete bound to the coach set.
#[tokio::test]
async fn test_scenario_premium_client_list_denied() {
    let ctx = resolved(demo_ids::PREMIUM_ATHLETE).await;
    let bound = bind(&ctx, &coach_tools().unwrap());

    let result = bound.dispatch("getClientList", &json!({})).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::PermissionDenied));
}

// Scenario: malformed client id.
#[tokio::test]
async fn test_scenario_client_profile_bad_uuid() {
    let ctx = resolved(demo_ids::COACH).await;
    let bound = bind(&ctx, &coach_tools().unwrap());

    let result = bound
        .dispatch("getClientProfile", &json!({"clientId": "not-a-uuid"}))
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::ValidationError));
    assert!(result.error().unwrap().message.contains("clientId"));
}

#[tokio::test]
async fn test_client_profile_off_roster_is_not_found() {
    let ctx = resolved(demo_ids::COACH).await;
    let bound = bind(&ctx, &coach_tools().unwrap());

    let result = bound
        .dispatch(
            "getClientProfile",
            &json!({"clientId": "00000000-0000-0000-0000-000000000000"}),
        )
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_concurrent_dispatch_same_context() {
    let ctx = resolved(demo_ids::PREMIUM_ATHLETE).await;
    let bound = bind(&ctx, &athlete_tools().unwrap());

    let calls = vec![
        ("getUserProfile".to_string(), json!({})),
        ("getRecentWorkouts".to_string(), json!({"limit": 2})),
        ("getVolumeAnalytics".to_string(), json!({"period": "month"})),
        ("getPersonalRecords".to_string(), json!({})),
    ];
    let results = bound.dispatch_all(&calls).await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(ToolResult::is_success));
    assert_eq!(results[1].data().unwrap().as_array().unwrap().len(), 2);
}
