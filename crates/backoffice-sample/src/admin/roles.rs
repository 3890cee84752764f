use async_trait::async_trait;
use backoffice::{DispatchError, Interceptor, RequestContext, ResourceDefinition, AUTHORIZED_ASSIGN};
use serde_json::Value;
use tracing::debug;

/// Assign holding the signed-in user's id.
pub const CURRENT_USER_ID: &str = "current_user_id";
/// Assign holding the signed-in user's role name.
pub const CURRENT_USER_ROLE: &str = "current_user_role";

/// Authorizes the request when the current role is listed in the `roles` option.
///
/// Without a `roles` option only `admin` is let through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireRole;

#[async_trait]
impl Interceptor for RequireRole {
    fn name(&self) -> &str {
        "require_role"
    }

    async fn call(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        action: &str,
        options: &Value,
    ) -> Result<(), DispatchError> {
        let role = ctx
            .get_assign(CURRENT_USER_ROLE)
            .and_then(Value::as_str)
            .map(str::to_string);

        let allowed = match (&role, options.get("roles").and_then(Value::as_array)) {
            (Some(role), Some(roles)) => roles.iter().any(|r| r.as_str() == Some(role)),
            (Some(role), None) => role == "admin",
            (None, _) => false,
        };

        debug!(
            resource = resource.route_key(),
            action,
            role = role.as_deref().unwrap_or("anonymous"),
            allowed,
            "Role check"
        );
        ctx.assign(AUTHORIZED_ASSIGN, allowed);
        Ok(())
    }
}
