//! View payloads returned to the frontend.

use serde::Serialize;

use congregate_tenant::TenantState;

use crate::context::SessionContext;

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub organization_ref: Option<String>,
}

impl From<&SessionContext> for SessionSummary {
    fn from(ctx: &SessionContext) -> Self {
        let session = ctx.session();
        Self {
            user_id: session.user.map(|u| u.to_string()),
            role: session.role().map(|r| r.to_string()),
            organization_ref: ctx.organization_claim().map(|o| o.to_string()),
        }
    }
}

/// A rendered view: which page, for which tenant, seen by whom.
///
/// Tenant resolution failures travel as `tenant.error`; they never replace the view.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub view: &'static str,
    pub tenant: TenantState,
    pub session: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl PageView {
    pub fn new(view: &'static str, tenant: TenantState, session: &SessionContext) -> Self {
        Self {
            view,
            tenant,
            session: SessionSummary::from(session),
            redirect_to: None,
        }
    }
}
