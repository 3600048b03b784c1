use axum::{Json, extract::Query};
use serde::Deserialize;

use crate::app::dto::PageView;
use crate::context::{CurrentOrganization, CurrentSession};
use crate::guard::sanitize_return_to;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    redirect_to: Option<String>,
}

/// Tenant root. Public; participants land here.
pub async fn home(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
) -> Json<PageView> {
    Json(PageView::new("home", tenant, &session))
}

pub async fn login(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
    Query(query): Query<LoginQuery>,
) -> Json<PageView> {
    let mut view = PageView::new("login", tenant, &session);
    view.redirect_to = sanitize_return_to(query.redirect_to.as_deref());
    Json(view)
}

pub async fn programs(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
) -> Json<PageView> {
    Json(PageView::new("programs", tenant, &session))
}

pub async fn dashboard(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
) -> Json<PageView> {
    Json(PageView::new("dashboard", tenant, &session))
}

pub async fn reports(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
) -> Json<PageView> {
    Json(PageView::new("reports", tenant, &session))
}
