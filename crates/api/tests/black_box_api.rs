use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use congregate_api::{
    app::{AppServices, build_app},
    config::AppConfig,
    seed::{Seed, SeedProfile},
};
use congregate_auth::{InMemoryProfileDirectory, JwtClaims, Profile, ProfileDirectory, Role};
use congregate_core::{CacheLimits, OrganizationId, ResolutionError, UserId};
use congregate_tenant::{
    BrandColor, InMemoryOrganizationDirectory, Organization, OrganizationDirectory, OrganizationSlug,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(config: AppConfig, services: AppServices) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(&config, services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn seeded(config: AppConfig, seed: &Seed) -> Self {
        let limits = config.cache;
        Self::spawn(config, AppServices::in_memory(seed, limits)).await
    }

    /// Seeded server that also hands back its directories, to change data under it.
    async fn with_directories(config: AppConfig, seed: &Seed) -> (Self, Directories) {
        let directories = Directories {
            profiles: Arc::new(InMemoryProfileDirectory::new()),
            organizations: Arc::new(InMemoryOrganizationDirectory::new()),
        };
        seed.apply(&directories.profiles, &directories.organizations);

        let services = AppServices::new(
            directories.profiles.clone(),
            directories.organizations.clone(),
            config.cache,
        );
        (Self::spawn(config, services).await, directories)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Directories {
    profiles: Arc<InMemoryProfileDirectory>,
    organizations: Arc<InMemoryOrganizationDirectory>,
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        resolve_wait: Duration::from_secs(2),
        ..AppConfig::default()
    }
}

/// Client that reports redirects instead of following them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn grace() -> Organization {
    Organization {
        id: OrganizationId::new(),
        name: "Grace Chapel".into(),
        primary_color: BrandColor::parse("#1e40af").unwrap(),
        secondary_color: BrandColor::parse("#f59e0b").unwrap(),
        slug: OrganizationSlug::parse("grace").unwrap(),
    }
}

struct World {
    seed: Seed,
    org: Organization,
    participant: UserId,
    admin: UserId,
    editor: UserId,
    no_profile: UserId,
}

fn world() -> World {
    let org = grace();
    let participant = UserId::new();
    let admin = UserId::new();
    let editor = UserId::new();

    let profile = |user_id, role: Role| SeedProfile {
        user_id,
        profile: Profile::new(role).in_organization(org.id),
    };

    let seed = Seed {
        organizations: vec![org.clone()],
        profiles: vec![
            profile(participant, Role::PARTICIPANT),
            profile(admin, Role::ADMIN),
            profile(editor, Role::new("editor")),
        ],
    };

    World {
        seed,
        org,
        participant,
        admin,
        editor,
        no_profile: UserId::new(),
    }
}

fn mint_jwt(user: UserId) -> String {
    mint_jwt_window(user, ChronoDuration::minutes(-1), ChronoDuration::minutes(10))
}

fn mint_jwt_window(user: UserId, issued: ChronoDuration, expires: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user,
        organization_id: None,
        issued_at: now + issued,
        expires_at: now + expires,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(reqwest::header::LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
}

/// Organization directory that fails until `healthy` is set.
struct FlakyOrganizations {
    healthy: AtomicBool,
    org: Organization,
}

#[async_trait]
impl OrganizationDirectory for FlakyOrganizations {
    async fn find_by_slug(&self, slug: &OrganizationSlug) -> Result<Option<Organization>, ResolutionError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(ResolutionError::new("organizations table unavailable"));
        }
        Ok((self.org.slug == *slug).then(|| self.org.clone()))
    }

    async fn find_by_id(&self, id: OrganizationId) -> Result<Option<Organization>, ResolutionError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(ResolutionError::new("organizations table unavailable"));
        }
        Ok((self.org.id == id).then(|| self.org.clone()))
    }
}

/// Profile directory that never answers.
struct StalledDirectory;

#[async_trait]
impl ProfileDirectory for StalledDirectory {
    async fn fetch_profile(&self, _user: UserId) -> Result<Option<Profile>, ResolutionError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn health_is_public() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client().get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login_with_return_path() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client().get(srv.url("/dashboard/reports")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login?redirect_to=%2Fdashboard%2Freports");
}

#[tokio::test]
async fn invalid_or_expired_token_is_treated_as_anonymous() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;
    let expired = mint_jwt_window(w.admin, ChronoDuration::minutes(-20), ChronoDuration::minutes(-10));

    for token in [expired.as_str(), "garbage"] {
        let res = client()
            .get(srv.url("/dashboard"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login?redirect_to=%2Fdashboard");
    }
}

#[tokio::test]
async fn user_without_profile_is_sent_to_login() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/programs"))
        .bearer_auth(mint_jwt(w.no_profile))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login?redirect_to=%2Fprograms");
}

#[tokio::test]
async fn participant_is_sent_to_tenant_root() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/dashboard"))
        .bearer_auth(mint_jwt(w.participant))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn participant_can_open_programs() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/programs"))
        .bearer_auth(mint_jwt(w.participant))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "programs");
    assert_eq!(body["session"]["role"], "participant");
}

#[tokio::test]
async fn other_role_without_access_is_sent_to_dashboard() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/dashboard/reports"))
        .bearer_auth(mint_jwt(w.editor))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard");
}

#[tokio::test]
async fn strict_fallbacks_refuse_unmapped_roles() {
    let w = world();
    let config = AppConfig {
        strict_fallbacks: true,
        ..test_config()
    };
    let srv = TestServer::seeded(config, &w.seed).await;

    let res = client()
        .get(srv.url("/dashboard/reports"))
        .bearer_auth(mint_jwt(w.editor))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn admin_renders_reports_with_tenant_branding() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/dashboard/reports"))
        .bearer_auth(mint_jwt(w.admin))
        .header("X-Organization", "grace")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "reports");
    assert_eq!(body["tenant"]["organization"]["slug"], "grace");
    assert_eq!(body["tenant"]["organization"]["primary_color"], "#1e40af");
    assert_eq!(body["tenant"]["loading"], false);
}

#[tokio::test]
async fn tenant_falls_back_to_profile_organization() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/whoami"))
        .bearer_auth(mint_jwt(w.admin))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["session"]["user_id"], w.admin.to_string());
    assert_eq!(body["session"]["organization_ref"], w.org.id.to_string());
    assert_eq!(body["tenant"]["organization"]["name"], "Grace Chapel");
}

#[tokio::test]
async fn unknown_tenant_renders_with_empty_organization() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/"))
        .header("X-Organization", "nowhere")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "home");
    assert!(body["tenant"]["organization"].is_null());
    assert!(body["tenant"]["error"].is_null());
}

#[tokio::test]
async fn login_view_echoes_safe_return_location_only() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .get(srv.url("/login?redirect_to=%2Fdashboard%2Freports"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["view"], "login");
    assert_eq!(body["redirect_to"], "/dashboard/reports");

    let res = client()
        .get(srv.url("/login?redirect_to=%2F%2Fevil.example"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.get("redirect_to").is_none());
}

#[tokio::test]
async fn pending_profile_shows_loading_placeholder() {
    let config = AppConfig {
        resolve_wait: Duration::ZERO,
        ..test_config()
    };
    let services = AppServices::new(
        Arc::new(StalledDirectory),
        Arc::new(InMemoryOrganizationDirectory::new()),
        CacheLimits::default(),
    );
    let srv = TestServer::spawn(config, services).await;

    let res = client()
        .get(srv.url("/dashboard"))
        .bearer_auth(mint_jwt(UserId::new()))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.headers()[reqwest::header::RETRY_AFTER], "1");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "loading");
}

#[tokio::test]
async fn profile_resolution_eventually_unblocks_the_guard() {
    let config = AppConfig {
        resolve_wait: Duration::ZERO,
        ..test_config()
    };
    let profiles = Arc::new(InMemoryProfileDirectory::new());
    let admin = UserId::new();
    profiles.upsert(admin, Profile::new(Role::ADMIN));
    let services = AppServices::new(
        profiles,
        Arc::new(InMemoryOrganizationDirectory::new()),
        CacheLimits::default(),
    );
    let srv = TestServer::spawn(config, services).await;

    let client = client();
    let token = mint_jwt(admin);

    // The first request may observe the lookup in flight; poll until it lands.
    for _ in 0..50 {
        let res = client
            .get(srv.url("/dashboard"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();

        match res.status() {
            StatusCode::OK => return,
            StatusCode::ACCEPTED => tokio::time::sleep(Duration::from_millis(10)).await,
            other => panic!("unexpected status {other}"),
        }
    }

    panic!("profile did not resolve within timeout");
}

#[tokio::test]
async fn profile_created_after_first_visit_is_picked_up() {
    let w = world();
    let (srv, dirs) = TestServer::with_directories(test_config(), &w.seed).await;
    let token = mint_jwt(w.no_profile);

    let res = client()
        .get(srv.url("/programs"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    dirs.profiles.upsert(w.no_profile, Profile::new(Role::PARTICIPANT));

    let res = client()
        .get(srv.url("/programs"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_drops_cached_profile() {
    let w = world();
    let (srv, dirs) = TestServer::with_directories(test_config(), &w.seed).await;
    let client = client();
    let token = mint_jwt(w.participant);

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/");

    // Promotion is not visible while the profile is cached.
    dirs.profiles.upsert(w.participant, Profile::new(Role::OWNER));
    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = client
        .post(srv.url("/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_logout_is_a_no_op() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client().post(srv.url("/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn session_refresh_returns_updated_role() {
    let w = world();
    let (srv, dirs) = TestServer::with_directories(test_config(), &w.seed).await;
    let client = client();
    let token = mint_jwt(w.participant);

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["session"]["role"], "participant");

    dirs.profiles.upsert(w.participant, Profile::new(Role::ADMIN).in_organization(w.org.id));

    let res = client
        .post(srv.url("/session/refresh"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "admin");
    assert_eq!(body["organization_ref"], w.org.id.to_string());

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn newer_token_resolves_profile_again() {
    let w = world();
    let (srv, dirs) = TestServer::with_directories(test_config(), &w.seed).await;
    let client = client();

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(mint_jwt(w.participant))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/");

    dirs.profiles.upsert(w.participant, Profile::new(Role::OWNER));

    // `iat` has whole-second precision; the new token must be issued after the cached lookup.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let fresh = mint_jwt_window(w.participant, ChronoDuration::zero(), ChronoDuration::minutes(10));

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(fresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn staff_can_refresh_organization_branding() {
    let w = world();
    let (srv, dirs) = TestServer::with_directories(test_config(), &w.seed).await;
    let client = client();
    let token = mint_jwt(w.admin);

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["tenant"]["organization"]["primary_color"], "#1e40af");

    let mut rebranded = w.org.clone();
    rebranded.primary_color = BrandColor::parse("#0f766e").unwrap();
    dirs.organizations.upsert(rebranded);

    let res = client
        .post(srv.url("/organization/refresh"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["organization"]["primary_color"], "#0f766e");

    let res = client
        .get(srv.url("/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["tenant"]["organization"]["primary_color"], "#0f766e");
}

#[tokio::test]
async fn participants_cannot_refresh_organization() {
    let w = world();
    let srv = TestServer::seeded(test_config(), &w.seed).await;

    let res = client()
        .post(srv.url("/organization/refresh"))
        .bearer_auth(mint_jwt(w.participant))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn tenant_lookup_failure_is_not_remembered() {
    let w = world();
    let organizations = Arc::new(FlakyOrganizations {
        healthy: AtomicBool::new(false),
        org: w.org.clone(),
    });
    let services = AppServices::new(
        Arc::new(InMemoryProfileDirectory::new()),
        organizations.clone(),
        CacheLimits::default(),
    );
    let srv = TestServer::spawn(test_config(), services).await;
    let client = client();

    let res = client
        .get(srv.url("/"))
        .header("X-Organization", "grace")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["tenant"]["organization"].is_null());
    assert_eq!(body["tenant"]["error"]["message"], "organizations table unavailable");

    organizations.healthy.store(true, Ordering::SeqCst);

    let res = client
        .get(srv.url("/"))
        .header("X-Organization", "grace")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["tenant"]["error"].is_null());
    assert_eq!(body["tenant"]["organization"]["slug"], "grace");
}
