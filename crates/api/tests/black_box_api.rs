use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use hrms_auth::JwtClaims;
use hrms_core::{Company, CompanyAdmin, CompanyId, User, UserId, UserRole};
use hrms_infra::{InMemoryRowStore, RowStore};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<dyn RowStore>) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = hrms_api::app::build_app(JWT_SECRET.to_string(), store);
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Two companies; Acme has an admin and an employee, Globex one employee,
/// plus a superadmin with no company.
struct World {
    srv: TestServer,
    client: reqwest::Client,
    acme: CompanyId,
    globex: CompanyId,
    superadmin: UserId,
    acme_admin: UserId,
    acme_employee: UserId,
    globex_employee: UserId,
}

impl World {
    async fn new() -> Self {
        let store = Arc::new(InMemoryRowStore::new());
        let now = Utc::now();

        let acme = Company::new(CompanyId::new(), "Acme", None, now).unwrap();
        let globex = Company::new(CompanyId::new(), "Globex", None, now).unwrap();
        store.insert_company(acme.clone()).await.unwrap();
        store.insert_company(globex.clone()).await.unwrap();

        let superadmin = User::new(UserId::new(), now).with_role(UserRole::Superadmin);
        let acme_admin = User::new(UserId::new(), now)
            .with_company(acme.id)
            .with_role(UserRole::CompanyAdmin);
        let acme_employee = User::new(UserId::new(), now)
            .with_company(acme.id)
            .with_role(UserRole::Employee);
        let globex_employee = User::new(UserId::new(), now)
            .with_company(globex.id)
            .with_role(UserRole::Employee);
        for u in [&superadmin, &acme_admin, &acme_employee, &globex_employee] {
            store.insert_user(u.clone()).await.unwrap();
        }
        store
            .insert_company_admin(CompanyAdmin::new(acme_admin.id, acme.id, now))
            .await
            .unwrap();

        Self {
            srv: TestServer::spawn(store).await,
            client: reqwest::Client::new(),
            acme: acme.id,
            globex: globex.id,
            superadmin: superadmin.id,
            acme_admin: acme_admin.id,
            acme_employee: acme_employee.id,
            globex_employee: globex_employee.id,
        }
    }

    async fn get(&self, as_user: UserId, path: &str) -> reqwest::Response {
        self.client
            .get(self.srv.url(path))
            .bearer_auth(mint_jwt(as_user))
            .send()
            .await
            .unwrap()
    }

    async fn send(
        &self,
        method: reqwest::Method,
        as_user: UserId,
        path: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .request(method, self.srv.url(path))
            .bearer_auth(mint_jwt(as_user))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn items(&self, as_user: UserId, path: &str) -> Vec<serde_json::Value> {
        let res = self.get(as_user, path).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        body["items"].as_array().unwrap().clone()
    }
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let world = World::new().await;

    let res = world.client.get(world.srv.url("/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = world
        .client
        .get(world.srv.url("/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = world.client.get(world.srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_reports_the_resolved_actor() {
    let world = World::new().await;

    let res = world.get(world.acme_admin, "/me").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["actor"]["role"], "company_admin");
    assert_eq!(body["actor"]["resolved"], true);
    assert_eq!(body["actor"]["admin_of"], json!([world.acme.to_string()]));
    assert_eq!(body["profile"]["id"], world.acme_admin.to_string());

    // A valid token without a profile row is not an error.
    let res = world.get(UserId::new(), "/me").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["actor"]["resolved"], false);
    assert!(body["profile"].is_null());
}

#[tokio::test]
async fn user_rows_are_filtered_by_role() {
    let world = World::new().await;

    assert_eq!(world.items(world.superadmin, "/users").await.len(), 4);

    let admin_view = world.items(world.acme_admin, "/users").await;
    assert_eq!(admin_view.len(), 2);
    assert!(admin_view.iter().all(|u| u["company_id"] == world.acme.to_string()));

    let own = world.items(world.acme_employee, "/users").await;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["id"], world.acme_employee.to_string());

    // Another company's user is indistinguishable from a missing one.
    let res = world
        .get(world.acme_admin, &format!("/users/{}", world.globex_employee))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_edits_are_self_service_and_cannot_escalate() {
    let world = World::new().await;
    let path = format!("/users/{}", world.acme_employee);

    let res = world
        .send(reqwest::Method::PATCH, world.acme_employee, &path, json!({ "job_title": "Engineer" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["job_title"], "Engineer");

    let res = world
        .send(reqwest::Method::PATCH, world.acme_employee, &path, json!({ "role": "superadmin" }))
        .await;
    assert!(res.status().is_client_error());

    let res = world
        .send(reqwest::Method::PATCH, world.acme_admin, &path, json!({ "job_title": "Intern" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn department_lifecycle_is_scoped_to_company_admins() {
    let world = World::new().await;

    let res = world
        .send(
            reqwest::Method::POST,
            world.acme_admin,
            "/departments",
            json!({ "company_id": world.acme, "name": "Engineering" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let dept: serde_json::Value = res.json().await.unwrap();
    let dept_path = format!("/departments/{}", dept["id"].as_str().unwrap());

    let res = world
        .send(
            reqwest::Method::POST,
            world.acme_admin,
            "/departments",
            json!({ "company_id": world.globex, "name": "Sales" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = world
        .send(reqwest::Method::PATCH, world.acme_admin, &dept_path, json!({ "name": "R&D" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Employees cannot see departments at all.
    assert!(world.items(world.acme_employee, "/departments").await.is_empty());
    assert_eq!(world.get(world.acme_employee, &dept_path).await.status(), StatusCode::NOT_FOUND);

    // Superadmin reads everything but is not a department writer.
    let all = world.items(world.superadmin, "/departments").await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["name"], "R&D");
    let res = world
        .client
        .delete(world.srv.url(&dept_path))
        .bearer_auth(mint_jwt(world.superadmin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = world
        .client
        .delete(world.srv.url(&dept_path))
        .bearer_auth(mint_jwt(world.acme_admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn only_superadmins_grant_company_admin() {
    let world = World::new().await;
    let grant = json!({ "user_id": world.globex_employee, "company_id": world.globex });

    let res = world
        .send(reqwest::Method::POST, world.acme_admin, "/company-admins", grant.clone())
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = world
        .send(reqwest::Method::POST, world.superadmin, "/company-admins", grant)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    // The grant applies from the next request on.
    let res = world
        .send(
            reqwest::Method::POST,
            world.globex_employee,
            "/departments",
            json!({ "company_id": world.globex, "name": "Ops" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Admins see only their own grant rows.
    assert_eq!(world.items(world.acme_admin, "/company-admins").await.len(), 1);
    assert_eq!(world.items(world.superadmin, "/company-admins").await.len(), 2);
}

#[tokio::test]
async fn companies_are_public_but_not_creatable() {
    let world = World::new().await;

    assert_eq!(world.items(world.globex_employee, "/companies").await.len(), 2);

    let res = world
        .send(reqwest::Method::POST, world.superadmin, "/companies", json!({ "name": "Initech" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = world
        .send(
            reqwest::Method::PATCH,
            world.acme_admin,
            &format!("/companies/{}", world.acme),
            json!({ "name": "Acme Corp" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = world
        .send(
            reqwest::Method::PATCH,
            world.acme_admin,
            &format!("/companies/{}", world.globex),
            json!({ "name": "Mine now" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_identity_gets_public_rows_only() {
    let world = World::new().await;
    let ghost = UserId::new();

    assert_eq!(world.items(ghost, "/companies").await.len(), 2);
    assert!(world.items(ghost, "/users").await.is_empty());

    let body: serde_json::Value = world.get(ghost, "/me").await.json().await.unwrap();
    assert_eq!(body["actor"]["resolved"], false);
    assert!(body["profile"].is_null());
}

#[tokio::test]
async fn explain_and_policy_catalogue_endpoints() {
    let world = World::new().await;

    let path = format!(
        "/authz/explain?table=departments&action=insert&company_id={}",
        world.acme
    );
    let body: serde_json::Value = world.get(world.acme_admin, &path).await.json().await.unwrap();
    assert_eq!(body["granted"], true);
    assert_eq!(body["matched_rule"], "Company admins can create departments in their company");

    let body: serde_json::Value = world.get(world.acme_employee, &path).await.json().await.unwrap();
    assert_eq!(body["granted"], false);
    assert_eq!(body["denial_reason"]["kind"], "predicate_false");

    let body: serde_json::Value = world
        .get(world.superadmin, "/authz/explain?table=employee_hierarchy&action=delete&company_id=00000000-0000-0000-0000-000000000000")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["denial_reason"]["kind"], "no_rule_for_action");

    assert_eq!(world.items(world.acme_employee, "/policies").await.len(), 16);

    let res = world.get(world.acme_employee, "/policies/sql").await;
    assert_eq!(res.status(), StatusCode::OK);
    let sql = res.text().await.unwrap();
    assert!(sql.contains("ENABLE ROW LEVEL SECURITY"));
    assert!(sql.contains("CREATE POLICY"));
}
