#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseBackend, Set, Statement};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use bazaar_api::{
    config::AppConfig,
    db,
    entities::{self, ApprovalStatus},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Test harness backed by an in-memory SQLite database.
///
/// The pool is pinned to a single connection; in-memory SQLite gives every
/// connection its own database.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    _event_task: tokio::task::JoinHandle<()>,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 18_080,
        environment: "test".into(),
        log_level: "warn".into(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
        event_channel_capacity: 64,
        checkout_txn_timeout_secs: 30,
        admin_email: "orders@bazaar.test".into(),
        mailer_endpoint: None,
        mailer_api_key: None,
        mail_from: "noreply@bazaar.test".into(),
        default_currency: "USD".into(),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = test_config();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg);

        let state = Arc::new(AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        });

        let router = Router::new()
            .nest("/api/v1", bazaar_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request, optionally carrying proxy-injected identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        identity: Option<(Uuid, &str)>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some((user_id, role)) = identity {
            builder = builder
                .header("x-user-id", user_id.to_string())
                .header("x-user-role", role);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_as(
        &self,
        user_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some((user_id, "USER"))).await
    }

    pub async fn request_as_admin(
        &self,
        user_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some((user_id, "ADMIN"))).await
    }

    pub async fn execute_sql(&self, sql: &str) {
        self.state
            .db
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                sql.to_string(),
            ))
            .await
            .expect("raw sql in test");
    }

    pub async fn seed_customer(&self, email: &str, is_member: bool) -> entities::CustomerModel {
        let now = Utc::now();
        entities::customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            name: Set(format!("Test {}", email)),
            is_member: Set(is_member),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed customer")
    }

    /// An orderable store: already approved and left active.
    pub async fn seed_store(&self, owner_id: Uuid, slug: &str) -> entities::StoreModel {
        let now = Utc::now();
        entities::store::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(format!("Store {}", slug)),
            slug: Set(slug.to_string()),
            description: Set(None),
            approval_status: Set(ApprovalStatus::Approved),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed store")
    }

    pub async fn seed_product(
        &self,
        store_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> entities::ProductModel {
        let now = Utc::now();
        entities::product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            name: Set(name.to_string()),
            description: Set(format!("{} description", name)),
            category: Set("general".to_string()),
            price: Set(price),
            recommended_price: Set(None),
            in_stock: Set(true),
            images: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_address(&self, customer_id: Uuid) -> entities::CustomerAddressModel {
        let now = Utc::now();
        entities::customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            recipient: Set("Test Recipient".to_string()),
            address_line_1: Set("123 Test Street".to_string()),
            address_line_2: Set(None),
            city: Set("Test City".to_string()),
            province: Set("CA".to_string()),
            country_code: Set("US".to_string()),
            postal_code: Set("90210".to_string()),
            phone: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed address")
    }

    pub async fn seed_coupon(
        &self,
        code: &str,
        discount_percent: i32,
        expires_at: chrono::DateTime<Utc>,
        member_only: bool,
    ) -> entities::CouponModel {
        entities::coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_uppercase()),
            discount_percent: Set(discount_percent),
            expires_at: Set(expires_at),
            is_public: Set(true),
            member_only: Set(member_only),
            new_user_only: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed coupon")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
