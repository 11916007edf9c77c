//! HTTP API server for the tutoring backend

pub mod chat;
pub mod error;
pub mod feedback;
pub mod goals;
pub mod health;
pub mod materials;
pub mod plans;
pub mod rate_limit;
pub mod subscriptions;
pub mod summaries;
pub mod threads;
pub mod topics;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::context::{ContextBuilder, ContextConfig};
use crate::db::{
    DbPool, FeedbackRepo, GoalRepo, PlanRepo, SubscriptionRepo, SummaryRepo, ThreadRepo,
    TopicRepo, UserRepo,
};
use crate::materials::StudyMaterials;
use crate::progress::{ProgressConfig, ProgressTracker};
use crate::tutor::Tutor;
use crate::Result;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub users: UserRepo,
    pub threads: ThreadRepo,
    pub summaries: SummaryRepo,
    pub topics: TopicRepo,
    pub goals: GoalRepo,
    pub plans: PlanRepo,
    pub feedback: FeedbackRepo,
    pub subscriptions: SubscriptionRepo,
    pub progress: ProgressTracker,
    pub context: ContextBuilder,
    pub tutor: Tutor,
    pub materials: Arc<StudyMaterials>,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    db: DbPool,
    port: u16,
    tutor: Tutor,
    progress_config: ProgressConfig,
    context_config: ContextConfig,
    materials: StudyMaterials,
    static_dir: Option<PathBuf>,
    rate_limit: Option<u32>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    ///
    /// Starts with an offline tutor, default progress and context settings,
    /// no study materials and no rate limit.
    #[must_use]
    pub fn new(db: DbPool, port: u16) -> Self {
        Self {
            db,
            port,
            tutor: Tutor::offline(),
            progress_config: ProgressConfig::default(),
            context_config: ContextConfig::default(),
            materials: StudyMaterials::default(),
            static_dir: None,
            rate_limit: None,
        }
    }

    /// Set the tutor used to answer chat messages
    #[must_use]
    pub fn tutor(mut self, tutor: Tutor) -> Self {
        self.tutor = tutor;
        self
    }

    /// Set XP and leveling configuration
    #[must_use]
    pub fn progress_config(mut self, config: ProgressConfig) -> Self {
        self.progress_config = config;
        self
    }

    /// Set conversation context configuration
    #[must_use]
    pub fn context_config(mut self, config: ContextConfig) -> Self {
        self.context_config = config;
        self
    }

    /// Set the study materials catalogue
    #[must_use]
    pub fn materials(mut self, materials: StudyMaterials) -> Self {
        self.materials = materials;
        self
    }

    /// Set static files directory for serving web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Limit requests per second across all clients
    #[must_use]
    pub const fn rate_limit(mut self, requests_per_second: Option<u32>) -> Self {
        self.rate_limit = requests_per_second;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let users = UserRepo::new(self.db.clone());
        let threads = ThreadRepo::new(self.db.clone());
        let summaries = SummaryRepo::new(self.db.clone());
        let goals = GoalRepo::new(self.db.clone());

        let progress = ProgressTracker::new(users.clone(), self.progress_config);
        let context = ContextBuilder::new(
            self.context_config,
            goals.clone(),
            threads.clone(),
            summaries.clone(),
        );

        let state = Arc::new(ApiState {
            topics: TopicRepo::new(self.db.clone()),
            plans: PlanRepo::new(self.db.clone()),
            feedback: FeedbackRepo::new(self.db.clone()),
            subscriptions: SubscriptionRepo::new(self.db.clone()),
            db: self.db,
            users,
            threads,
            summaries,
            goals,
            progress,
            context,
            tutor: self.tutor,
            materials: Arc::new(self.materials),
            rate_limiter: self.rate_limit.map(rate_limit::create_limiter),
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()))
            .merge(users::router(self.state.clone()))
            .merge(chat::router(self.state.clone()))
            .merge(threads::router(self.state.clone()))
            .merge(topics::router(self.state.clone()))
            .merge(goals::router(self.state.clone()))
            .merge(plans::router(self.state.clone()))
            .merge(feedback::router(self.state.clone()))
            .merge(summaries::router(self.state.clone()))
            .merge(subscriptions::router(self.state.clone()))
            .merge(materials::router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.rate_limiter.is_some() {
            tracing::info!("rate limiting active");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Spawn the API server in the background
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
