use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::accounts::Accounts;
use crate::auth::TokenService;
use crate::configuration::{DatabaseSettings, Settings, StoreBackend};
use crate::error::{AppError, DatabaseError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, signup};
use crate::store::{
    CallPolicy, InMemoryTokenStore, InMemoryUserStore, MongoTokenStore, MongoUserStore,
    TokenStore, UserStore,
};

/// Services shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub accounts: Accounts,
    pub tokens: TokenService,
}

impl AppState {
    /// Build the services over the given stores
    pub fn new(
        settings: &Settings,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, AppError> {
        let policy = CallPolicy::from_settings(&settings.store);

        Ok(Self {
            accounts: Accounts::new(users, policy),
            tokens: TokenService::new(settings.jwt.clone(), &settings.store, tokens)?,
        })
    }

    /// Connect the configured backend and build the services
    pub async fn build(settings: &Settings) -> Result<Self, AppError> {
        let (users, tokens) = connect_stores(&settings.database).await?;
        Self::new(settings, users, tokens)
    }
}

async fn connect_stores(
    database: &DatabaseSettings,
) -> Result<(Arc<dyn UserStore>, Arc<dyn TokenStore>), AppError> {
    match database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; data is lost on restart");
            Ok((
                Arc::new(InMemoryUserStore::new()),
                Arc::new(InMemoryTokenStore::new()),
            ))
        }
        StoreBackend::Mongo => {
            tracing::info!(database = %database.database_name, "Connecting to MongoDB");

            let client = mongodb::Client::with_uri_str(&database.uri)
                .await
                .map_err(DatabaseError::from)?;
            let db = client.database(&database.database_name);

            let users = MongoUserStore::new(&db);
            let tokens = MongoTokenStore::new(&db);
            users.ensure_indexes().await?;
            tokens.ensure_indexes().await?;

            tracing::info!("MongoDB indexes ready");
            Ok((Arc::new(users), Arc::new(tokens)))
        }
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let accounts = web::Data::new(state.accounts);
    let tokens = web::Data::new(state.tokens);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(accounts.clone())
            .app_data(tokens.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/users")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    // Protected routes
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(tokens.get_ref().clone()))
                            .route(web::get().to(get_current_user)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(JwtMiddleware::new(tokens.get_ref().clone()))
                            .route(web::post().to(logout)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
