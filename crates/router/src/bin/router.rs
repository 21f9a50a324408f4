//! The HTTP server binary: loads [`router::Settings`], builds
//! [`router::AppState`], and serves the middleware-wrapped HTTP surface
//! (§4.9, §4.10) until a shutdown signal arrives.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use common_utils::signals::wait_for_shutdown_signal;
use router::app_state::AppState;
use router::configs::Settings;
use router::middleware::{access_log, auth, idempotency, rate_limit, request_id};
use router::routes;
use storage_impl::mock_db::MockDb;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let env = router_env::config::current_env();
    let _guard = router_env::setup("router", env);

    let settings = Settings::new().unwrap_or_else(|error| {
        router_env::logger::warn!(?error, "failed to load configuration, falling back to defaults");
        Settings::default()
    });

    let store = Arc::new(MockDb::new());
    if matches!(env, router_env::Env::Development) {
        bootstrap_dev_fixtures(&store).await;
    }

    let kv_backend = connect_redis(&settings).await;
    let state = web::Data::new(AppState::new(store, kv_backend, settings.clone()));

    let bind_address = (settings.server.host.clone(), settings.server.port);
    router_env::logger::info!(host = %bind_address.0, port = bind_address.1, ?env, "starting router");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
            .wrap(from_fn(access_log::access_log))
            .wrap(from_fn(idempotency::idempotency))
            .wrap(from_fn(rate_limit::rate_limit))
            .wrap(from_fn(auth::authenticate))
            .wrap(from_fn(request_id::request_id))
            .wrap(Cors::permissive())
    })
    .bind(bind_address)?
    .run();

    let handle = server.handle();
    tokio::select! {
        result = server => result,
        _ = wait_for_shutdown_signal() => {
            router_env::logger::info!("shutdown signal received, draining in-flight requests");
            handle.stop(true).await;
            Ok(())
        }
    }
}

async fn connect_redis(settings: &Settings) -> redis_interface::kv::KvBackend {
    let Some(host) = settings.redis.host.clone() else {
        router_env::logger::info!("no redis host configured, using the in-process kv fallback");
        return redis_interface::kv::KvBackend::None;
    };
    let redis_settings = redis_interface::kv::RedisSettings {
        host,
        port: settings.redis.port.unwrap_or(6379),
        ..Default::default()
    };
    match redis_interface::kv::KvStore::connect(&redis_settings).await {
        Ok(store) => redis_interface::kv::KvBackend::Redis(Arc::new(store)),
        Err(error) => {
            router_env::logger::warn!(?error, "failed to connect to redis, using the in-process kv fallback");
            redis_interface::kv::KvBackend::None
        }
    }
}

/// Development convenience only: seeds one merchant with a usable secret
/// key so a fresh checkout has something to authenticate against.
async fn bootstrap_dev_fixtures(store: &Arc<MockDb>) {
    use hyperswitch_domain_models::api_key::{ApiKey, KeyType};
    use hyperswitch_domain_models::merchant::{Merchant, RoutingConfig};
    use masking::Secret;

    let merchant_id = common_utils::ids::new_uuid();
    store.seed_merchant(Merchant { id: merchant_id, routing_config: RoutingConfig::default() }).await;

    let secret_token = format!("sk_dev_{}", common_utils::ids::new_uuid().simple());
    let now = time::OffsetDateTime::now_utc();
    store
        .seed_api_key(ApiKey {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            key_type: KeyType::Secret,
            lookup_value: Secret::new(common_utils::crypto::sha256_hex(secret_token.as_bytes())),
            is_active: true,
            last_used_at: None,
            created_at: now,
        })
        .await;

    router_env::logger::info!(merchant_id = %merchant_id, api_key = %secret_token, "seeded a development merchant and api key");
}
