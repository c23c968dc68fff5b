use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpResponse, HttpServer};
use mongodb::Client;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod cache;
pub mod campaign;
pub mod config;
pub mod coupon;
pub mod database;
pub mod error;
pub mod seed;
pub mod typedid;
pub mod utils;

pub use campaign::{CampaignBody, CreateCampaignBody};
pub use coupon::{IssueCouponBody, IssuedCouponBody};

use crate::cache::{Cache, MemoryCache, RedisCache};
use crate::config::Config;
use crate::database::{Database, MongoDatabase};
use crate::error::Error;
use crate::utils::RequestTimeout;

/// Registers the routes and the extractor error formats.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
        // format json errors with custom format
        Error::InvalidJson(err).into()
    }))
    .app_data(PathConfig::default().error_handler(|err, _req| {
        // format path errors with custom format
        Error::InvalidPath(err).into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _req| {
        // format query errors with custom format
        Error::InvalidQuery(err).into()
    }))
    .service(campaign::endpoints::create_campaign)
    .service(campaign::endpoints::get_campaign_by_id)
    .service(coupon::endpoints::issue_coupon_in_campaign);
}

pub async fn path_not_found() -> Result<HttpResponse, Error> {
    Err(Error::PathDoesNotExist)
}

pub async fn connect_cache(uri: &str) -> Result<Box<dyn Cache>, Error> {
    if uri.starts_with("memory://") {
        info!("using in-process cache");
        return Ok(Box::new(MemoryCache::new()));
    }

    info!("connecting to cache: {}", uri);
    let cache = RedisCache::connect(uri)
        .await
        .map_err(Error::CacheConnectionFailed)?;

    Ok(Box::new(cache))
}

pub async fn run(config: Config) -> Result<(), Error> {
    info!("connecting to db: {}", config.mongodb_uri);
    let db = Client::with_uri_str(&config.mongodb_uri)
        .await?
        .database(&config.mongodb_database);
    let db = MongoDatabase::initialize(db).await?;
    let cache = connect_cache(&config.cache_uri).await?;

    if config.seed_campaign {
        seed::seed(&db, &*cache).await?;
    }

    let db = Data::new(Box::new(db) as Box<dyn Database>);
    let cache = Data::new(cache);
    let timeout = Data::new(RequestTimeout(config.request_timeout()));

    info!("listening on {}", config.server_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(cache.clone())
            .app_data(timeout.clone())
            .wrap(TracingLogger::default())
            .configure(configure)
            .default_service(web::to(path_not_found))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    Ok(())
}
