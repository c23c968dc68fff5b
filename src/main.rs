use clap::Parser;
use tracing_subscriber::fmt::format::FmtSpan;

use coupon_server::config::Config;
use coupon_server::error::Error;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    coupon_server::run(config).await
}
