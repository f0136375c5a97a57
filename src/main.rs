use actix_files::Files;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::anyhow;
use log::{info, warn};

use email_oasis::config::{self, AppConfig};
use email_oasis::routes::{self, app_state::AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    config::init_logging();

    let config = AppConfig::from_env()?;
    let state = AppState::new(&config)?;

    let session_key = match &config.session_key {
        Some(key) => Key::try_from(key.as_bytes())
            .map_err(|e| anyhow!("SESSION_KEY must be at least 64 bytes: {}", e))?,
        None => {
            warn!("SESSION_KEY not set; sessions will not survive a restart");
            Key::generate()
        }
    };

    let static_dir = Some(config.static_dir.clone()).filter(|dir| dir.is_dir());
    if static_dir.is_none() {
        info!("No frontend bundle at {}; serving the API only", config.static_dir.display());
    }

    info!("Starting server on http://{}:{}", config.bind_address, config.port);
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            // Use the Logger middleware to log incoming requests.
            .wrap(Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
            .configure(move |cfg| {
                if let Some(dir) = static_dir {
                    cfg.service(Files::new("/", dir).index_file("index.html"));
                }
            })
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
