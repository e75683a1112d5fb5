use actix_web::{web, App, HttpServer};
use actix_web_opentelemetry::RequestTracing;

use todo_list::config::Config;
use todo_list::{api, repository, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new()?;
    telemetry::init(&config)?;

    let todo_db = repository::connect(&config)?;
    let app_data = web::Data::from(todo_db);

    tracing::info!(host = %config.host, port = config.port, "starting server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(api::config)
            .default_service(web::route().to(api::not_found))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(RequestTracing::new())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
