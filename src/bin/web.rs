use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use env_logger::Env;
use serde_json::json;
use spf_resolver::{ErrorKind, Options, evaluate_policy};

async fn check(req: web::Json<Options>) -> impl Responder {
    match evaluate_policy(req.into_inner()).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            let body = json!({
                "kind": e.kind(),
                "message": e.message(),
            });
            match e.kind() {
                ErrorKind::Permerror => HttpResponse::UnprocessableEntity().json(body),
                ErrorKind::Unknown => HttpResponse::BadGateway().json(body),
            }
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting SPF Policy Resolver Service");

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Binding to {}:{}", host, port);

    HttpServer::new(|| {
        App::new()
            .route("/check", web::post().to(check))
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(num_cpus::get())
    .keep_alive(std::time::Duration::from_secs(75))
    .max_connections(1_000)
    .bind((host.as_str(), port))?
    .run()
    .await
}
