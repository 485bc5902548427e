#[actix_web::main]
async fn main() -> std::io::Result<()> {
    docforge_server::run().await
}
