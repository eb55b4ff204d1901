#[tokio::main]
async fn main() -> std::io::Result<()> {
    arena_sync::run_with_config().await
}
