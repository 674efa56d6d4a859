#[tokio::main]
async fn main() -> anyhow::Result<()> {
    footetl::run_cli().await
}
