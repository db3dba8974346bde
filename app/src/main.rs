#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tulia_lib::run().await
}
