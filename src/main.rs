#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lifesync::run().await
}
