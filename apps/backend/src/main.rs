#[tokio::main]
async fn main() -> anyhow::Result<()> {
    examsim_backend::run().await
}
