#[tokio::main]
async fn main() -> anyhow::Result<()> {
    llm_tester::run().await
}
