pub fn run() -> anyhow::Result<()> {
    println!("tidemark {}", env!("CARGO_PKG_VERSION"));
    println!("Retention and retrieval engine for observation logs");
    Ok(())
}
