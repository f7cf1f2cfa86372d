use super::Workspace;
use crate::tools;

pub fn run(operation: &str, params: &str) -> anyhow::Result<()> {
    let params: serde_json::Value = serde_json::from_str(params)
        .map_err(|e| anyhow::anyhow!("--params is not valid JSON: {}", e))?;
    let ws = Workspace::open()?;
    let result = tools::call(&ws, operation, &params)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
