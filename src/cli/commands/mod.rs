pub mod params;
pub mod users;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;

/// GET /health
pub async fn health(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let value = client.get(&["health"]).await?;
    match output_format {
        OutputFormat::Json => output_value(&output_format, &value),
        OutputFormat::Text => {
            println!(
                "{}: {} ({})",
                client.base(),
                value["status"].as_str().unwrap_or("unknown"),
                value["timestamp"].as_str().unwrap_or("-")
            );
            Ok(())
        }
    }
}
