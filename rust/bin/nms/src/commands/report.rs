//! Read-only views: workers and device statistics.

use anyhow::Result;

use nms_client::NmsClient;

use super::print_value;

pub async fn workers(client: &NmsClient, json_output: bool) -> Result<()> {
    let workers = client.workers().await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&workers)?);
        return Ok(());
    }
    println!("{:38}  HOSTNAME", "ID");
    for w in &workers {
        println!("{:38}  {}", w.id, w.hostname);
    }
    Ok(())
}

pub async fn stats(client: &NmsClient, json_output: bool) -> Result<()> {
    let stats = client.device_statistics().await?;
    print_value(&stats, json_output)
}
