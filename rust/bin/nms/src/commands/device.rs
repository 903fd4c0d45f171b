//! Device commands.

use anyhow::{Context as _, Result};

use nms_client::NmsClient;
use nms_core::{NewDevice, ResourceKind, Verb};
use nms_form::FormAction;

use super::{confirm, parse_value, print_value, submit};

fn action(verb: Verb) -> FormAction {
    FormAction::new(ResourceKind::Device, verb)
}

/// `nms device create --json '{...}'`
pub async fn create(client: &NmsClient, json_output: bool, body: &str) -> Result<()> {
    let device: NewDevice = serde_json::from_str(body).context("invalid device JSON")?;
    let created = submit(action(Verb::Create), || client.create_device(&device)).await?;
    print_value(&created, json_output)
}

pub async fn create_type(client: &NmsClient, json_output: bool, name: &str) -> Result<()> {
    let created = submit(FormAction::new(ResourceKind::DeviceType, Verb::Create), || {
        client.create_device_type(name)
    })
    .await?;
    print_value(&created, json_output)
}

/// Change a single field.
pub async fn edit(client: &NmsClient, json_output: bool, id: u64, field: &str, value: &str) -> Result<()> {
    let value = parse_value(value);
    let updated = submit(action(Verb::Edit), || client.edit_device(id, field, value)).await?;
    print_value(&updated, json_output)
}

pub async fn delete(client: &NmsClient, id: u64, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Delete device {}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }
    submit(action(Verb::Delete), || client.delete_device(id)).await?;
    Ok(())
}

pub async fn get(client: &NmsClient, json_output: bool, id: u64) -> Result<()> {
    let device = client.device(id).await?;
    print_value(&device, json_output)
}

pub async fn types(client: &NmsClient, json_output: bool) -> Result<()> {
    let types = client.device_types().await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }
    println!("{:>6}  NAME", "ID");
    for t in &types {
        println!("{:>6}  {}", t.id, t.name);
    }
    Ok(())
}
