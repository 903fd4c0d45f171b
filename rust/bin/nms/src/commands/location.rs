//! Location commands.

use anyhow::{Context as _, Result};

use nms_client::NmsClient;
use nms_core::{NewLocation, ResourceKind, Verb};
use nms_form::FormAction;

use super::{confirm, parse_value, print_value, submit};

fn action(verb: Verb) -> FormAction {
    FormAction::new(ResourceKind::Location, verb)
}

/// `nms location create --json '{...}'`
pub async fn create(client: &NmsClient, json_output: bool, body: &str) -> Result<()> {
    let location: NewLocation = serde_json::from_str(body).context("invalid location JSON")?;
    let created = submit(action(Verb::Create), || client.create_location(&location)).await?;
    print_value(&created, json_output)
}

pub async fn create_type(client: &NmsClient, json_output: bool, name: &str) -> Result<()> {
    let created = submit(FormAction::new(ResourceKind::LocationType, Verb::Create), || {
        client.create_location_type(name)
    })
    .await?;
    print_value(&created, json_output)
}

/// Sends `{field, data}`; one field per call.
pub async fn edit(client: &NmsClient, json_output: bool, id: u64, field: &str, data: &str) -> Result<()> {
    let data = parse_value(data);
    let updated = submit(action(Verb::Edit), || client.edit_location(id, field, data)).await?;
    print_value(&updated, json_output)
}

pub async fn delete(client: &NmsClient, id: u64, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Delete location {}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }
    submit(action(Verb::Delete), || client.delete_location(id)).await?;
    Ok(())
}

pub async fn types(client: &NmsClient, json_output: bool) -> Result<()> {
    let types = client.location_types().await?;
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
