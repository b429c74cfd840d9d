//! Write resolved values back to the definition file
//!
//! Resolution can land on a different region, volume, or floating IP than
//! the file requested. After a successful deployment the operator may save
//! those back so the next run resolves cleanly. The file is patched in its
//! original format (YAML or JSON) rather than regenerated, preserving
//! everything else in it.

use crate::decisions::Decisions;
use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use rigup_core::DeploymentDefinition;
use serde_yaml::Value;

pub async fn offer_to_save_changes(
    definition: &DeploymentDefinition,
    decisions: &Decisions,
    interact: &mut dyn Interaction,
) -> Result<()> {
    let mut changes: Vec<&str> = Vec::new();
    if decisions.chosen_region != definition.droplet.region {
        changes.push("region");
    }
    let chosen_volume_id = decisions.chosen_volume.as_ref().map(|v| v.id.as_str());
    if decisions.use_block_storage && chosen_volume_id != definition.volume.id.as_deref() {
        changes.push("volume");
    }
    if decisions.chosen_floating_ip != definition.droplet.floating_ip {
        changes.push("floating_ip");
    }

    if changes.is_empty() {
        return Ok(());
    }

    let save = interact.confirm(&format!(
        "You've changed the {} of this deployment. Would you like to save these \
         changes back to {}?",
        changes.join(", "),
        definition.file_path.display()
    ))?;
    if !save {
        return Ok(());
    }

    patch_definition_file(definition, decisions, &changes)?;
    tracing::info!(path = %definition.file_path.display(), "saved resolved values");
    Ok(())
}

fn patch_definition_file(
    definition: &DeploymentDefinition,
    decisions: &Decisions,
    changes: &[&str],
) -> Result<()> {
    let path = &definition.file_path;
    let text = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    // Both formats patch through the YAML value model; JSON is a subset.
    let mut raw: Value = match ext {
        "yml" | "yaml" => serde_yaml::from_str(&text)
            .map_err(|e| DeployError::SaveChanges(format!("could not re-read {}: {e}", path.display())))?,
        _ => serde_json::from_str::<serde_json::Value>(&text)
            .map(yaml_from_json)
            .map_err(|e| DeployError::SaveChanges(format!("could not re-read {}: {e}", path.display())))?,
    };

    if changes.contains(&"region") {
        set_nested(&mut raw, "droplet", "region", Value::from(decisions.chosen_region.clone()));
    }
    if changes.contains(&"floating_ip") {
        if let Some(ip) = &decisions.chosen_floating_ip {
            set_nested(&mut raw, "droplet", "floating_ip", Value::from(ip.clone()));
        }
    }
    if changes.contains(&"volume")
        && let Some(volume) = &decisions.chosen_volume
    {
        set_nested(&mut raw, "volume", "id", Value::from(volume.id.clone()));
        set_nested(&mut raw, "volume", "name", Value::from(volume.name.clone()));
    }

    let output = match ext {
        "yml" | "yaml" => serde_yaml::to_string(&raw)
            .map_err(|e| DeployError::SaveChanges(format!("could not serialize {}: {e}", path.display())))?,
        _ => {
            let json = json_from_yaml(&raw)?;
            let pretty = serde_json::to_string_pretty(&json)
                .map_err(|e| DeployError::SaveChanges(format!("could not serialize {}: {e}", path.display())))?;
            format!("{pretty}\n")
        }
    };

    std::fs::write(path, output)?;
    Ok(())
}

fn set_nested(root: &mut Value, section: &str, key: &str, value: Value) {
    let Value::Mapping(map) = root else { return };
    let entry = map
        .entry(Value::from(section))
        .or_insert_with(|| Value::Mapping(Default::default()));
    if let Value::Mapping(section_map) = entry {
        section_map.insert(Value::from(key), value);
    }
}

fn yaml_from_json(json: serde_json::Value) -> Value {
    serde_yaml::to_value(json).unwrap_or(Value::Null)
}

fn json_from_yaml(yaml: &Value) -> Result<serde_json::Value> {
    serde_yaml::from_value::<serde_json::Value>(yaml.clone())
        .map_err(|e| DeployError::SaveChanges(format!("could not convert definition: {e}")))
}
