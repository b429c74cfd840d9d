use crate::prompt::ConsolePrompter;
use colored::Colorize;
use rigup_cloud_digitalocean::DigitalOceanApi;
use rigup_deploy::orchestrator::Orchestrator;
use rigup_deploy::steps::offer_to_save_changes;
use rigup_deploy::{
    gather_credentials, generate_cloud_config, resolve_decisions, ArtifactResolver, BootAccess,
};
use std::path::PathBuf;

pub async fn handle(file: PathBuf, dry_run: bool, debug: bool) -> anyhow::Result<()> {
    println!("{}", "Starting deployment...".blue().bold());

    let definition = rigup_core::parse_definition_file(&file)?;
    println!(
        "Definition: {} ({} bundle(s))",
        file.display().to_string().cyan(),
        definition.bundles.len()
    );

    let mut prompter = ConsolePrompter::new();
    let resolver = ArtifactResolver::new();

    println!();
    println!("{}", "[1/5] Collecting credentials...".blue());
    let credentials = gather_credentials(&definition, &resolver, &mut prompter).await?;
    let api = DigitalOceanApi::new(&credentials.cloud_token);

    println!("{}", "[2/5] Resolving region, floating IP, and volume...".blue());
    let mut decisions = resolve_decisions(&definition, &api, &mut prompter).await?;
    println!("  {} region: {}", "✓".cyan(), decisions.chosen_region.cyan());
    if let Some(floating_ip) = &decisions.chosen_floating_ip {
        println!("  {} floating IP: {}", "✓".cyan(), floating_ip.cyan());
    }
    if let Some(volume) = &decisions.chosen_volume {
        println!("  {} volume: {}", "✓".cyan(), volume.name.cyan());
    }

    println!("{}", "[3/5] Resolving runtime and bundle versions...".blue());
    let artifacts = resolver.gather_download_urls(&definition, &credentials).await?;

    println!("{}", "[4/5] Building boot configuration...".blue());
    let cloud_config = generate_cloud_config(
        &definition,
        &decisions,
        &artifacts,
        &BootAccess::from_credentials(&credentials),
    )?;
    let user_data = cloud_config.render()?;

    if debug {
        let dump_path = format!(
            "{}_cloud-config.yml",
            chrono::Utc::now().format("%Y%m%dT%H%M%S")
        );
        std::fs::write(&dump_path, &user_data)?;
        println!("  wrote {}", dump_path.cyan());
    }

    if dry_run {
        println!();
        println!("{user_data}");
        println!("{}", "Dry run: no resources were created.".yellow());
        return Ok(());
    }

    println!("{}", "[5/5] Provisioning droplet...".blue());
    let mut orchestrator = Orchestrator {
        api: &api,
        interact: &mut prompter,
    };
    let droplet = orchestrator
        .run(&definition, &mut decisions, &credentials, &user_data)
        .await?;

    offer_to_save_changes(&definition, &decisions, &mut prompter).await?;

    println!();
    let address = decisions
        .chosen_floating_ip
        .clone()
        .or_else(|| droplet.public_ipv4().map(str::to_string))
        .unwrap_or_default();
    println!(
        "{} Deployment complete: {} ({})",
        "✓".cyan(),
        droplet.name.cyan(),
        address
    );
    if !definition.domain.is_empty() {
        let scheme = if definition.secure { "https" } else { "http" };
        println!("  {scheme}://{}", definition.domain);
    }

    Ok(())
}
