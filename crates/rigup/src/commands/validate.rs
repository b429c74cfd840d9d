use colored::Colorize;
use std::path::PathBuf;

pub fn handle(file: PathBuf) -> anyhow::Result<()> {
    let definition = rigup_core::parse_definition_file(&file)?;

    println!("{} {} is valid", "✓".cyan(), file.display());
    println!("  domain: {}", definition.domain);
    println!("  secure: {}", definition.secure);
    println!(
        "  droplet: {} / {} / {}",
        definition.droplet.region, definition.droplet.size, definition.droplet.image
    );
    println!(
        "  runtime: {} (port {})",
        definition.runtime.version_range, definition.runtime.port
    );
    println!("  bundles ({}):", definition.bundles.len());
    for bundle in &definition.bundles {
        println!(
            "    • {} {} ({})",
            bundle.name.cyan(),
            bundle.raw_range,
            bundle.repo.slug()
        );
    }

    Ok(())
}
