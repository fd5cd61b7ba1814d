//! Load command implementation.

use std::path::Path;
use stratum_segment::{LoaderRegistry, SegmentMetadata};

/// Runs the load command.
pub fn run(path: &Path, loader: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = load(&LoaderRegistry::with_builtin(), path, loader)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        _ => {
            print_text_output(&metadata);
        }
    }

    Ok(())
}

/// Loads one segment path with a registered loader.
pub fn load(
    registry: &LoaderRegistry,
    path: &Path,
    loader: &str,
) -> Result<SegmentMetadata, Box<dyn std::error::Error>> {
    let loader = registry
        .resolve(loader)
        .ok_or_else(|| format!("unknown segment loader {loader:?}"))?;
    Ok(loader.load(path)?)
}

fn print_text_output(metadata: &SegmentMetadata) {
    println!("Segment:    {}", metadata.name);
    println!("Resource:   {}", metadata.resource_name);
    println!("Version:    {}", metadata.version);
    println!("Total docs: {}", metadata.total_docs);
    if let Some(crc) = &metadata.crc {
        println!("CRC:        {crc}");
    }
    if let Some(dir) = metadata.index_dir() {
        println!("Directory:  {}", dir.display());
    }
    if !metadata.custom.is_empty() {
        println!();
        println!("Properties:");
        for (key, value) in &metadata.custom {
            println!("  {key} = {value}");
        }
    }
}
