//! Inspect command implementation.

use serde::Serialize;
use std::path::PathBuf;
use stratum_core::{
    BootstrapSummary, InstanceDataManager, InstanceDataManagerConfig, ServerInfo, StorageMode,
};
use tracing::debug;

/// Node settings for one inspection run.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Directory to bootstrap from.
    pub bootstrap_dir: PathBuf,
    /// Node data directory.
    pub data_dir: Option<PathBuf>,
    /// Segment loader identifier.
    pub loader: String,
    /// Storage mode for provisioned resources.
    pub mode: StorageMode,
    /// Instance identifier.
    pub instance_id: String,
}

/// Node inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Bootstrap outcome.
    pub bootstrap: BootstrapSummary,
    /// Registry after bootstrap.
    pub server: ServerInfo,
    /// Bytes of segment data loaded per resource.
    pub resource_bytes: Vec<(String, u64)>,
}

/// Runs the inspect command.
pub fn run(options: &InspectOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !options.bootstrap_dir.is_dir() {
        return Err(format!(
            "bootstrap directory {:?} does not exist",
            options.bootstrap_dir
        )
        .into());
    }

    let result = inspect(options)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Brings a node up from the bootstrap directory, captures its state and
/// shuts it down again.
pub fn inspect(options: &InspectOptions) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut config = InstanceDataManagerConfig::new()
        .with_instance_id(options.instance_id.as_str())
        .with_bootstrap_segment_dir(&options.bootstrap_dir)
        .with_segment_loader(options.loader.as_str())
        .with_storage_mode(options.mode);
    if let Some(dir) = &options.data_dir {
        config = config.with_data_dir(dir);
    }

    let manager = InstanceDataManager::default();
    manager.init(config)?;
    let bootstrap = manager.start()?;

    let server = manager.server_info();
    let resource_bytes = manager
        .get_resource_data_managers()
        .iter()
        .map(|resource| {
            let bytes: u64 = resource
                .get_all_segments()
                .iter()
                .map(|segment| segment.size_bytes())
                .sum();
            (resource.resource_name().to_string(), bytes)
        })
        .collect();

    let stopped = manager.shut_down();
    debug!(stopped, "inspection node shut down");

    Ok(InspectResult {
        bootstrap,
        server,
        resource_bytes,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Stratum Node Inspection");
    println!("=======================");
    println!();
    println!("{}", result.bootstrap);
    println!();
    println!("{}", result.server);

    if !result.resource_bytes.is_empty() {
        println!();
        println!("Loaded data:");
        for (resource, bytes) in &result.resource_bytes {
            println!("  {resource}: {}", format_size(*bytes));
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
