//! ffbscope - HID force-feedback inspector CLI.
//!
//! Lists HID interfaces, dumps decoded report descriptors as JSON, samples a
//! single input field, and exports descriptor snapshots.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffbscope::snapshot::write_snapshot;
use ffbscope::unit::Unit;
use ffbscope::{DeviceInfo, DeviceManager, FieldDefinition, LabelStore, ManagerConfig};

#[derive(Parser)]
#[command(name = "ffbscope", version, about = "Inspect HID force-feedback devices")]
struct Cli {
    /// TOML manager configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Field label file
    #[arg(long, global = true)]
    labels: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List opened devices
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print a device's decoded report descriptor as JSON
    Descriptor {
        /// Device index from `list`
        index: usize,
        /// Print the raw descriptor bytes instead
        #[arg(long)]
        raw: bool,
    },
    /// Sample one input field
    Sample {
        /// Device index from `list`
        index: usize,
        /// Input field index from `descriptor`
        field: usize,
        /// How long to sample
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
    /// Write every device's descriptor to a snapshot file
    Export { path: PathBuf },
}

#[derive(Serialize)]
struct FieldView<'a> {
    index: usize,
    usage_name: &'static str,
    unit_name: String,
    label: Option<&'a str>,
    #[serde(flatten)]
    field: &'a FieldDefinition,
}

#[derive(Serialize)]
struct DescriptorView<'a> {
    device: &'a DeviceInfo,
    has_force_feedback: bool,
    inputs: Vec<FieldView<'a>>,
    outputs: Vec<FieldView<'a>>,
    features: Vec<FieldView<'a>>,
}

fn field_views<'a>(
    device: &DeviceInfo,
    fields: &'a [FieldDefinition],
    labels: &'a LabelStore,
) -> Vec<FieldView<'a>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| FieldView {
            index,
            usage_name: field.usage().name,
            unit_name: Unit::of(field).to_string(),
            label: labels.label_for(device, field),
            field,
        })
        .collect()
}

fn device_at(mgr: &DeviceManager, index: usize) -> Result<&DeviceInfo> {
    let devices = mgr.get_devices();
    match devices.get(index) {
        Some(d) => Ok(d),
        None => bail!("no device {index}; {} device(s) opened", devices.len()),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ManagerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ManagerConfig::default(),
    };
    let labels = match &cli.labels {
        Some(path) => LabelStore::load(path)
            .with_context(|| format!("loading labels {}", path.display()))?,
        None => LabelStore::new(),
    };

    let mgr = DeviceManager::hid(config).context("initializing hidapi")?;

    match &cli.command {
        Command::List { json } => {
            let devices = mgr.get_devices();
            if *json {
                println!("{}", serde_json::to_string_pretty(devices)?);
            } else {
                for (i, d) in devices.iter().enumerate() {
                    println!(
                        "{i:3}  {d}  usage {:04x}:{:04x}  if {}  {}",
                        d.usage_page, d.usage, d.interface_number, d.path
                    );
                }
            }
        }
        Command::Descriptor { index, raw } => {
            let device = device_at(&mgr, *index)?;
            if *raw {
                let bytes = mgr.report_descriptor(device).unwrap_or_default();
                println!("{}", serde_json::to_string(bytes)?);
                return Ok(());
            }
            let descriptor = mgr.descriptor(device).unwrap_or_default();
            let view = DescriptorView {
                device,
                has_force_feedback: descriptor.has_force_feedback(),
                inputs: field_views(device, &descriptor.inputs, &labels),
                outputs: field_views(device, &descriptor.outputs, &labels),
                features: field_views(device, &descriptor.features, &labels),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Sample {
            index,
            field,
            duration_ms,
        } => {
            let device = device_at(&mgr, *index)?;
            let descriptor = mgr.descriptor(device).unwrap_or_default();
            let Some(def) = descriptor.inputs.get(*field) else {
                bail!("no input field {field}; device has {}", descriptor.inputs.len());
            };

            thread::sleep(Duration::from_millis(*duration_ms));

            let mut series = mgr.get_input_series(device, def);
            // Oldest sample first.
            if let Some(current) = mgr.current_index(device) {
                let len = series.len();
                if len > 0 {
                    series.rotate_left((current + 1) % len);
                }
            }
            let summary = serde_json::json!({
                "field": labels.label_for(device, def).unwrap_or(def.usage().name),
                "status": mgr.device_status(device).map(|s| s.to_string()),
                "update_rate_hz": mgr.update_rate(device),
                "latest": series.last(),
                "series": series,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Export { path } => {
            let exports = mgr.export();
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_snapshot(BufWriter::new(file), &exports)?;
            eprintln!("wrote {} device(s) to {}", exports.len(), path.display());
        }
    }

    mgr.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ffbscope={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    run(&cli)
}
