use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use livelink_asset::ImportPlan;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    /// Payload bytes as received, without decoding.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    #[serde(flatten)]
    plan: &'a ImportPlan,
    importable: bool,
    timestamp: String,
}

/// Print the import plans of one payload.
///
/// `Raw` has no plan rendering; callers print the payload instead.
pub fn print_plans(plans: &[ImportPlan], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let timestamp = now_unix_seconds();
            for plan in plans {
                let out = PlanOutput {
                    plan,
                    importable: plan.is_importable(),
                    timestamp: timestamp.clone(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ASSET", "TYPE", "MATERIAL", "MAPS", "MESHES", "METAL"]);
            for plan in plans {
                table.add_row(vec![
                    plan.asset_id.clone(),
                    plan.asset_type.clone(),
                    plan.material_name.clone(),
                    map_list(plan),
                    plan.meshes.len().to_string(),
                    plan.is_metal.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for plan in plans {
                if plan.is_importable() {
                    println!(
                        "asset={} type={} material={} maps={} meshes={} metal={}",
                        plan.asset_id,
                        plan.asset_type,
                        plan.material_name,
                        map_list(plan),
                        plan.meshes.len(),
                        plan.is_metal
                    );
                } else {
                    println!("asset={} skipped (no usable textures)", plan.asset_id);
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn map_list(plan: &ImportPlan) -> String {
    if plan.textures.is_empty() {
        return "-".to_string();
    }
    plan.textures
        .iter()
        .map(|texture| texture.map_type.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
