//! Registry listing.

use clap::Args;
use patchwork_registry::{EntryInfo, Registry};
use serde_json::{Value, json};

#[derive(Args)]
pub struct ModulesArgs {
    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ModulesArgs) -> anyhow::Result<()> {
    let registry = Registry::with_builtins();

    if args.json {
        let listing = json!({
            "modules": entries_json(registry.modules()),
            "voices": entries_json(registry.voices()),
            "tables": entries_json(registry.tables()),
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    section("Modules", registry.modules());
    section("Voices", registry.voices());
    section("Wave tables", registry.tables());
    Ok(())
}

fn entries_json<'a>(entries: impl Iterator<Item = &'a EntryInfo>) -> Vec<Value> {
    entries
        .map(|e| json!({ "name": e.name, "description": e.description }))
        .collect()
}

fn section<'a>(title: &str, entries: impl Iterator<Item = &'a EntryInfo>) {
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    for entry in entries {
        println!("  {:12}  {}", entry.name, entry.description);
    }
    println!();
}
