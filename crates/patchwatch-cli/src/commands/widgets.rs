//! Widget schema listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use patchwatch_registry::WidgetRegistry;

#[derive(Args)]
pub struct WidgetsArgs {
    /// Show the field layout of one widget class
    #[arg(value_name = "CLASS")]
    class: Option<String>,
}

pub fn run(args: WidgetsArgs) -> anyhow::Result<()> {
    let registry = WidgetRegistry::new();

    if let Some(class) = &args.class {
        let widget = registry
            .get(class)
            .ok_or_else(|| anyhow::anyhow!("Unknown widget: {}", class))?;

        println!("{} ({})", widget.name, widget.id);
        println!("{}", "=".repeat(widget.name.len() + widget.id.len() + 3));
        println!();
        if !widget.aliases.is_empty() {
            println!("Aliases: {}", widget.aliases.join(", "));
            println!();
        }
        println!("Fields:");
        for (i, field) in widget.fields.iter().enumerate() {
            println!("  {i:>2}  {field}");
        }
        return Ok(());
    }

    println!("Available Widgets:");
    println!();
    println!("  {:8}  {:14}  {:12}  {}", "Class", "Name", "Category", "Aliases");
    println!("  {:8}  {:14}  {:12}  {}", "-----", "----", "--------", "-------");
    for widget in registry.all_widgets() {
        println!(
            "  {:8}  {:14}  {:12}  {}",
            widget.id,
            widget.name,
            widget.category.name(),
            widget.aliases.join(", ")
        );
    }
    Ok(())
}
