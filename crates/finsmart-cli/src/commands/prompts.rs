//! Prompts-related command implementations

use anyhow::Result;
use finsmart_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// List all available prompts and their override status
pub fn cmd_prompts_list() -> Result<()> {
    let library = PromptLibrary::new();

    println!("Available Prompts:\n");
    println!("{:<25} {:>7}  {}", "ID", "VERSION", "OVERRIDE");
    println!("{}", "-".repeat(60));

    for info in library.list() {
        let version = info
            .version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        let status = match &info.override_path {
            Some(_) => "Custom",
            None => "Default",
        };
        println!("{:<25} {:>7}  {}", info.id, version, status);
    }

    println!();
    cmd_prompts_path()?;
    println!();
    println!("To customize a prompt, copy it into the override directory as <id>.md.");
    println!("Overrides are re-read on every call.");
    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let id: PromptId = match prompt_id.parse() {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("Available prompts:");
            for id in PromptId::all() {
                eprintln!("  - {}", id.as_str());
            }
            anyhow::bail!("unknown prompt id {}", prompt_id);
        }
    };

    let prompt = PromptLibrary::new().load(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    if !prompt.metadata.output.is_empty() {
        println!("Output: {}", prompt.metadata.output);
    }
    match &prompt.source {
        Some(path) => println!("Source: {}", path.display()),
        None => println!("Source: (embedded)"),
    }
    println!();
    println!("{}", prompt.body);
    Ok(())
}

/// Print the override directory
pub fn cmd_prompts_path() -> Result<()> {
    println!(
        "Override directory: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );
    Ok(())
}
