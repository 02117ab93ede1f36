//! Engines listing command

use anyhow::Result;
use codesearch_core::config::INDEX_TOOL;
use codesearch_core::{ConfigProvider, EngineKind, SearchEnv};
use colored::Colorize;
use tracing::info;

/// Show every supported engine and where its executable resolves
pub fn engines_command(config: &dyn ConfigProvider) -> Result<()> {
    info!("Listing search engines");

    let env = SearchEnv::new(config);
    let active = env.engine_kind();

    println!("{}\n", "Search engines".bold());
    for kind in EngineKind::ALL {
        let marker = if kind == active { "*".green().bold() } else { " ".normal() };
        println!("{} {} ({})", marker, kind.display_name().bold(), kind.as_str());
        print_tool(&env, kind.tool(), kind.install_url());
        if kind.is_indexed() {
            print_tool(&env, INDEX_TOOL, kind.install_url());
        }
        println!();
    }

    match env.index_file() {
        Some(file) => println!("Index file: {}", file.display()),
        None => println!("Index file: {}", "unknown".dimmed()),
    }
    Ok(())
}

fn print_tool(env: &SearchEnv<'_>, tool: &str, install_url: Option<&str>) {
    match env.locate(tool) {
        Some(path) => println!("    {:<8} {}", tool, path.display()),
        None => {
            println!(
                "    {:<8} {} ({})",
                tool,
                "not found".red(),
                env.resolve_executable(tool).display()
            );
            if let Some(url) = install_url {
                println!("    {:<8} {}", "", url.dimmed());
            }
        }
    }
}
