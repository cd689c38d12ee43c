//! Handlers for the non-interactive subcommands.

use crate::config::{ConfigStore, ConfigUpdate};
use crate::context::SessionContext;
use crate::error::{ParleyError, Result};
use crate::models::model_ids;
use crate::provider::test_connection;

use super::{ConfigCommands, SetArgs};

pub fn handle_config(store: &ConfigStore, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&store.masked())?);
        }
        ConfigCommands::Path => match store.path() {
            Some(path) => println!("{}", path.display()),
            None => println!("(in memory)"),
        },
        ConfigCommands::Set(args) => handle_set(store, args)?,
    }
    Ok(())
}

fn handle_set(store: &ConfigStore, args: SetArgs) -> Result<()> {
    let update = ConfigUpdate {
        api_key: args.api_key,
        base_url: args.base_url,
        model_id: args.model,
        tavily_api_key: args.tavily_key,
    };
    match store.update(update) {
        Ok(report) => {
            if let Some(warning) = report.warning {
                eprintln!("warning: {warning}");
            }
            println!("Configuration updated.");
            Ok(())
        }
        Err(ParleyError::ConfigIncomplete { missing }) => {
            let fields: Vec<String> = missing.iter().map(ToString::to_string).collect();
            println!("Configuration updated; still missing: {}", fields.join(", "));
            Ok(())
        }
        Err(err) => Err(err),
    }
}

pub async fn handle_models(ctx: &SessionContext, tool_capable: bool) -> Result<()> {
    ctx.config.validate_current()?;
    let models = ctx.refresh_models().await?;
    for id in model_ids(&models, tool_capable) {
        println!("{id}");
    }
    Ok(())
}

pub async fn handle_check(ctx: &SessionContext) -> Result<()> {
    let config = ctx.config.get();
    let provider = ctx.provider()?;
    let report = test_connection(provider.as_ref(), &config.model_id).await?;
    println!("{} at {}: {}", report.model, config.base_url, report.response);
    Ok(())
}
