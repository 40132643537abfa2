use clap::Subcommand;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum FreshnessAction {
    /// Freshness of every practiced exercise
    List,
}

pub fn run(ctx: &Context, action: FreshnessAction) -> CliResult {
    match action {
        FreshnessAction::List => {
            let engine = ctx.engine()?;
            let state = ctx.load_state()?;
            print_json(&engine.freshness(&state, ctx.now))?;
        }
    }
    Ok(())
}
