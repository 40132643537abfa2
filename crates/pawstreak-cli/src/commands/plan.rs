use clap::Subcommand;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Today's recommended practice
    Today,
}

pub fn run(ctx: &Context, action: PlanAction) -> CliResult {
    match action {
        PlanAction::Today => {
            let engine = ctx.engine()?;
            let state = ctx.load_state()?;
            print_json(&engine.daily_plan(&state, ctx.now))?;
        }
    }
    Ok(())
}
