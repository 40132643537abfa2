use std::collections::BTreeSet;

use clap::Subcommand;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum PracticeAction {
    /// Record a completed practice session
    Log {
        /// Exercise id from the curriculum
        exercise: String,
    },
}

pub fn run(ctx: &Context, action: PracticeAction) -> CliResult {
    match action {
        PracticeAction::Log { exercise } => {
            let engine = ctx.engine()?;
            let mut state = ctx.load_state()?;
            let mut events = engine.log_practice(&mut state, &exercise, ctx.now)?;
            events.extend(engine.award_badges(&mut state, &BTreeSet::new(), ctx.now));
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
    }
    Ok(())
}
