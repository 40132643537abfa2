use clap::Subcommand;
use serde_json::json;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Show the active challenge and weekly stats
    Show,
    /// Roll the challenge over to the current week if needed
    Sync,
    /// Mark a challenge day as done
    Mark {
        /// Day of the week, 1 = Monday ... 7 = Sunday (defaults to today)
        #[arg(long)]
        day: Option<u8>,
    },
}

pub fn run(ctx: &Context, action: ChallengeAction) -> CliResult {
    let engine = ctx.engine()?;
    let mut state = ctx.load_state()?;

    match action {
        ChallengeAction::Show => {
            let active = state.challenge.active.as_ref();
            let details = active.and_then(|a| engine.challenge_catalog().get(&a.challenge_id));
            print_json(&json!({
                "active": active,
                "challenge": details,
                "stats": state.challenge.stats,
                "history": state.challenge.history.len(),
            }))?;
        }
        ChallengeAction::Sync => {
            let events = engine.periodic_check(&mut state, ctx.now);
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
        ChallengeAction::Mark { day } => {
            let events = engine.mark_challenge_day(&mut state, day, ctx.now)?;
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
    }
    Ok(())
}
