use clap::Subcommand;
use pawstreak_core::streak::{milestone_reward, next_milestone};
use serde_json::json;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show the current streak
    Show,
    /// Run the daily break-check (spends a freeze or breaks the streak)
    Check,
    /// Start a recovery run after a broken streak
    Recover,
}

pub fn run(ctx: &Context, action: StreakAction) -> CliResult {
    let engine = ctx.engine()?;
    let mut state = ctx.load_state()?;

    match action {
        StreakAction::Show => {
            let streak = &state.streak;
            let today = engine.today(ctx.now);
            let next = next_milestone(streak.current);
            print_json(&json!({
                "learner": state.learner_id,
                "status": streak.status(),
                "current": streak.current,
                "best": streak.best,
                "last_training_date": streak.last_training_date,
                "trained_today": streak.trained_on(today),
                "days_since_training": streak.days_since_training(today),
                "freezes_available": streak.freezes.available,
                "next_milestone": next,
                "next_milestone_reward": next.and_then(milestone_reward),
                "recovering": streak.is_recovering(),
                "recovery_days": streak.recovery.days_completed,
            }))?;
        }
        StreakAction::Check => {
            let events = engine.periodic_check(&mut state, ctx.now);
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
        StreakAction::Recover => {
            let events = engine.start_recovery(&mut state, ctx.now);
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
    }
    Ok(())
}
