use std::collections::BTreeSet;

use clap::Subcommand;
use serde_json::json;

use crate::context::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum BadgesAction {
    /// Award any newly earned badges
    Check {
        /// Caller-supplied condition, e.g. both_trained_today (repeatable)
        #[arg(long = "flag")]
        flags: Vec<String>,
    },
    /// List every badge and whether it is earned
    List,
}

pub fn run(ctx: &Context, action: BadgesAction) -> CliResult {
    let engine = ctx.engine()?;
    let mut state = ctx.load_state()?;

    match action {
        BadgesAction::Check { flags } => {
            let flags: BTreeSet<String> = flags.into_iter().collect();
            let events = engine.award_badges(&mut state, &flags, ctx.now);
            ctx.save_state(&state)?;
            print_json(&events)?;
        }
        BadgesAction::List => {
            let badges: Vec<_> = engine
                .badge_catalog()
                .badges
                .iter()
                .map(|b| {
                    json!({
                        "id": b.id,
                        "name": b.name,
                        "category": b.category,
                        "description": b.description,
                        "earned": state.earned_badges.contains(&b.id),
                    })
                })
                .collect();
            print_json(&badges)?;
        }
    }
    Ok(())
}
