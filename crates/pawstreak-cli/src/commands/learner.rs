use clap::Subcommand;
use pawstreak_core::{LifeStage, StateRepository};
use serde_json::json;

use crate::context::{print_json, CliResult, Context, CURRENT_LEARNER_KEY};

#[derive(Subcommand)]
pub enum LearnerAction {
    /// Print the full learner state
    Show,
    /// List stored learners
    List,
    /// Make a learner the default for later commands
    Use {
        id: String,
    },
    /// Delete a learner's stored state
    Remove {
        id: String,
    },
    /// Set the life stage (puppy, adolescent, adult, senior)
    SetStage {
        stage: String,
    },
    /// Set the player level
    SetLevel {
        level: u32,
    },
    /// Count a journal entry
    AddJournal,
    /// Count a shared photo
    AddPhoto,
}

pub fn run(ctx: &Context, action: LearnerAction) -> CliResult {
    match action {
        LearnerAction::Show => print_json(&ctx.load_state()?)?,
        LearnerAction::List => print_json(&ctx.db.learners()?)?,
        LearnerAction::Use { id } => {
            ctx.db.kv_set(CURRENT_LEARNER_KEY, &id)?;
            println!("now using learner {id}");
        }
        LearnerAction::Remove { id } => {
            if !ctx.db.delete(&id)? {
                return Err(format!("no stored learner: {id}").into());
            }
            println!("removed learner {id}");
        }
        LearnerAction::SetStage { stage } => {
            let stage = LifeStage::parse(&stage).ok_or_else(|| format!("unknown life stage: {stage}"))?;
            let mut state = ctx.load_state()?;
            state.life_stage = Some(stage);
            ctx.save_state(&state)?;
            print_json(&json!({ "learner": state.learner_id, "life_stage": stage }))?;
        }
        LearnerAction::SetLevel { level } => {
            let mut state = ctx.load_state()?;
            state.player_level = level;
            ctx.save_state(&state)?;
            print_json(&json!({ "learner": state.learner_id, "player_level": level }))?;
        }
        LearnerAction::AddJournal => {
            let mut state = ctx.load_state()?;
            state.add_journal_entry();
            ctx.save_state(&state)?;
            print_json(&json!({ "journal_entries": state.totals.journal_entries }))?;
        }
        LearnerAction::AddPhoto => {
            let mut state = ctx.load_state()?;
            state.add_photo();
            ctx.save_state(&state)?;
            print_json(&json!({ "photos": state.totals.photos }))?;
        }
    }
    Ok(())
}
