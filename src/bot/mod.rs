//! Telegram bot module - today's workout, stats and set logging from chat
//!
//! The chat id is the user identity: every handler scopes the shared
//! database to the chat before touching it.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::analytics::{self, ProgramStats};
use crate::db::{CompletionStore, Database, SetKey};
use crate::engine::{DayPlan, Prescription, Program};
use crate::session::log_set;

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedDb = Arc<Mutex<Database>>;

/// Weeks shown by /progress without an argument
const DEFAULT_PROGRESS_WEEKS: u32 = 4;

const NOT_ON_PLAN: &str = "That exercise is not on today's plan. /log to start over";

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Exercise picked, waiting for the set number
    WaitingForSet { exercise: String },
    WaitingForWeight { exercise: String, set: u32 },
    WaitingForReps { exercise: String, set: u32, weight: f64 },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Today's workout")]
    Today,
    #[command(description = "Program statistics")]
    Stats,
    #[command(description = "Key lifts over the last N weeks")]
    Progress(String),
    #[command(description = "Log a set")]
    Log,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Lock the database and scope it to the chat's user
async fn user_db(db: &SharedDb, chat: ChatId) -> tokio::sync::MutexGuard<'_, Database> {
    let mut guard = db.lock().await;
    guard.set_user(&chat.to_string());
    guard
}

/// Every prescription of the day, cardio last
fn prescriptions(plan: &DayPlan) -> Vec<&Prescription> {
    plan.exercises
        .iter()
        .chain(plan.cardio.as_ref().map(|c| &c.prescription))
        .collect()
}

fn format_plan(plan: &DayPlan, completed: &BTreeSet<SetKey>) -> String {
    let mut text = format!(
        "📅 {} - Week {} (cycle {})\n{}\n\n{}\n",
        plan.date,
        plan.position.week,
        plan.position.week_in_cycle,
        plan.position.phase,
        plan.label()
    );
    if plan.is_rest_day() {
        text.push_str("\nRest day. Recover!");
        return text;
    }

    for p in &plan.exercises {
        let marks: String = (0..p.sets)
            .map(|set| {
                if completed.contains(&SetKey::new(&p.exercise, set)) { "✅" } else { "⬜" }
            })
            .collect();
        let adjusted = if p.is_adjusted {
            format!(" ({:+.2})", p.adjustment)
        } else {
            String::new()
        };
        text.push_str(&format!(
            "• {} - {} x {} x {}{} {}\n",
            p.exercise, p.weight, p.reps, p.sets, adjusted, marks
        ));
    }
    if let Some(cardio) = &plan.cardio {
        text.push_str(&format!(
            "\n🚴 {} {} - {}\n",
            cardio.prescription.exercise, cardio.prescription.reps, cardio.protocol
        ));
    }
    text
}

/// Inline keyboard with the day's exercises
fn make_exercises_keyboard(plan: &DayPlan) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = prescriptions(plan)
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(i, p)| {
                    InlineKeyboardButton::callback(p.exercise.clone(), format!("ex:{}", i))
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Start the Telegram bot
pub async fn run_bot(token: String, db_path: &str, program: Program) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db: SharedDb = Arc::new(Mutex::new(Database::open(db_path, "telegram")?));
    let program = Arc::new(program);

    info!("Bot started, program start {}", program.clock().start());

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, program])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    db: SharedDb,
    program: Arc<Program>,
) -> HandlerResult {
    let chat = msg.chat.id;
    match cmd {
        Command::Start => {
            let text = "🏋️ liftplan\n\n\
                52-week periodized strength program\n\n\
                /today - today's workout\n\
                /log - log a set\n\
                /stats - program statistics\n\
                /progress 4 - key lifts over the last 4 weeks";
            bot.send_message(chat, text).await?;
        }

        Command::Help => {
            bot.send_message(chat, Command::descriptions().to_string()).await?;
        }

        Command::Today => {
            let db = user_db(&db, chat).await;
            let plan = program.plan_day(today(), &*db);
            let completed = db.completed_sets(plan.date)?;
            bot.send_message(chat, format_plan(&plan, &completed)).await?;
        }

        Command::Stats => {
            let db = user_db(&db, chat).await;
            let stats = ProgramStats::compute(&program, today(), &*db)?;

            let mut text = format!(
                "📈 Statistics\n\n\
                Week: {}\n\
                {}\n\
                Workouts: {} / {} ({}%)\n\n\
                Milestones:\n",
                stats.weeks_passed,
                stats.phase,
                stats.workouts_done,
                stats.total_workouts,
                stats.completion_rate
            );
            for m in &stats.milestones {
                let status = if m.reached {
                    "✅".to_string()
                } else {
                    format!("{} weeks", m.weeks_remaining)
                };
                text.push_str(&format!("• {} (week {}): {}\n", m.name, m.week, status));
            }
            bot.send_message(chat, text).await?;
        }

        Command::Progress(arg) => {
            let weeks = match arg.trim() {
                "" => DEFAULT_PROGRESS_WEEKS,
                n => match n.parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        bot.send_message(chat, "Usage: /progress <weeks>, e.g. /progress 4").await?;
                        return Ok(());
                    }
                },
            };

            let db = user_db(&db, chat).await;
            let current = program.clock().week(today());
            let horizon = current.saturating_sub(weeks - 1).max(1)..=current;

            let mut text = format!("📊 Weeks {}-{}\n", horizon.start(), horizon.end());
            for exercise in analytics::key_exercises(&program) {
                let points = analytics::project(&program, exercise, horizon.clone(), &*db)?;
                text.push_str(&format!("\n{}\n", exercise.name));
                for p in &points {
                    let actual = p
                        .actual_weight
                        .map(|w| format!("{:.1}kg", w))
                        .unwrap_or_else(|| "-".to_string());
                    text.push_str(&format!("  W{}: {} → {}\n", p.week, p.expected_weight, actual));
                }
                if let Some(predictor) = analytics::trend(&program, exercise, today(), &*db)? {
                    text.push_str(&format!(
                        "  trend {:+.2} kg/week\n",
                        predictor.kg_per_week()
                    ));
                }
            }
            bot.send_message(chat, text).await?;
        }

        Command::Log => {
            let db = user_db(&db, chat).await;
            let plan = program.plan_day(today(), &*db);
            if plan.is_rest_day() {
                bot.send_message(chat, "Rest day today, nothing to log.").await?;
                return Ok(());
            }
            dialogue.reset().await?;
            bot.send_message(chat, "Pick an exercise:")
                .reply_markup(make_exercises_keyboard(&plan))
                .await?;
        }
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MyDialogue,
    db: SharedDb,
    program: Arc<Program>,
) -> HandlerResult {
    if let Some(index) = q.data.as_deref().and_then(|d| d.strip_prefix("ex:"))
        && let Ok(index) = index.parse::<usize>()
        && let Some(msg) = &q.message
    {
        let chat = msg.chat().id;
        let db = user_db(&db, chat).await;
        let plan = program.plan_day(today(), &*db);

        if let Some(p) = prescriptions(&plan).get(index) {
            dialogue
                .update(State::WaitingForSet { exercise: p.exercise.clone() })
                .await?;
            let text = format!(
                "{}\nTarget: {} x {} x {}\n\nWhich set? (1-{})",
                p.exercise, p.weight, p.reps, p.sets, p.sets
            );
            bot.edit_message_text(chat, msg.id(), text).await?;
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    db: SharedDb,
    program: Arc<Program>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let state = dialogue.get().await?.unwrap_or_default();
    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };

    // Prescription for the exercise in the current dialogue
    let prescription = |exercise: &str, db: &Database| {
        program.plan_day(today(), db).prescription(exercise).cloned()
    };

    match state {
        State::WaitingForSet { exercise } => {
            let p = {
                let db = user_db(&db, chat).await;
                prescription(&exercise, &*db)
            };
            let Some(p) = p else {
                dialogue.reset().await?;
                bot.send_message(chat, NOT_ON_PLAN).await?;
                return Ok(());
            };
            match text.parse::<u32>() {
                Ok(set) if set >= 1 && set <= p.sets => {
                    let hint = p
                        .weight
                        .kg()
                        .map(|kg| format!(" (target {}kg)", kg))
                        .unwrap_or_default();
                    dialogue
                        .update(State::WaitingForWeight { exercise, set: set - 1 })
                        .await?;
                    bot.send_message(chat, format!("Set {}: weight in kg?{}", set, hint)).await?;
                }
                _ => {
                    bot.send_message(chat, format!("Enter a set number from 1 to {}", p.sets))
                        .await?;
                }
            }
        }

        State::WaitingForWeight { exercise, set } => match text.replace(',', ".").parse::<f64>() {
            Ok(weight) if weight.is_finite() && weight >= 0.0 => {
                dialogue
                    .update(State::WaitingForReps { exercise, set, weight })
                    .await?;
                bot.send_message(chat, "How many reps?").await?;
            }
            _ => {
                bot.send_message(chat, "Enter the weight in kg (a number, 0 for bodyweight)")
                    .await?;
            }
        },

        State::WaitingForReps { exercise, set, weight } => {
            let Ok(reps) = text.parse::<u32>() else {
                bot.send_message(chat, "Enter the number of reps").await?;
                return Ok(());
            };

            let logged = {
                let mut db = user_db(&db, chat).await;
                match prescription(&exercise, &*db) {
                    Some(p) => {
                        log_set(&mut *db, today(), &p, set, weight, reps)?;
                        let done = db
                            .completed_sets(today())?
                            .iter()
                            .filter(|k| k.exercise == exercise && k.set_index < p.sets)
                            .count();
                        Some((p, done))
                    }
                    None => None,
                }
            };
            let Some((p, done)) = logged else {
                dialogue.reset().await?;
                bot.send_message(chat, NOT_ON_PLAN).await?;
                return Ok(());
            };
            info!(chat = %chat, %exercise, set, "logged set via bot");

            let response = format!(
                "✅ Recorded!\n\n{} set {} - {}kg x {}\nTarget: {} x {}\n\nDone: {}/{} sets\n\n/log - next set",
                exercise,
                set + 1,
                weight,
                reps,
                p.weight,
                p.reps,
                done,
                p.sets
            );
            bot.send_message(chat, response).await?;
            dialogue.reset().await?;
        }

        State::Start => {
            bot.send_message(chat, "Send /today to see the workout or /log to record a set")
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn plan(date: NaiveDate) -> DayPlan {
        let program = Program::builtin(NaiveDate::from_ymd_opt(2025, 8, 19).unwrap());
        program.plan_day(date, &MemoryStore::default())
    }

    #[test]
    fn test_format_plan_marks_sets() {
        let plan = plan(NaiveDate::from_ymd_opt(2025, 8, 19).unwrap());
        let completed = BTreeSet::from([SetKey::new("DB Lateral Raises", 0)]);
        let text = format_plan(&plan, &completed);
        assert!(text.contains("SHOULDERS & BICEPS & TRICEPS"), "{}", text);
        assert!(text.contains("• DB Lateral Raises - 7.5kg x 15 x 2 ✅⬜"), "{}", text);
        assert!(text.contains("Bike Intervals"), "{}", text);
    }

    #[test]
    fn test_format_rest_day() {
        let sunday = NaiveDate::from_ymd_opt(2025, 8, 24).unwrap();
        let text = format_plan(&plan(sunday), &BTreeSet::new());
        assert!(text.contains("REST DAY"));
        assert!(text.contains("Rest day. Recover!"));
    }

    #[test]
    fn test_keyboard_indexes_exercises_and_cardio() {
        let plan = plan(NaiveDate::from_ymd_opt(2025, 8, 19).unwrap());
        let count = prescriptions(&plan).len();
        assert_eq!(count, plan.exercises.len() + 1);
        let keyboard = make_exercises_keyboard(&plan);
        let buttons: usize = keyboard.inline_keyboard.iter().map(|row| row.len()).sum();
        assert_eq!(buttons, count);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() <= 2));
    }
}
