mod chats;
mod config;
mod error;
mod quiz;

use std::time::Duration;

use chats::ChatLocks;
use config::Settings;
use dotenv::dotenv;
use quiz::{
    results::QuizSummary,
    session::{Event, Outcome, State},
    ContinuationToken, Difficulty, Question, Quiz,
};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode},
    utils::html,
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type QuizStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The .env file is optional, the variables may come from the environment itself
    dotenv().ok();

    pretty_env_logger::init();
    log::info!("Starting times tables bot...");

    let settings = Settings::from_env()?;
    log::info!("Feedback delay: {:?}", settings.feedback_delay);

    let bot = Bot::from_env();

    // Sessions live only as long as the process does
    let storage: QuizStorage = InMemStorage::<State>::new().erase();
    let locks = ChatLocks::default();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveName].endpoint(receive_name))
            .branch(dptree::case![State::ReceiveDifficulty { name }].endpoint(receive_difficulty))
            .branch(dptree::case![State::ReceiveTable { name, difficulty }].endpoint(receive_table))
            .branch(dptree::case![State::Quiz { name, config, quiz }].endpoint(receive_answer))
            .branch(
                dptree::case![State::Results {
                    name,
                    config,
                    questions
                }]
                .endpoint(receive_results_choice),
            ),
    )
    .dependencies(dptree::deps![storage, settings, locks])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const GREETING_TEXT: &str =
    "Привіт! Я -- бот-множилка. Давай вчити таблицю множення! Як тебе звати?";
const NAME_REQUIRED_TEXT: &str = "Будь ласка, введи своє ім'я (текстом)";
const CHOOSE_OPTION_TEXT: &str = "Будь ласка, вибери один з варіантів";
const CHOOSE_TABLE_TEXT: &str = "Будь ласка, вибери число";

const NOVICE_BUTTON: &str = "Новачок (одна таблиця по порядку)";
const SMARTY_BUTTON: &str = "Розумник (одна таблиця врозкид)";
const EXPERT_BUTTON: &str = "Я все знаю! (усі таблиці)";
const CHANGE_NAME_BUTTON: &str = "← Змінити ім'я";
const BACK_BUTTON: &str = "← Назад";
const MENU_BUTTON: &str = "Меню";
const RETRY_BUTTON: &str = "Ще раз";
const FIX_MISTAKES_BUTTON: &str = "Виправити помилки";

async fn start(bot: Bot, dialogue: QuizDialogue, settings: Settings, locks: ChatLocks) -> HandlerResult {
    transition(bot, dialogue, settings, locks, Event::Opened).await
}

async fn receive_name(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(name) => {
            transition(bot, dialogue, settings, locks, Event::NameEntered(name.to_string())).await
        }
        None => {
            bot.send_message(msg.chat.id, NAME_REQUIRED_TEXT).await?;
            Ok(())
        }
    }
}

async fn receive_difficulty(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    msg: Message,
) -> HandlerResult {
    let event = match msg.text() {
        Some(NOVICE_BUTTON) => Event::DifficultyChosen(Difficulty::Novice),
        Some(SMARTY_BUTTON) => Event::DifficultyChosen(Difficulty::Smarty),
        Some(EXPERT_BUTTON) => Event::DifficultyChosen(Difficulty::Expert),
        Some(CHANGE_NAME_BUTTON) => Event::ChangeName,
        _ => {
            bot.send_message(msg.chat.id, CHOOSE_OPTION_TEXT).await?;
            return Ok(());
        }
    };
    transition(bot, dialogue, settings, locks, event).await
}

async fn receive_table(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    msg: Message,
) -> HandlerResult {
    let event = match msg.text().map(str::trim) {
        Some(BACK_BUTTON) => Event::Back,
        Some(text) => match text.parse::<u32>() {
            Ok(table) => Event::TableChosen(table),
            Err(_) => {
                bot.send_message(msg.chat.id, CHOOSE_TABLE_TEXT).await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, CHOOSE_TABLE_TEXT).await?;
            return Ok(());
        }
    };
    transition(bot, dialogue, settings, locks, event).await
}

async fn receive_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    state: State,
    msg: Message,
) -> HandlerResult {
    // Only names the question being answered; the stored state may have moved on
    let question_index = match &state {
        State::Quiz { quiz, .. } => quiz.current,
        _ => return Ok(()),
    };

    let event = match msg.text().map(str::trim) {
        Some(MENU_BUTTON) => Event::Home,
        Some(text) => match text.parse::<u32>() {
            Ok(answer) => Event::AnswerSubmitted {
                question_index,
                answer,
            },
            Err(_) => {
                bot.send_message(msg.chat.id, CHOOSE_OPTION_TEXT).await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, CHOOSE_OPTION_TEXT).await?;
            return Ok(());
        }
    };
    transition(bot, dialogue, settings, locks, event).await
}

async fn receive_results_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    msg: Message,
) -> HandlerResult {
    let event = match msg.text() {
        Some(RETRY_BUTTON) | Some(FIX_MISTAKES_BUTTON) => Event::Retry,
        Some(MENU_BUTTON) => Event::Home,
        _ => {
            bot.send_message(msg.chat.id, CHOOSE_OPTION_TEXT).await?;
            return Ok(());
        }
    };
    transition(bot, dialogue, settings, locks, event).await
}

/// Applies a user event and, when an answer was recorded, schedules the step
/// that moves on once the feedback has been shown.
async fn transition(
    bot: Bot,
    dialogue: QuizDialogue,
    settings: Settings,
    locks: ChatLocks,
    event: Event,
) -> HandlerResult {
    if let Outcome::Answered { token, .. } = commit(&bot, &dialogue, &locks, event).await? {
        schedule_advance(bot, dialogue, locks, settings.feedback_delay, token);
    }
    Ok(())
}

fn schedule_advance(
    bot: Bot,
    dialogue: QuizDialogue,
    locks: ChatLocks,
    delay: Duration,
    token: ContinuationToken,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = advance(bot, dialogue, locks, token).await {
            log::error!("Failed to move quiz {} forward: {}", token.quiz_id, err);
        }
    });
}

async fn advance(
    bot: Bot,
    dialogue: QuizDialogue,
    locks: ChatLocks,
    token: ContinuationToken,
) -> HandlerResult {
    let outcome = commit(&bot, &dialogue, &locks, Event::Advance(token)).await?;
    if matches!(outcome, Outcome::Ignored) {
        log::debug!(
            "Quiz {} was left before question {} moved on",
            token.quiz_id,
            token.question_index + 1
        );
    }
    Ok(())
}

/// Applies `event` to whatever is stored for the chat right now and sends the
/// reply before any other update for the same chat goes through.
async fn commit(
    bot: &Bot,
    dialogue: &QuizDialogue,
    locks: &ChatLocks,
    event: Event,
) -> Result<Outcome, Box<dyn std::error::Error + Send + Sync>> {
    let applied = locks.apply(dialogue, event).await?;
    render(bot, dialogue.chat_id(), &applied.state, &applied.outcome).await?;
    Ok(applied.outcome)
}

async fn render(bot: &Bot, chat_id: ChatId, state: &State, outcome: &Outcome) -> HandlerResult {
    match outcome {
        Outcome::AskName => {
            bot.send_message(chat_id, GREETING_TEXT)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        Outcome::NameRequired => {
            bot.send_message(chat_id, NAME_REQUIRED_TEXT).await?;
        }
        Outcome::ChooseDifficulty => {
            let keyboard = KeyboardMarkup::new(vec![
                vec![KeyboardButton::new(NOVICE_BUTTON)],
                vec![KeyboardButton::new(SMARTY_BUTTON)],
                vec![KeyboardButton::new(EXPERT_BUTTON)],
                vec![KeyboardButton::new(CHANGE_NAME_BUTTON)],
            ]);
            bot.send_message(
                chat_id,
                format!(
                    "Привіт, {}! Обери рівень складності:",
                    state.name().unwrap_or_default()
                ),
            )
            .reply_markup(keyboard)
            .await?;
        }
        Outcome::ChooseTable => {
            let keyboard = KeyboardMarkup::new(vec![
                (2..=5).map(|n| KeyboardButton::new(n.to_string())).collect(),
                (6..=9).map(|n| KeyboardButton::new(n.to_string())).collect(),
                vec![KeyboardButton::new(BACK_BUTTON)],
            ]);
            bot.send_message(
                chat_id,
                format!(
                    "{}, яку таблицю будемо вчити?",
                    state.name().unwrap_or_default()
                ),
            )
            .reply_markup(keyboard)
            .await?;
        }
        Outcome::InvalidTable(err) => {
            log::debug!("Rejected table choice in chat {}: {}", chat_id.0, err);
            bot.send_message(chat_id, "Такої таблиці немає, вибери число від 2 до 9")
                .await?;
        }
        Outcome::ShowQuestion => {
            if let State::Quiz { quiz, .. } = state {
                send_question(bot, chat_id, quiz).await?;
            }
        }
        Outcome::NotAnOption => {
            bot.send_message(chat_id, "Вибери одну з відповідей на клавіатурі")
                .await?;
        }
        Outcome::Answered {
            correct,
            correct_answer,
            ..
        } => {
            let text = if *correct {
                "Правильно! ✅".to_string()
            } else {
                format!("Неправильно ❌ Правильна відповідь -- {}", correct_answer)
            };
            // No keyboard while the feedback is on screen
            bot.send_message(chat_id, text)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        Outcome::Completed(summary) => {
            if let State::Results {
                name, questions, ..
            } = state
            {
                let retry = if summary.is_perfect {
                    RETRY_BUTTON
                } else {
                    FIX_MISTAKES_BUTTON
                };
                let keyboard = KeyboardMarkup::new(vec![vec![
                    KeyboardButton::new(retry),
                    KeyboardButton::new(MENU_BUTTON),
                ]]);
                bot.send_message(chat_id, results_text(name, questions, summary))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboard)
                    .await?;
            }
        }
        Outcome::Ignored => {}
    }
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, quiz: &Quiz) -> HandlerResult {
    let Some(question) = quiz.current_question() else {
        return Ok(());
    };

    let text = format!(
        "Питання {} / {}\n\n<b>{} × {} = ?</b>",
        question.id() + 1,
        quiz.questions.len(),
        question.factor_a(),
        question.factor_b()
    );
    let keyboard = KeyboardMarkup::new(vec![
        question
            .options()
            .iter()
            .map(|option| KeyboardButton::new(option.to_string()))
            .collect(),
        vec![KeyboardButton::new(MENU_BUTTON)],
    ]);

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

fn results_text(name: &str, questions: &[Question], summary: &QuizSummary) -> String {
    let name = html::escape(name);
    if summary.is_perfect {
        return format!(
            "🌟🌟🌟\n<b>Молодець, {}!</b>\nУсі {} відповідей правильні!",
            name, summary.total
        );
    }

    let mut lines = vec![
        format!("<b>Гарна спроба, {}!</b>", name),
        format!("Результат: <b>{}</b> / {}", summary.score, summary.total),
        String::new(),
        "<b>Твої відповіді:</b>".to_string(),
    ];
    lines.extend(questions.iter().map(answer_line));

    if !summary.review_tables.is_empty() {
        lines.push(String::new());
        lines.push("📖 <b>Повтори зараз</b>".to_string());
        for table in &summary.review_tables {
            lines.push(String::new());
            lines.push(format!("<b>Таблиця на {}</b>", table.table));
            lines.extend(table.rows.iter().map(|row| {
                let line = format!("{} × {} = {}", table.table, row.multiplier, row.product);
                if row.needs_attention {
                    format!("❗ <b>{}</b>", line)
                } else {
                    line
                }
            }));
        }
    }

    lines.join("\n")
}

fn answer_line(question: &Question) -> String {
    let expression = format!("{} × {}", question.factor_a(), question.factor_b());
    match (question.user_answer(), question.is_correct()) {
        (Some(answer), Some(true)) => format!("{} = {} ✅", expression, answer),
        (Some(answer), _) => format!(
            "{} = <s>{}</s> {} ❌",
            expression,
            answer,
            question.correct_answer()
        ),
        (None, _) => format!("{} = — {} ❌", expression, question.correct_answer()),
    }
}
