use std::fmt;
use std::io::Write as _;

use services::{AppServices, EngineView, RollResult, SessionManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use trivia_core::model::{FlowStep, Outcome, TopicId, UnknownTopic};

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayCommand {
    New,
    Roll,
    Accept,
    Choose(TopicId),
    Flip,
    Reveal,
    Done,
    Skip,
    Pile,
    Older,
    Newer,
    Jump(usize),
    Back,
    Reshuffle(Option<TopicId>),
    End,
    Status,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument { command: &'static str },
    UnknownTopic(UnknownTopic),
    InvalidPosition(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("type a command, or `help`"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            CommandError::MissingArgument { command } => write!(f, "{command} needs an argument"),
            CommandError::UnknownTopic(err) => write!(f, "{err}"),
            CommandError::InvalidPosition(raw) => write!(f, "not a pile position: {raw}"),
        }
    }
}

impl PlayCommand {
    fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let arg = words.next();

        let topic = |command: &'static str| -> Result<TopicId, CommandError> {
            arg.ok_or(CommandError::MissingArgument { command })?
                .parse()
                .map_err(CommandError::UnknownTopic)
        };

        Ok(match head.to_ascii_lowercase().as_str() {
            "new" => Self::New,
            "roll" => Self::Roll,
            "accept" => Self::Accept,
            "choose" => Self::Choose(topic("choose")?),
            "flip" => Self::Flip,
            "reveal" => Self::Reveal,
            "done" => Self::Done,
            "skip" => Self::Skip,
            "pile" => Self::Pile,
            "older" => Self::Older,
            "newer" => Self::Newer,
            "jump" => {
                let raw = arg.ok_or(CommandError::MissingArgument { command: "jump" })?;
                let position = raw
                    .parse()
                    .map_err(|_| CommandError::InvalidPosition(raw.to_string()))?;
                Self::Jump(position)
            }
            "back" => Self::Back,
            "reshuffle" => Self::Reshuffle(arg.map(|_| topic("reshuffle")).transpose()?),
            "end" => Self::End,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        })
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// Interactive loop over stdin. The session is flushed when the loop ends.
pub async fn run(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = services.open_session().await?;
    tracing::info!(session_id = %manager.view().session_id, "session opened");
    print_status(&manager.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match PlayCommand::parse(&line) {
            Ok(PlayCommand::Quit) => break,
            Ok(command) => {
                tracing::debug!(?command, "command");
                apply(&mut manager, command).await;
            }
            Err(CommandError::Empty) => {}
            Err(err) => println!("{err}"),
        }
        prompt()?;
    }

    if !manager.flush().await {
        eprintln!("last changes could not be saved; see log");
    }
    manager.shutdown();
    tracing::info!("session closed");
    Ok(())
}

async fn apply(manager: &mut SessionManager, command: PlayCommand) {
    match command {
        PlayCommand::New => {
            manager.new_game();
            println!("new game; roll the die");
        }
        PlayCommand::Roll => match manager.roll() {
            RollResult::Rolled(Outcome::Category(topic)) => {
                println!("the die says {topic}; `accept` to draw");
            }
            RollResult::Rolled(Outcome::Choose(mode)) => {
                println!("choose a topic ({mode} picks): `choose <topic>`");
            }
            RollResult::Exhausted => {
                println!("every card has been played; `reshuffle` or `end`");
            }
        },
        PlayCommand::Accept => draw(manager, None),
        PlayCommand::Choose(topic) => draw(manager, Some(topic)),
        PlayCommand::Flip => {
            if manager.flip() {
                print_card(&manager.view(), true);
            } else if manager.current_question().is_some() {
                print_card(&manager.view(), false);
            } else {
                println!("no card on the table");
            }
        }
        PlayCommand::Reveal => {
            if manager.reveal_answer() {
                print_card(&manager.view(), true);
            } else {
                println!("no card on the table");
            }
        }
        PlayCommand::Done => match manager.complete_current_question() {
            Some(question) => println!("discarded #{}", question.id()),
            None => println!("no card on the table"),
        },
        PlayCommand::Skip => {
            if !manager.abandon_current() {
                println!("no card on the table");
            }
        }
        PlayCommand::Pile => {
            manager.open_discard_pile();
            print_pile(&manager.view());
        }
        PlayCommand::Older => {
            manager.go_older();
            print_pile(&manager.view());
        }
        PlayCommand::Newer => {
            manager.go_newer();
            print_pile(&manager.view());
        }
        PlayCommand::Jump(position) => {
            if !manager.jump_to(position) && manager.history().get(position).is_none() {
                println!("the pile has no card at {position}");
            }
            print_pile(&manager.view());
        }
        PlayCommand::Back => {
            manager.close_discard_pile();
            print_status(&manager.view());
        }
        PlayCommand::Reshuffle(Some(topic)) => {
            manager.reset_topic(topic);
            println!("{topic} reshuffled");
        }
        PlayCommand::Reshuffle(None) => {
            manager.reset_all();
            println!("every topic reshuffled");
        }
        PlayCommand::End => {
            manager.end_game().await;
            println!("game over; `new` to start again");
        }
        PlayCommand::Status => print_status(&manager.view()),
        PlayCommand::Help => print_help(),
        PlayCommand::Quit => {}
    }
}

fn draw(manager: &mut SessionManager, topic: Option<TopicId>) {
    let drawn = match topic {
        Some(topic) => manager.choose_topic(topic),
        None => manager.accept_result(),
    };
    match (drawn, topic.or(manager.state().pending_result_topic())) {
        (Some(_), _) => print_card(&manager.view(), false),
        (None, Some(topic)) => println!("{topic} is out of cards; `reshuffle {topic}` or pick another"),
        (None, None) => println!("nothing to accept; `roll` first"),
    }
}

//
// ─── OUTPUT ────────────────────────────────────────────────────────────────────
//

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

fn print_card(view: &EngineView, show_answer: bool) {
    let Some(question) = &view.current_question else {
        return;
    };
    println!("[{}] {}", question.topic(), question.prompt());
    if !question.date_label().is_empty() {
        println!("    ({})", question.date_label());
    }
    if show_answer || view.is_flipped || view.has_revealed_answer {
        println!("    answer: {}", question.answer_label());
    }
}

fn print_pile(view: &EngineView) {
    let pile = &view.discard;
    match (pile.position, &pile.current) {
        (Some((n, m)), Some(question)) => {
            println!("pile {n}/{m}: [{}] {}", question.topic(), question.prompt());
            println!("    answer: {}", question.answer_label());
        }
        _ => println!("the discard pile is empty"),
    }
}

fn print_status(view: &EngineView) {
    println!("session {} on {:?}", view.session_id, view.flow_step);
    for status in &view.topics {
        let marker = if status.is_exhausted {
            " (empty)"
        } else if status.is_low {
            " (low)"
        } else {
            ""
        };
        println!(
            "  {:<10} {:>2}/{}{marker}",
            status.topic.as_str(),
            status.remaining,
            status.total
        );
    }
    if view.flow_step == FlowStep::Question {
        print_card(view, false);
    }
    if view.deck_exhausted {
        println!("every card has been played; `reshuffle` or `end`");
    }
}

fn print_help() {
    println!("new | roll | accept | choose <topic> | flip | reveal | done | skip");
    println!("pile | older | newer | jump <n> | back | reshuffle [topic] | end | status | quit");
    let topics: Vec<&str> = TopicId::ALL.iter().map(|topic| topic.as_str()).collect();
    println!("topics: {}", topics.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(PlayCommand::parse("roll"), Ok(PlayCommand::Roll));
        assert_eq!(
            PlayCommand::parse("choose Science"),
            Ok(PlayCommand::Choose(TopicId::Science))
        );
        assert_eq!(PlayCommand::parse("  jump 3 "), Ok(PlayCommand::Jump(3)));
        assert_eq!(PlayCommand::parse("reshuffle"), Ok(PlayCommand::Reshuffle(None)));
        assert_eq!(
            PlayCommand::parse("reshuffle geography"),
            Ok(PlayCommand::Reshuffle(Some(TopicId::Geography)))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(PlayCommand::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            PlayCommand::parse("choose"),
            Err(CommandError::MissingArgument { command: "choose" })
        );
        assert!(matches!(
            PlayCommand::parse("choose sports"),
            Err(CommandError::UnknownTopic(_))
        ));
        assert!(matches!(
            PlayCommand::parse("jump -1"),
            Err(CommandError::InvalidPosition(_))
        ));
        assert!(matches!(PlayCommand::parse("dance"), Err(CommandError::Unknown(_))));
    }
}
