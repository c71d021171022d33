//! Line-driven workout session for the terminal.
//!
//! Each input line is one command. Time is sampled from the wall clock when
//! a line arrives and the session clock is ticked forward to catch up.

use chrono::{DateTime, Duration, Utc};
use fitgen_core::{ClockEvent, ClockState, Phase, Result, WorkoutSession};
use std::io::{BufRead, Write};

/// How the command loop ended
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Abandoned,
}

const HELP: &str = "\
Commands:
  s  start timer      p  pause      r  resume     x  reset timer
  f  finish (record time)          k  skip (no time recorded)
  n  next             b  back       t  show status
  q  quit workout     ?  help";

/// Ticks the running clock once per wall-clock second
#[derive(Default)]
struct Ticker {
    ticked_until: Option<DateTime<Utc>>,
}

impl Ticker {
    fn arm(&mut self, now: DateTime<Utc>) {
        self.ticked_until = Some(now);
    }

    fn catch_up(&mut self, session: &mut WorkoutSession, now: DateTime<Utc>) -> Option<ClockEvent> {
        let running = session
            .clock()
            .is_some_and(|c| c.state() == ClockState::Running);
        if !running {
            self.ticked_until = None;
            return None;
        }

        let mut at = *self.ticked_until.get_or_insert(now);
        while at + Duration::seconds(1) <= now {
            at += Duration::seconds(1);
            match session.tick(at) {
                Some(event) if event.is_done() => {
                    self.ticked_until = None;
                    return Some(event);
                }
                Some(_) => {}
                None => break,
            }
        }
        self.ticked_until = Some(at);
        None
    }
}

pub fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Drive the session until it finishes, the user quits, or input ends
pub fn run_session(
    session: &mut WorkoutSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Outcome> {
    let mut ticker = Ticker::default();

    session.start();
    writeln!(out, "{}", HELP)?;
    print_status(session, out, Utc::now())?;

    while !session.is_finished() {
        write!(out, "> ")?;
        out.flush()?;

        let Some(command) = read_line(input)? else {
            tracing::debug!("Input closed before the workout finished");
            return Ok(Outcome::Abandoned);
        };

        let now = Utc::now();
        if let Some(event) = ticker.catch_up(session, now) {
            report_event(session, &event, out)?;
        }

        match command.as_str() {
            "s" => {
                if session.start_timer(now) {
                    ticker.arm(now);
                } else {
                    writeln!(out, "Timer can't be started now.")?;
                }
            }
            "p" => {
                if !session.pause_timer(now) {
                    writeln!(out, "Timer isn't running.")?;
                }
            }
            "r" => {
                if session.resume_timer(now) {
                    ticker.arm(now);
                } else {
                    writeln!(out, "Timer isn't paused.")?;
                }
            }
            "x" => session.reset_timer(),
            "f" => match session.finish_timer(now) {
                Some(event) => report_event(session, &event, out)?,
                None => writeln!(out, "Nothing to finish.")?,
            },
            "k" => match session.skip() {
                Some(event) => report_event(session, &event, out)?,
                None => writeln!(out, "Nothing to skip.")?,
            },
            "n" => {
                if session.advance(now) {
                    // Rest clocks start on entry
                    ticker.arm(now);
                } else {
                    writeln!(out, "Finish or skip the timer first.")?;
                }
            }
            "b" => {
                if !session.back() {
                    writeln!(out, "Already at the first exercise.")?;
                }
            }
            "t" => {}
            "q" => return Ok(Outcome::Abandoned),
            "?" => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            "" => continue,
            other => {
                writeln!(out, "Unknown command '{}'. Type ? for help.", other)?;
                continue;
            }
        }

        print_status(session, out, now)?;
    }

    Ok(Outcome::Finished)
}

fn report_event(session: &WorkoutSession, event: &ClockEvent, out: &mut impl Write) -> Result<()> {
    let resting = matches!(session.phase(), Phase::Resting { .. });
    match event {
        ClockEvent::Completed { elapsed_seconds } | ClockEvent::Finished { elapsed_seconds } => {
            if resting {
                writeln!(out, "Rest over.")?;
            } else {
                writeln!(out, "Recorded {}s.", elapsed_seconds)?;
            }
        }
        ClockEvent::Skipped => writeln!(out, "Skipped.")?,
        ClockEvent::Tick { .. } => {}
    }
    Ok(())
}

fn print_status(session: &WorkoutSession, out: &mut impl Write, now: DateTime<Utc>) -> Result<()> {
    let total = session.workout().exercises.len();
    let clock = session
        .clock()
        .map(|c| format!("{} ({:?}, {}s elapsed)", c.display(), c.state(), c.elapsed_seconds(now)))
        .unwrap_or_default();

    match (session.phase(), session.current_exercise()) {
        (Phase::Exercising { index }, Some(exercise)) => {
            writeln!(
                out,
                "[{}/{}] {} | {} | {}",
                index + 1,
                total,
                exercise.name(),
                exercise.kind().prescription(),
                clock
            )?;
            if session.can_advance() {
                writeln!(out, "  ready: n for next")?;
            }
        }
        (Phase::Resting { .. }, Some(next)) => {
            writeln!(out, "Rest | up next: {} | {}", next.name(), clock)?;
        }
        (Phase::Finished, _) => writeln!(out, "Workout complete!")?,
        _ => {}
    }
    Ok(())
}
