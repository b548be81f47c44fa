use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use chrono_english::parse_date_string;
use clap::{Parser, ValueEnum};

use crate::{
    store::{kv::KvStore, session_store::SessionStore},
    utils::format::local_timestamp,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(
        long = "start",
        short,
        help = "Start of the range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Prints timesheet entries newest first, optionally filtered to a
/// human-readable date range on their start time.
pub fn process_log_command<S: KvStore>(store: &SessionStore<S>, command: LogCommand) -> Result<()> {
    let (start, end) = parse_range(&command)?;

    let log = store.load_log()?;
    let rows: Vec<_> = log
        .iter()
        .filter(|session| {
            start.map_or(true, |s| session.start >= s)
                && end.map_or(true, |e| session.start <= e)
        })
        .collect();

    if rows.is_empty() {
        println!("No data found");
        return Ok(());
    }

    println!("From\tTo");
    for session in rows {
        let end = session
            .end
            .map(local_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}", local_timestamp(session.start), end);
    }
    Ok(())
}

fn parse_range(command: &LogCommand) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let now = Local::now();
    let dialect: chrono_english::Dialect = command.date_style.into();

    let parse = |raw: &Option<String>, name: &str| -> Result<Option<DateTime<Utc>>> {
        match raw {
            Some(raw) => parse_date_string(raw, now, dialect)
                .map(|v| Some(v.with_timezone(&Utc)))
                .map_err(|e| anyhow!("Failed to validate {name} date {e}")),
            None => Ok(None),
        }
    };

    Ok((
        parse(&command.start_date, "start")?,
        parse(&command.end_date, "end")?,
    ))
}
