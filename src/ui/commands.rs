// Input commands for the idxd-pager terminal front-end
// One command per line; an empty line scrolls down one screen.
//
// Commands:
// - open/cd <path>: Open a directory (relative to the current one)
// - up / ..: Go to the parent directory
// - search <query> or /<query>: Search file names
// - back: Leave search results, return to the directory
// - (empty) / scroll / j: Scroll one screen down
// - more / m: Click the "load more" control
// - retry / r: Retry a failed page
// - online: Connectivity came back
// - sort <name|date|size> [asc|desc]: Change sort
// - filter <all|images|videos|favorites>: Change filter
// - refresh: Drop the cached copy and reload
// - view <n>: Select the n-th loaded item
// - next / n, prev / p: Move the selection, skipping folders
// - stats, cache, help, quit / q

use thiserror::Error;

use crate::models::{MediaFilter, SortField, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Up,
    Search(String),
    Back,
    Scroll,
    LoadMore,
    Retry,
    Online,
    Sort(SortField, Option<SortOrder>),
    Filter(MediaFilter),
    Refresh,
    View(usize),
    Next,
    Prev,
    Stats,
    Cache,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help`")]
    Unknown(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("`{value}` is not a valid {what}")]
    InvalidValue { value: String, what: &'static str },
}

pub const HELP: &str = "\
open <path>     open a directory        up          parent directory
search <query>  search file names       back        return to the directory
<enter>         scroll down             more        load the next page
retry           retry a failed page     online      connectivity restored
sort <f> [o]    name|date|size asc|desc filter <f>  all|images|videos|favorites
refresh         reload from page 1      view <n>    select item n
next / prev     move selection          stats       status line
cache           cached contexts         quit        exit";

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Scroll);
        }
        if let Some(query) = line.strip_prefix('/') {
            return non_empty(query, "search", "a query").map(Self::Search);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "open" | "cd" => non_empty(rest, "open", "a path").map(Self::Open),
            "up" | ".." => Ok(Self::Up),
            "search" | "s" => non_empty(rest, "search", "a query").map(Self::Search),
            "back" | "b" => Ok(Self::Back),
            "scroll" | "j" => Ok(Self::Scroll),
            "more" | "m" => Ok(Self::LoadMore),
            "retry" | "r" => Ok(Self::Retry),
            "online" => Ok(Self::Online),
            "sort" => parse_sort(rest),
            "filter" => {
                let value = non_empty(rest, "filter", "a filter")?;
                MediaFilter::parse(&value)
                    .map(Self::Filter)
                    .ok_or(CommandError::InvalidValue {
                        value,
                        what: "filter",
                    })
            }
            "refresh" => Ok(Self::Refresh),
            "view" | "v" => {
                let value = non_empty(rest, "view", "an item number")?;
                match value.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Self::View(n)),
                    _ => Err(CommandError::InvalidValue {
                        value,
                        what: "item number",
                    }),
                }
            }
            "next" | "n" => Ok(Self::Next),
            "prev" | "p" => Ok(Self::Prev),
            "stats" => Ok(Self::Stats),
            "cache" => Ok(Self::Cache),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn non_empty(value: &str, command: &'static str, what: &'static str) -> Result<String, CommandError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CommandError::MissingArgument { command, what });
    }
    Ok(value.to_string())
}

fn parse_sort(rest: &str) -> Result<Command, CommandError> {
    let mut parts = rest.split_whitespace();
    let field = parts.next().ok_or(CommandError::MissingArgument {
        command: "sort",
        what: "a field",
    })?;
    let field = SortField::parse(field).ok_or_else(|| CommandError::InvalidValue {
        value: field.to_string(),
        what: "sort field",
    })?;
    let order = match parts.next() {
        Some(order) => Some(SortOrder::parse(order).ok_or_else(|| CommandError::InvalidValue {
            value: order.to_string(),
            what: "sort order",
        })?),
        None => None,
    };
    Ok(Command::Sort(field, order))
}
