use std::fmt::Write as _;
use std::io;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use crate::app::{Action, Screen};

static CHAPTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("chapter number pattern is valid"));

pub static HELP: &str = "\
commands:
  list                                  show the library
  add <title> | <site> | <chapter url>  track a new manga
  rm <n>                                remove manga n
  set <n> <chapter url>                 set the last read chapter of manga n
  read <n>                              open manga n in the reader
  next / prev                           move the reader one chapter
  back                                  return to the library
  help                                  show this text
  quit                                  exit";

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    List,
    Help,
    Quit,
}

/// Reads one line from stdin. `None` at end of input.
#[instrument]
pub fn get_user_input() -> Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    debug!("user input: {}", line.trim_end());
    Ok(Some(line))
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

    let command = match verb.to_lowercase().as_str() {
        "" | "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "back" => Command::Action(Action::BackToLibrary),
        "next" => Command::Action(Action::NextChapter),
        "prev" => Command::Action(Action::PrevChapter),
        "rm" | "remove" => Command::Action(Action::Remove(parse_position(rest)?)),
        "read" | "open" => Command::Action(Action::OpenReader(parse_position(rest)?)),
        "set" => {
            let (position, url) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow::anyhow!("usage: set <n> <chapter url>"))?;
            Command::Action(Action::UpdateChapter {
                index: parse_position(position)?,
                chapter_url: url.trim().to_owned(),
            })
        }
        "add" => {
            let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
            let [title, site, chapter_url] = parts.as_slice() else {
                anyhow::bail!("usage: add <title> | <site> | <chapter url>");
            };
            Command::Action(Action::Add {
                title: title.to_string(),
                site: site.to_string(),
                chapter_url: chapter_url.to_string(),
            })
        }
        other => anyhow::bail!("unknown command '{}', type 'help'", other),
    };
    Ok(command)
}

/// 1-based position typed by the user to 0-based index.
fn parse_position(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => anyhow::bail!("'{}' is not a valid position", value.trim()),
    }
}

/// Shifts the last number in the URL path by `delta`, keeping zero padding
/// only when the number was written with a leading zero.
/// `None` when the path has no number or the result would drop below 1.
pub fn step_chapter(chapter_url: &str, delta: i64) -> Option<String> {
    let mut url = Url::parse(chapter_url.trim()).ok()?;
    let path = url.path().to_owned();

    let number = CHAPTER_NUMBER.captures(&path)?.get(1)?;
    let current: i64 = number.as_str().parse().ok()?;
    let next = current.checked_add(delta).filter(|n| *n >= 1)?;

    let width = if number.as_str().starts_with('0') {
        number.as_str().len()
    } else {
        0
    };
    let stepped = format!(
        "{}{:0width$}{}",
        &path[..number.start()],
        next,
        &path[number.end()..],
    );
    url.set_path(&stepped);
    Some(url.into())
}

pub fn render_screen(screen: &Screen) -> String {
    let mut out = String::new();

    match screen {
        Screen::Library(view) => {
            let _ = writeln!(out, "\n=== Manga Library ===");
            if let Some(placeholder) = view.placeholder {
                let _ = writeln!(out, "{}", placeholder);
            }
            for item in &view.items {
                let _ = writeln!(
                    out,
                    "{:>3}. {} ({})\n     last chapter: {}",
                    item.position, item.title, item.site, item.last_chapter
                );
            }
            if let Some(error) = &view.error {
                let _ = writeln!(out, "! {}", error);
            }
        }
        Screen::Reader(view) => {
            let _ = writeln!(out, "\n=== {} ({}) ===", view.title, view.site);
            let _ = writeln!(out, "chapter: {}", view.chapter_url);
            for (i, image) in view.images.iter().enumerate() {
                let _ = writeln!(out, "{:>4}  {}", i + 1, image);
            }
            if let Some(message) = view.message {
                let _ = writeln!(out, "{}", message);
            }
            if let Some(error) = &view.error {
                let _ = writeln!(out, "! {}", error);
            }
        }
    }
    out
}

#[instrument]
pub fn display_elapsed_time(duration: Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("chapter loaded in {}m {}s", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        info!("chapter loaded in {}.{:03}s", secs, ms_remaining);
    } else {
        info!("chapter loaded in {}ms", total_ms);
    }
}
