use std::path::PathBuf;

use panel_core::{AppViewModel, DialogChoice, Msg, ScrapeForm};

pub const HELP: &str = "\
commands:
  show                      redraw the panel
  select <file>             load another bulk file
  set <text>                replace the editor text (\\n for newlines)
  append <line>             add a line to the editor text
  save                      save the editor text
  yes | no | cancel         answer the open prompt
  rename <name>             rename the current bulk file
  delete                    delete the current bulk file
  new                       create a new bulk file
  default                   make the current file the default
  import <path.txt>         load a local text file into the editor
  schedule <HH:MM>          schedule the current file
  unschedule                cancel the current file's schedule
  run                       start a bulk import of the editor text
  scrape <url> <year> [option,...]
  upload <path.zip> [title] [year]
  config key=value ...      edit and submit the config (password=... sets a new one)
  update                    install the available update
  help | quit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    Send(Msg),
    ImportFile(PathBuf),
    UploadFile {
        path: PathBuf,
        title: String,
        year: String,
    },
    EditConfig(Vec<(String, String)>),
    Show,
    Help,
    Quit,
}

pub fn parse(line: &str, view: &AppViewModel) -> Result<ConsoleAction, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match verb {
        "" | "show" => ConsoleAction::Show,
        "help" | "?" => ConsoleAction::Help,
        "quit" | "exit" => ConsoleAction::Quit,
        "select" => ConsoleAction::Send(Msg::BulkFileSelected(required(rest, "a file name")?)),
        "set" => ConsoleAction::Send(Msg::BulkTextEdited(rest.replace("\\n", "\n"))),
        "append" => {
            let mut text = view.editor_text.clone();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(rest);
            ConsoleAction::Send(Msg::BulkTextEdited(text))
        }
        "save" => ConsoleAction::Send(Msg::SaveBulkClicked),
        "yes" => ConsoleAction::Send(Msg::DialogAnswered(DialogChoice::Save)),
        "no" => ConsoleAction::Send(Msg::DialogAnswered(DialogChoice::Discard)),
        "cancel" => ConsoleAction::Send(Msg::DialogAnswered(DialogChoice::Cancel)),
        "rename" => ConsoleAction::Send(Msg::RenameRequested(required(rest, "a new name")?)),
        "delete" => ConsoleAction::Send(Msg::DeleteRequested),
        "new" => ConsoleAction::Send(Msg::CreateRequested),
        "default" => ConsoleAction::Send(Msg::MakeDefaultClicked),
        "import" => ConsoleAction::ImportFile(PathBuf::from(required(rest, "a path")?)),
        "schedule" => ConsoleAction::Send(Msg::ScheduleRequested(required(rest, "a time")?)),
        "unschedule" => ConsoleAction::Send(Msg::ScheduleCancelled),
        "run" => ConsoleAction::Send(Msg::BulkImportStarted),
        "scrape" => ConsoleAction::Send(Msg::ScrapeSubmitted(parse_scrape(rest))),
        "upload" => {
            let mut parts = rest.split_whitespace();
            let path = parts.next().ok_or("upload needs a path")?;
            ConsoleAction::UploadFile {
                path: PathBuf::from(path),
                title: parts.next().unwrap_or_default().to_string(),
                year: parts.next().unwrap_or_default().to_string(),
            }
        }
        "config" => ConsoleAction::EditConfig(parse_assignments(rest)?),
        "update" => ConsoleAction::Send(Msg::UpdateAppClicked),
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(action)
}

fn required(rest: &str, what: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("expected {what}"))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_scrape(rest: &str) -> ScrapeForm {
    let mut parts = rest.split_whitespace();
    let url = parts.next().unwrap_or_default().to_string();
    let year = parts.next().unwrap_or_default().to_string();
    let options = parts
        .next()
        .map(|list| {
            list.split(',')
                .filter(|item| !item.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();
    ScrapeForm {
        url,
        year,
        options,
        filters: Vec::new(),
    }
}

/// Splits `key=value` pairs; a word without `=` continues the previous value,
/// so `movie_library=Movies,4K Movies` keeps its space.
fn parse_assignments(rest: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in rest.split_whitespace() {
        if let Some((key, value)) = word.split_once('=').filter(|(key, _)| !key.is_empty()) {
            pairs.push((key.to_string(), value.to_string()));
            continue;
        }
        let Some((_, value)) = pairs.last_mut() else {
            return Err(format!("expected key=value, got '{word}'"));
        };
        value.push(' ');
        value.push_str(word);
    }
    if pairs.is_empty() {
        return Err("config needs at least one key=value".to_string());
    }
    Ok(pairs)
}
