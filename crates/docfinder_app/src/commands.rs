use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;

use docfinder_core::{display_name, ActionKind, Msg};
use docfinder_logging::{df_info, df_warn};

pub(crate) const HELP: &str = "\
commands:
  add <path>...        register folders (quote paths with spaces)
  pick                 choose folders with the directory dialog
  ingest               process every unprocessed folder
  archive <path>       archive a folder (unprocessed folders are removed)
  unarchive <path>     bring an archived folder back into searches
  delete <path>        permanently delete a folder from the index
  count <n>            number of matches per search
  query <text>         search; prompts asking to summarize, synthesize or
  ? <text>             'what do the documents say' start an agent task
  open <path>          preview a file
  close                close the preview
  summarize <path>     stream a summary of a file
  cancel               stop the running task
  close-panel          stop the task and hide its output
  confirm [move|copy|tag]
                       run the pending action (default move)
  dismiss              clear notifications
  help                 show this text
  quit                 exit";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Msg(Msg),
    Help,
    Quit,
}

/// Input for the single-writer loop.
#[derive(Debug)]
pub(crate) enum Input {
    Msg(Msg),
    Quit,
}

pub(crate) fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let msg = match verb {
        "" => return Ok(Command::Msg(Msg::NoOp)),
        "help" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "add" => {
            let paths = split_args(rest)?;
            if paths.is_empty() {
                return Err("add needs at least one path".to_string());
            }
            Msg::FoldersPicked(paths)
        }
        "pick" => Msg::PickFoldersClicked,
        "ingest" => Msg::IngestClicked,
        "archive" => Msg::ArchiveFolder {
            path: single_path(verb, rest)?,
        },
        "unarchive" => Msg::UnarchiveFolder {
            path: single_path(verb, rest)?,
        },
        "delete" => Msg::DeleteFolder {
            path: single_path(verb, rest)?,
        },
        "count" => {
            let count = rest
                .parse::<u32>()
                .map_err(|_| format!("count needs a number, got '{rest}'"))?;
            Msg::MatchCountChanged(count)
        }
        "query" | "?" => Msg::QuerySubmitted(rest.to_string()),
        "open" => {
            let path = single_path(verb, rest)?;
            Msg::OpenFile {
                name: display_name(&path),
                path,
            }
        }
        "close" => Msg::CloseFile,
        "summarize" => {
            let path = single_path(verb, rest)?;
            Msg::SummarizeFile {
                file_name: display_name(&path),
                file_path: path,
                content: None,
            }
        }
        "cancel" => Msg::CancelStream,
        "close-panel" => Msg::CloseOutputPanel,
        "confirm" => {
            let kind = match rest {
                "" => None,
                "move" => Some(ActionKind::MoveFiles),
                "copy" => Some(ActionKind::CopyFiles),
                "tag" => Some(ActionKind::TagFiles),
                other => Some(
                    ActionKind::from_key(other)
                        .ok_or_else(|| format!("unknown action '{other}'"))?,
                ),
            };
            Msg::ConfirmAction { kind }
        }
        "dismiss" => Msg::DismissNotices,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Command::Msg(msg))
}

fn single_path(verb: &str, rest: &str) -> Result<String, String> {
    let mut args = split_args(rest)?;
    match args.len() {
        1 => Ok(args.remove(0)),
        0 => Err(format!("{verb} needs a path")),
        _ => Err(format!("{verb} takes a single path")),
    }
}

/// Whitespace-separated arguments; double quotes group words.
fn split_args(input: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if quoted {
        return Err("unterminated quote".to_string());
    }
    if started {
        args.push(current);
    }
    Ok(args)
}

/// Reads commands from stdin until EOF or `quit`.
pub(crate) fn spawn_stdin_reader(tx: Sender<Input>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("docfinder-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        df_warn!("stdin read failed: {}", err);
                        break;
                    }
                };
                let input = match parse(&line) {
                    Ok(Command::Msg(msg)) => Input::Msg(msg),
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => {
                        println!("{HELP}");
                        continue;
                    }
                    Err(err) => {
                        println!("error: {err}");
                        continue;
                    }
                };
                if tx.send(input).is_err() {
                    return;
                }
            }
            df_info!("input closed");
            let _ = tx.send(Input::Quit);
        })
}
