use std::fmt::Write;
use std::thread;

use docfinder_core::{AppViewModel, NoticeLevel, StreamPhase};
use docfinder_logging::{df_info, df_warn};
use tokio::sync::watch;

const SNIPPET_CHARS: usize = 160;

/// Turns successive view models into terminal output, printing only what
/// changed since the previous frame.
#[derive(Debug, Default)]
pub(crate) struct Renderer {
    last: AppViewModel,
    last_notice_id: u64,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel, stamp: &str) -> String {
        let mut out = String::new();

        for notice in view.notices.iter().filter(|n| n.id > self.last_notice_id) {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Error => "error",
            };
            let _ = writeln!(out, "[{stamp}] {tag}: {}", notice.text);
        }
        if let Some(id) = view.notices.iter().map(|n| n.id).max() {
            self.last_notice_id = self.last_notice_id.max(id);
        }

        if view.folders != self.last.folders || view.ingest_in_flight != self.last.ingest_in_flight
        {
            render_folders(&mut out, view);
        }
        if view.results != self.last.results || view.tag_color != self.last.tag_color {
            render_results(&mut out, view);
        }
        if view.search_loading && !self.last.search_loading {
            let _ = writeln!(out, "searching for \"{}\"...", view.query);
        }
        self.render_stream(&mut out, view);
        if view.selected_file != self.last.selected_file {
            render_preview(&mut out, view);
        }

        self.last = view.clone();
        out
    }

    fn render_stream(&self, out: &mut String, view: &AppViewModel) {
        let stream = &view.stream;
        let previous = &self.last.stream;
        if !stream.panel_open {
            if previous.panel_open {
                let _ = writeln!(out, "-- output closed --");
            }
            return;
        }

        let continues = previous.panel_open && stream.output.starts_with(&previous.output);
        let fresh_task = stream.phase == StreamPhase::Running && previous.phase != StreamPhase::Running;
        if fresh_task || !continues {
            let topic = stream
                .metadata
                .as_ref()
                .and_then(|meta| meta.topic.as_deref())
                .unwrap_or("task");
            let _ = writeln!(out, "== {topic} ==");
            out.push_str(&stream.output);
        } else {
            out.push_str(&stream.output[previous.output.len()..]);
        }

        if stream.phase != previous.phase {
            let ending = match stream.phase {
                StreamPhase::Completed => Some("done"),
                StreamPhase::Cancelled => Some("cancelled"),
                StreamPhase::Failed => Some("failed"),
                StreamPhase::Idle | StreamPhase::Running => None,
            };
            if let Some(ending) = ending {
                let _ = writeln!(out, "\n-- {ending} --");
            }
        }
    }
}

fn render_folders(out: &mut String, view: &AppViewModel) {
    if view.folders.is_empty() {
        let _ = writeln!(out, "no folders; use 'add <path>' or 'pick'");
        return;
    }
    let _ = writeln!(out, "folders:");
    for row in &view.folders {
        let status = if row.deleting {
            "deleting"
        } else if row.archived {
            "archived"
        } else if row.processed {
            "processed"
        } else if view.ingest_in_flight {
            "processing"
        } else {
            "new"
        };
        let _ = writeln!(
            out,
            "  {:<10} {:>5} files  {}  ({})",
            status, row.file_count, row.name, row.path
        );
    }
}

fn render_results(out: &mut String, view: &AppViewModel) {
    let Some(results) = &view.results else {
        return;
    };
    let _ = writeln!(
        out,
        "{} result(s) for \"{}\":",
        results.results.len(),
        view.query
    );
    for (index, result) in results.results.iter().enumerate() {
        let score = result
            .similarity
            .map(|s| format!("{:.0}%", s * 100.0))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:>2}. {} {}  ({})",
            index + 1,
            result.file_name,
            score,
            result.file_path
        );
        if let Some(content) = &result.content {
            let snippet: String = content.chars().take(SNIPPET_CHARS).collect();
            let _ = writeln!(out, "      {}", snippet.replace('\n', " "));
        }
    }
    if let Some(color) = view.tag_color {
        let tag = results.tag.as_deref().unwrap_or("tag");
        let _ = writeln!(out, "tag \"{tag}\" uses {color}");
    }
    if !view.confirmable_actions.is_empty() {
        let keys: Vec<&str> = view.confirmable_actions.iter().map(|k| k.key()).collect();
        let _ = writeln!(out, "pending: {} (use 'confirm')", keys.join(", "));
    }
}

fn render_preview(out: &mut String, view: &AppViewModel) {
    let Some(file) = &view.selected_file else {
        return;
    };
    let _ = writeln!(out, "--- {} ---", file.name);
    match &file.content {
        Some(content) => {
            let _ = writeln!(out, "{content}");
        }
        None => {
            let _ = writeln!(out, "(no text preview for this file)");
        }
    }
}

/// Prints every published view on its own thread.
pub(crate) fn spawn_renderer(
    mut rx: watch::Receiver<AppViewModel>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("docfinder-render".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    df_warn!("renderer runtime failed: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                let mut renderer = Renderer::default();
                while rx.changed().await.is_ok() {
                    let view = rx.borrow_and_update().clone();
                    let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
                    let frame = renderer.render(&view, &stamp);
                    if !frame.is_empty() {
                        print!("{frame}");
                    }
                }
            });
            df_info!("renderer stopped");
        })
}
