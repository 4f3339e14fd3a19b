use serde::Deserialize;

pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Structured fields carried by a `{"metadata": {...}}` event. The agent
/// endpoint sends `topic`/`documentsFound`, the summarize endpoint sends
/// `fileName`/`fileType`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub documents_found: Option<u64>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// One decoded `data:` line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Metadata(TaskMetadata),
    Content(String),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Agent {
        prompt: String,
        match_count: u32,
    },
    Summarize {
        file_name: String,
        file_path: String,
        content: Option<String>,
    },
}

/// How a task's transport ended, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// End of data reached, with or without a `done` event.
    Completed,
    Cancelled,
    Failed(String),
    /// The agent endpoint answered with plain JSON `not_agent_task`.
    NotAgentTask,
}

/// The single live streaming task of a session.
///
/// Every task gets a fresh id; events and outcomes tagged with any other id
/// are ignored, so a superseded task can never write into its successor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamTask {
    last_id: TaskId,
    active: Option<TaskId>,
    phase: StreamPhase,
    output: String,
    metadata: Option<TaskMetadata>,
    request: Option<StreamRequest>,
    panel_open: bool,
}

impl StreamTask {
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn metadata(&self) -> Option<&TaskMetadata> {
        self.metadata.as_ref()
    }

    pub fn request(&self) -> Option<&StreamRequest> {
        self.request.as_ref()
    }

    pub fn active_id(&self) -> Option<TaskId> {
        self.active
    }

    pub fn is_running(&self) -> bool {
        self.phase == StreamPhase::Running
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Id of the running task, if any.
    pub fn running_id(&self) -> Option<TaskId> {
        if self.is_running() {
            self.active
        } else {
            None
        }
    }

    /// Starts a new task. Returns the new id and the id of the task that was
    /// running before, which the caller must cancel first.
    pub(crate) fn begin(&mut self, request: StreamRequest) -> (TaskId, Option<TaskId>) {
        let superseded = self.running_id();
        self.last_id += 1;
        self.active = Some(self.last_id);
        self.phase = StreamPhase::Running;
        self.output.clear();
        self.metadata = None;
        self.request = Some(request);
        self.panel_open = true;
        (self.last_id, superseded)
    }

    /// Applies an event if it belongs to the running task.
    pub(crate) fn apply_event(&mut self, task_id: TaskId, event: StreamEvent) -> bool {
        if self.running_id() != Some(task_id) {
            return false;
        }
        match event {
            StreamEvent::Metadata(metadata) => {
                self.metadata = Some(self.with_default_topic(metadata));
                true
            }
            StreamEvent::Content(chunk) => {
                self.output.push_str(&chunk);
                true
            }
            // The transport outcome ends the task; stray content after
            // `done` is still appended.
            StreamEvent::Done => false,
        }
    }

    /// Applies the transport outcome of the running task. Returns the
    /// outcome when it was applied.
    pub(crate) fn finish(&mut self, task_id: TaskId, outcome: StreamOutcome) -> Option<StreamOutcome> {
        if self.running_id() != Some(task_id) {
            return None;
        }
        match &outcome {
            StreamOutcome::Completed => self.phase = StreamPhase::Completed,
            StreamOutcome::Cancelled => self.phase = StreamPhase::Cancelled,
            // Partial output is kept.
            StreamOutcome::Failed(_) => self.phase = StreamPhase::Failed,
            StreamOutcome::NotAgentTask => self.reset(),
        }
        Some(outcome)
    }

    /// User cancellation. Returns the id to abort.
    pub(crate) fn cancel(&mut self) -> Option<TaskId> {
        let running = self.running_id()?;
        self.phase = StreamPhase::Cancelled;
        Some(running)
    }

    /// Closes the output panel, returning to `Idle`. Returns the id of a
    /// task that was still running and must be aborted.
    pub(crate) fn close(&mut self) -> Option<TaskId> {
        let running = self.running_id();
        self.reset();
        running
    }

    fn reset(&mut self) {
        self.active = None;
        self.phase = StreamPhase::Idle;
        self.output.clear();
        self.metadata = None;
        self.request = None;
        self.panel_open = false;
    }

    fn with_default_topic(&self, mut metadata: TaskMetadata) -> TaskMetadata {
        if metadata.topic.is_none() {
            if let Some(StreamRequest::Summarize { file_name, .. }) = &self.request {
                let shown = metadata.file_name.as_deref().unwrap_or(file_name);
                metadata.topic = Some(format!("Summary of {shown}"));
            }
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(prompt: &str) -> StreamRequest {
        StreamRequest::Agent {
            prompt: prompt.to_string(),
            match_count: 10,
        }
    }

    #[test]
    fn begin_reports_superseded_running_task() {
        let mut task = StreamTask::default();
        let (first, superseded) = task.begin(agent("summarize a"));
        assert_eq!(superseded, None);

        let (second, superseded) = task.begin(agent("summarize b"));
        assert_eq!(superseded, Some(first));
        assert_ne!(first, second);
        assert_eq!(task.phase(), StreamPhase::Running);
    }

    #[test]
    fn content_after_done_is_still_appended() {
        let mut task = StreamTask::default();
        let (id, _) = task.begin(agent("summarize"));
        assert!(task.apply_event(id, StreamEvent::Content("ab".into())));
        assert!(!task.apply_event(id, StreamEvent::Done));
        assert!(task.apply_event(id, StreamEvent::Content("zz".into())));
        assert_eq!(task.output(), "abzz");
        assert_eq!(task.phase(), StreamPhase::Running);
    }

    #[test]
    fn summarize_metadata_gets_topic_from_file_name() {
        let mut task = StreamTask::default();
        let (id, _) = task.begin(StreamRequest::Summarize {
            file_name: "notes.txt".into(),
            file_path: "/docs/notes.txt".into(),
            content: None,
        });
        task.apply_event(
            id,
            StreamEvent::Metadata(TaskMetadata {
                file_name: Some("notes.txt".into()),
                file_type: Some("text file".into()),
                ..TaskMetadata::default()
            }),
        );
        let metadata = task.metadata().unwrap();
        assert_eq!(metadata.topic.as_deref(), Some("Summary of notes.txt"));
        assert_eq!(metadata.file_type.as_deref(), Some("text file"));
    }

    #[test]
    fn failure_keeps_partial_output() {
        let mut task = StreamTask::default();
        let (id, _) = task.begin(agent("summarize"));
        task.apply_event(id, StreamEvent::Content("partial".into()));
        let outcome = task.finish(id, StreamOutcome::Failed("reset by peer".into()));
        assert!(outcome.is_some());
        assert_eq!(task.phase(), StreamPhase::Failed);
        assert_eq!(task.output(), "partial");
    }
}
