use std::sync::{mpsc, Arc, Mutex};

use docfinder_core::{StreamOutcome, StreamRequest, TaskId};
use docfinder_logging::{df_debug, df_info, df_warn};
use futures_util::StreamExt;
use reqwest::Response;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{map_reqwest_error, AgentReply, ServiceClient};
use crate::sse::EventStreamDecoder;
use crate::EngineEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct ActiveTask {
    task_id: TaskId,
    token: CancellationToken,
}

/// Runs at most one streaming task at a time.
///
/// Each task owns a fresh cancellation token. Events are only emitted while
/// that token is live, so once a task is cancelled or superseded nothing it
/// reads afterwards reaches the sink.
pub struct StreamingTaskController {
    client: ServiceClient,
    active: Arc<Mutex<Option<ActiveTask>>>,
}

impl StreamingTaskController {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts `request` as task `task_id`, cancelling whatever was running.
    /// Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        task_id: TaskId,
        request: StreamRequest,
        sink: Arc<dyn EventSink>,
    ) -> JoinHandle<()> {
        let token = CancellationToken::new();
        {
            let mut active = lock(&self.active);
            if let Some(previous) = active.take() {
                df_info!("stream {} superseded by {}", previous.task_id, task_id);
                previous.token.cancel();
            }
            *active = Some(ActiveTask {
                task_id,
                token: token.clone(),
            });
        }

        df_info!("stream {task_id} starting");
        let client = self.client.clone();
        let active = self.active.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => StreamOutcome::Cancelled,
                outcome = drive(&client, task_id, &request, &token, sink.as_ref()) => outcome,
            };
            // A late failure of a cancelled task is still a cancellation.
            let outcome = if token.is_cancelled() {
                StreamOutcome::Cancelled
            } else {
                outcome
            };
            match &outcome {
                StreamOutcome::Failed(message) => df_warn!("stream {task_id} failed: {message}"),
                other => df_info!("stream {task_id} finished: {other:?}"),
            }
            {
                let mut active = lock(&active);
                if active.as_ref().is_some_and(|task| task.task_id == task_id) {
                    *active = None;
                }
            }
            sink.emit(EngineEvent::StreamFinished { task_id, outcome });
        })
    }

    /// Cancels `task_id` if it is still the active task.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let mut active = lock(&self.active);
        match active.as_ref() {
            Some(task) if task.task_id == task_id => {
                df_info!("stream {task_id} cancelled");
                task.token.cancel();
                *active = None;
                true
            }
            _ => {
                df_debug!("cancel for inactive stream {task_id} ignored");
                false
            }
        }
    }

    pub fn active_task(&self) -> Option<TaskId> {
        lock(&self.active).as_ref().map(|task| task.task_id)
    }
}

fn lock(active: &Mutex<Option<ActiveTask>>) -> std::sync::MutexGuard<'_, Option<ActiveTask>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn drive(
    client: &ServiceClient,
    task_id: TaskId,
    request: &StreamRequest,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> StreamOutcome {
    let response = match request {
        StreamRequest::Agent {
            prompt,
            match_count,
        } => match client.start_agent(prompt, *match_count).await {
            Ok(AgentReply::Stream(response)) => response,
            Ok(AgentReply::NotAgentTask) => return StreamOutcome::NotAgentTask,
            Err(err) => return StreamOutcome::Failed(err.to_string()),
        },
        StreamRequest::Summarize {
            file_name,
            file_path,
            content,
        } => match client
            .summarize_file(file_name, file_path, content.as_deref())
            .await
        {
            Ok(response) => response,
            Err(err) => return StreamOutcome::Failed(err.to_string()),
        },
    };
    pump(response, task_id, token, sink).await
}

async fn pump(
    response: Response,
    task_id: TaskId,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> StreamOutcome {
    let mut decoder = EventStreamDecoder::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => return StreamOutcome::Failed(map_reqwest_error(err).to_string()),
        };
        for event in decoder.feed(&chunk) {
            if token.is_cancelled() {
                return StreamOutcome::Cancelled;
            }
            sink.emit(EngineEvent::Stream { task_id, event });
        }
    }
    if let Some(event) = decoder.finish() {
        if token.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        sink.emit(EngineEvent::Stream { task_id, event });
    }
    StreamOutcome::Completed
}
