use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use docfinder_core::{
    ActionKind, InventoryPurpose, PendingAction, SearchId, SearchQuery, StreamRequest, TaskId,
};
use docfinder_logging::{df_debug, df_info};

use crate::bridge::{probe_folders, CapabilityBridge, LocalFsBridge, PickerCommand};
use crate::client::{ServiceClient, ServiceSettings};
use crate::preview::{load_preview, DEFAULT_MAX_PREVIEW_BYTES};
use crate::stream::{ChannelEventSink, EventSink, StreamingTaskController};
use crate::{EngineError, EngineEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    LoadInventory {
        purpose: InventoryPurpose,
    },
    PickFolders,
    ProbeFolders {
        paths: Vec<String>,
        rejected: Vec<String>,
    },
    Ingest {
        paths: Vec<String>,
    },
    DeleteFolder {
        path: String,
    },
    Search {
        search_id: SearchId,
        query: SearchQuery,
    },
    StartStream {
        task_id: TaskId,
        request: StreamRequest,
    },
    CancelStream {
        task_id: TaskId,
    },
    ExecuteAction {
        search_id: SearchId,
        kind: ActionKind,
        action: PendingAction,
    },
    ReadFile {
        path: String,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub service: ServiceSettings,
    pub max_preview_bytes: usize,
    pub picker: Option<PickerCommand>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            max_preview_bytes: DEFAULT_MAX_PREVIEW_BYTES,
            picker: None,
        }
    }
}

/// Owns the async runtime on a background thread. Commands go in, events
/// come out, both over std channels.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

struct Worker {
    client: ServiceClient,
    bridge: Arc<dyn CapabilityBridge>,
    streams: StreamingTaskController,
    max_preview_bytes: usize,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let bridge = Arc::new(LocalFsBridge::new(settings.picker.clone()));
        Self::with_bridge(settings, bridge)
    }

    pub fn with_bridge(
        settings: EngineSettings,
        bridge: Arc<dyn CapabilityBridge>,
    ) -> Result<Self, EngineError> {
        let client = ServiceClient::new(settings.service)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("docfinder-io")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Arc::new(Worker {
            streams: StreamingTaskController::new(client.clone()),
            client,
            bridge,
            max_preview_bytes: settings.max_preview_bytes,
        });
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::Builder::new()
            .name("docfinder-engine".to_string())
            .spawn(move || {
                let _guard = runtime.enter();
                while let Ok(command) = cmd_rx.recv() {
                    df_debug!("engine command {}", command_name(&command));
                    match command {
                        // Stream control is applied in arrival order.
                        EngineCommand::StartStream { task_id, request } => {
                            worker.streams.start(task_id, request, sink.clone());
                        }
                        EngineCommand::CancelStream { task_id } => {
                            worker.streams.cancel(task_id);
                        }
                        other => {
                            let worker = worker.clone();
                            let sink = sink.clone();
                            runtime.spawn(async move {
                                worker.handle(other, sink.as_ref()).await;
                            });
                        }
                    }
                }
                df_info!("engine command channel closed");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Worker {
    async fn handle(&self, command: EngineCommand, sink: &dyn EventSink) {
        let event = match command {
            EngineCommand::LoadInventory { purpose } => EngineEvent::InventoryLoaded {
                purpose,
                result: self.client.list_folders().await,
            },
            EngineCommand::PickFolders => {
                EngineEvent::FoldersPicked(self.bridge.open_directory().await)
            }
            EngineCommand::ProbeFolders { paths, rejected } => {
                let result = probe_folders(self.bridge.as_ref(), &paths).await;
                EngineEvent::FoldersProbed {
                    paths,
                    rejected,
                    result,
                }
            }
            EngineCommand::Ingest { paths } => {
                EngineEvent::IngestFinished(self.client.ingest(&paths).await)
            }
            EngineCommand::DeleteFolder { path } => {
                let result = self.client.delete_folder(&path).await;
                EngineEvent::FolderDeleted { path, result }
            }
            EngineCommand::Search { search_id, query } => EngineEvent::SearchFinished {
                search_id,
                result: self.client.query(&query).await,
            },
            EngineCommand::ExecuteAction {
                search_id,
                kind,
                action,
            } => EngineEvent::ActionExecuted {
                search_id,
                kind,
                result: self.client.execute_action(&action).await,
            },
            EngineCommand::ReadFile { path, name } => {
                let result =
                    load_preview(self.bridge.as_ref(), &path, self.max_preview_bytes).await;
                EngineEvent::FileLoaded { path, name, result }
            }
            EngineCommand::StartStream { .. } | EngineCommand::CancelStream { .. } => return,
        };
        sink.emit(event);
    }
}

fn command_name(command: &EngineCommand) -> &'static str {
    match command {
        EngineCommand::LoadInventory { .. } => "load_inventory",
        EngineCommand::PickFolders => "pick_folders",
        EngineCommand::ProbeFolders { .. } => "probe_folders",
        EngineCommand::Ingest { .. } => "ingest",
        EngineCommand::DeleteFolder { .. } => "delete_folder",
        EngineCommand::Search { .. } => "search",
        EngineCommand::StartStream { .. } => "start_stream",
        EngineCommand::CancelStream { .. } => "cancel_stream",
        EngineCommand::ExecuteAction { .. } => "execute_action",
        EngineCommand::ReadFile { .. } => "read_file",
    }
}
