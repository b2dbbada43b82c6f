//! Common test utilities.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

use mailprune::{
    ErrorCode, MailboxModel, MailboxStore, MemoryMailboxStore, MessageModel, MetricsServer,
    RetentionMetrics, StorageError, StorageResult,
};

/// Mailbox store wrapper that records calls and fails on demand.
pub struct FakeStore {
    inner: MemoryMailboxStore,
    fail_list_mailboxes: AtomicBool,
    fail_list_messages: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
    deletes: Mutex<Vec<String>>,
    scan_starts: Mutex<Vec<Instant>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryMailboxStore::new(),
            fail_list_mailboxes: AtomicBool::new(false),
            fail_list_messages: Mutex::new(HashSet::new()),
            fail_delete: Mutex::new(HashSet::new()),
            deletes: Mutex::new(Vec::new()),
            scan_starts: Mutex::new(Vec::new()),
        })
    }

    /// Delivers a message aged `days` into `mailbox` and returns its id.
    pub async fn add_aged(&self, mailbox: &str, id: &str, days: i64) -> String {
        let message = MessageModel::new(mailbox)
            .with_id(id)
            .with_date(Utc::now() - ChronoDuration::days(days));
        self.inner.deliver(message).await.unwrap();
        id.to_string()
    }

    pub fn fail_list_mailboxes(&self, fail: bool) {
        self.fail_list_mailboxes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list_messages(&self, mailbox: &str) {
        self.fail_list_messages.lock().insert(mailbox.to_string());
    }

    pub fn fail_delete(&self, id: &str) {
        self.fail_delete.lock().insert(id.to_string());
    }

    /// Ids passed to `delete_message`, in call order.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    /// Times at which a pass listed the mailboxes.
    pub fn scan_starts(&self) -> Vec<Instant> {
        self.scan_starts.lock().clone()
    }

    pub async fn ids(&self, mailbox: &str) -> Vec<String> {
        self.inner
            .list_messages(mailbox)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect()
    }
}

#[async_trait]
impl MailboxStore for FakeStore {
    async fn create_mailbox(&self, name: &str) -> StorageResult<MailboxModel> {
        self.inner.create_mailbox(name).await
    }

    async fn list_mailboxes(&self) -> StorageResult<Vec<MailboxModel>> {
        self.scan_starts.lock().push(Instant::now());
        if self.fail_list_mailboxes.load(Ordering::SeqCst) {
            return Err(StorageError::with_message(
                ErrorCode::StoreUnavailable,
                "mailbox index offline",
            ));
        }
        self.inner.list_mailboxes().await
    }

    async fn list_messages(&self, mailbox: &str) -> StorageResult<Vec<MessageModel>> {
        if self.fail_list_messages.lock().contains(mailbox) {
            return Err(StorageError::with_message(
                ErrorCode::InternalError,
                format!("corrupt index for {}", mailbox),
            ));
        }
        self.inner.list_messages(mailbox).await
    }

    async fn deliver(&self, message: MessageModel) -> StorageResult<()> {
        self.inner.deliver(message).await
    }

    async fn delete_message(&self, mailbox: &str, id: &str) -> StorageResult<()> {
        self.deletes.lock().push(id.to_string());
        if self.fail_delete.lock().contains(id) {
            return Err(StorageError::with_message(
                ErrorCode::StoreUnavailable,
                "disk busy",
            ));
        }
        self.inner.delete_message(mailbox, id).await
    }

    async fn message_count(&self) -> StorageResult<usize> {
        self.inner.message_count().await
    }
}

/// Captures formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Installs an INFO-level subscriber writing into this buffer on the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Metrics server running on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(metrics: Arc<RetentionMetrics>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let shutdown = CancellationToken::new();
        let server = MetricsServer::new(format!("127.0.0.1:{}", port), metrics);
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            server.serve(listener, token).await.unwrap();
        });

        Self {
            base_url,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
