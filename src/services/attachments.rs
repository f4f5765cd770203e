//! Attachment widget: the files picked for one comment or ticket form.
//!
//! ```text
//! Empty -> Selecting -> Validated | Rejected -> Uploading -> Done
//! ```
//!
//! Files are validated when picked. Oversize files stay in the list with an
//! error so the user sees why they will not be sent, and they are skipped by
//! [`AttachmentWidget::send_files`]. Uploads run one at a time.

use crate::error::AppError;
use crate::models::{Attachment, FileInfo, SelectedFile, UploadEvent};
use crate::services::localization::Localizer;
use crate::services::store::Tracker;
use crate::services::ticket_service::TicketService;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Empty,
    Selecting,
    /// Every listed file can be uploaded.
    Validated,
    /// At least one listed file failed validation.
    Rejected,
    Uploading,
    Done,
}

struct Entry {
    file: SelectedFile,
    info: FileInfo,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    removals: Vec<Attachment>,
    has_error: bool,
}

pub struct AttachmentWidget {
    max_file_size: u64,
    strings: Arc<Localizer>,
    inner: Mutex<Inner>,
    files: watch::Sender<Vec<FileInfo>>,
    state: watch::Sender<WidgetState>,
}

impl AttachmentWidget {
    pub fn new(max_file_size: u64, strings: Arc<Localizer>) -> Self {
        Self {
            max_file_size,
            strings,
            inner: Mutex::new(Inner::default()),
            files: watch::channel(Vec::new()).0,
            state: watch::channel(WidgetState::Empty).0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.files
            .send_replace(inner.entries.iter().map(|e| e.info.clone()).collect());
    }

    fn settle_state(&self, inner: &Inner) {
        let state = if inner.entries.is_empty() {
            WidgetState::Empty
        } else if inner.has_error {
            WidgetState::Rejected
        } else {
            WidgetState::Validated
        };
        self.state.send_replace(state);
    }

    /// Add picked files. A name already in the list is skipped without
    /// touching the list. Returns how many files were added.
    pub fn select_files(&self, files: Vec<SelectedFile>) -> usize {
        self.state.send_replace(WidgetState::Selecting);
        let mut inner = self.lock();
        let mut added = 0;

        for file in files {
            if inner.entries.iter().any(|e| e.info.filename == file.name) {
                log::debug!("[upload] skipping duplicate {}", file.name);
                continue;
            }

            let error = (file.size() > self.max_file_size)
                .then(|| self.strings.get("attachments.too-large"));
            if error.is_some() {
                inner.has_error = true;
            }

            inner.entries.push(Entry {
                info: FileInfo {
                    filename: file.name.clone(),
                    size: file.size(),
                    error,
                    ..Default::default()
                },
                file,
            });
            added += 1;
        }

        if added > 0 {
            self.publish(&inner);
        }
        self.settle_state(&inner);
        added
    }

    /// Remove the file at `index`. The aggregate error is cleared only when
    /// no remaining file has one.
    pub fn remove_file(&self, index: usize) {
        let mut inner = self.lock();
        if index >= inner.entries.len() {
            return;
        }
        inner.entries.remove(index);
        inner.has_error = inner.entries.iter().any(|e| e.info.error.is_some());
        self.publish(&inner);
        self.settle_state(&inner);
    }

    /// Schedule an attachment already on the server for deletion.
    pub fn mark_for_removal(&self, attachment: Attachment) {
        let mut inner = self.lock();
        if !inner.removals.contains(&attachment) {
            inner.removals.push(attachment);
        }
    }

    pub fn pending_removals(&self) -> Vec<Attachment> {
        self.lock().removals.clone()
    }

    /// Delete the attachments marked for removal. Deleted ones leave the
    /// queue; failed ones stay so a retry only repeats what is left.
    pub async fn remove_sent_files(
        &self,
        tickets: &TicketService,
        ticket_id: i64,
    ) -> Result<(), AppError> {
        let pending = self.pending_removals();
        let mut failed = false;

        for attachment in pending {
            match tickets
                .remove_attachment(ticket_id, attachment.comment_id, &attachment.file_id)
                .await
            {
                Ok(response) if response.success => {
                    self.lock().removals.retain(|a| *a != attachment);
                }
                Ok(_) | Err(_) => failed = true,
            }
        }

        if failed {
            Err(AppError::attachment(
                self.strings.get("attachments.not-all-removed"),
            ))
        } else {
            Ok(())
        }
    }

    /// Upload every valid file not sent yet, one request at a time, to the
    /// given comment. A failed file is flagged and the rest still go out.
    pub async fn send_files(
        &self,
        tickets: &TicketService,
        ticket_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        self.state.send_replace(WidgetState::Uploading);
        let pending: Vec<(usize, SelectedFile)> = self
            .lock()
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.info.error.is_none() && !e.info.done)
            .map(|(i, e)| (i, e.file.clone()))
            .collect();

        let mut failed = false;
        for (index, file) in pending {
            self.update(index, |info| {
                info.progress = Some(0);
                info.upload_error = None;
            });

            let (tx, mut rx) = mpsc::unbounded_channel();
            let upload = tickets.upload_file(ticket_id, comment_id, &file, &tx);
            tokio::pin!(upload);

            let result = loop {
                tokio::select! {
                    result = &mut upload => break result,
                    Some(event) = rx.recv() => self.on_event(index, event),
                }
            };
            while let Ok(event) = rx.try_recv() {
                self.on_event(index, event);
            }

            match result {
                Ok(response) if response.success => self.update(index, |info| {
                    info.done = true;
                    info.progress = Some(100);
                }),
                Ok(_) => {
                    failed = true;
                    let message = self.strings.get("attachments.not-all-sent");
                    self.update(index, |info| info.upload_error = Some(message));
                }
                Err(e) => {
                    failed = true;
                    log::warn!("[upload] {} failed: {}", file.name, e);
                    let message = self.strings.get("attachments.upload-failed");
                    self.update(index, |info| info.upload_error = Some(message));
                }
            }
        }

        if failed {
            let inner = self.lock();
            self.settle_state(&inner);
            return Err(AppError::attachment(
                self.strings.get("attachments.not-all-sent"),
            ));
        }

        self.state.send_replace(WidgetState::Done);
        Ok(())
    }

    fn on_event(&self, index: usize, event: UploadEvent) {
        if let UploadEvent::Progress(percent) = event {
            self.update(index, |info| info.progress = Some(percent));
        }
    }

    fn update(&self, index: usize, change: impl FnOnce(&mut FileInfo)) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(index) {
            change(&mut entry.info);
            self.publish(&inner);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = Inner::default();
        self.publish(&inner);
        self.settle_state(&inner);
    }

    pub fn files(&self) -> Vec<FileInfo> {
        self.files.borrow().clone()
    }

    /// Whether some listed file failed validation.
    pub fn has_error(&self) -> bool {
        self.lock().has_error
    }

    /// Number of files that will be uploaded by the next `send_files`.
    pub fn upload_count(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.info.error.is_none() && !e.info.done)
            .count()
    }

    pub fn state(&self) -> WidgetState {
        *self.state.borrow()
    }

    pub fn track_files(&self) -> Tracker<Vec<FileInfo>> {
        Tracker::new(self.files.subscribe())
    }

    pub fn track_state(&self) -> Tracker<WidgetState> {
        Tracker::new(self.state.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::{ApiClient, ApiClientConfig};
    use crate::services::error_handler::ErrorHandler;
    use crate::services::localization::Language;
    use crate::services::store::Store;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIMIT: u64 = 1024;

    fn widget() -> AttachmentWidget {
        AttachmentWidget::new(LIMIT, Arc::new(Localizer::new(Language::English)))
    }

    fn tickets(server: &MockServer) -> TicketService {
        let api = ApiClient::new(ApiClientConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap();
        let errors = Arc::new(ErrorHandler::new(
            Arc::new(Store::new()),
            Arc::new(Localizer::new(Language::English)),
        ));
        TicketService::new(Arc::new(api), errors)
    }

    fn success() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true}))
    }

    fn sent(name: &str) -> Attachment {
        Attachment {
            comment_id: 7,
            file_id: name.to_string(),
            filename: format!("{}.txt", name),
            size: 1,
        }
    }

    fn file(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, vec![0u8; size])
    }

    #[test]
    fn test_duplicate_name_rejected_without_update() {
        let widget = widget();
        let mut files = widget.track_files();
        files.try_next();

        assert_eq!(widget.select_files(vec![file("a.txt", 10)]), 1);
        assert!(files.try_next().is_some());

        assert_eq!(widget.select_files(vec![file("a.txt", 20)]), 0);
        assert!(files.try_next().is_none());
        assert_eq!(widget.files().len(), 1);
        assert_eq!(widget.files()[0].size, 10);
    }

    #[test]
    fn test_oversize_file_listed_with_error() {
        let widget = widget();
        widget.select_files(vec![file("big.bin", LIMIT as usize + 1), file("ok.txt", 5)]);

        let files = widget.files();
        assert_eq!(files[0].error.as_deref(), Some("The file is too large."));
        assert!(files[1].error.is_none());
        assert!(widget.has_error());
        assert_eq!(widget.upload_count(), 1);
        assert_eq!(widget.state(), WidgetState::Rejected);
    }

    #[test]
    fn test_remove_keeps_error_while_another_file_has_one() {
        let widget = widget();
        widget.select_files(vec![
            file("big1.bin", LIMIT as usize + 1),
            file("big2.bin", LIMIT as usize + 1),
            file("ok.txt", 1),
        ]);

        widget.remove_file(0);
        assert!(widget.has_error());

        widget.remove_file(0);
        assert!(!widget.has_error());
        assert_eq!(widget.state(), WidgetState::Validated);

        widget.remove_file(7);
        assert_eq!(widget.files().len(), 1);
    }

    #[test]
    fn test_mark_for_removal_deduplicates() {
        let widget = widget();
        let attachment = Attachment {
            comment_id: 3,
            file_id: "f1".to_string(),
            filename: "a.txt".to_string(),
            size: 1,
        };
        widget.mark_for_removal(attachment.clone());
        widget.mark_for_removal(attachment);
        assert_eq!(widget.pending_removals().len(), 1);
    }

    #[test]
    fn test_clear() {
        let widget = widget();
        widget.select_files(vec![file("big.bin", LIMIT as usize + 1)]);
        widget.clear();
        assert!(widget.files().is_empty());
        assert!(!widget.has_error());
        assert_eq!(widget.state(), WidgetState::Empty);
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_the_others() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tiketti/3/kommentti/7/liite"))
            .and(body_string_contains("bad.txt"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tiketti/3/kommentti/7/liite"))
            .and(body_string_contains("good.txt"))
            .respond_with(success())
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        // Second attempt of bad.txt.
        Mock::given(method("POST"))
            .and(path("/tiketti/3/kommentti/7/liite"))
            .respond_with(success())
            .expect(1)
            .mount(&server)
            .await;

        let tickets = tickets(&server);
        let widget = widget();
        widget.select_files(vec![
            SelectedFile::new("bad.txt", b"first".to_vec()),
            SelectedFile::new("good.txt", b"second".to_vec()),
        ]);

        let err = widget.send_files(&tickets, 3, 7).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Attachment { ref message, .. } if message == "Not all attachments could be sent."
        ));
        let files = widget.files();
        assert_eq!(files[0].upload_error.as_deref(), Some("Sending the file failed."));
        assert!(!files[0].done);
        assert!(files[1].done);
        assert!(files[1].upload_error.is_none());
        assert_eq!(widget.upload_count(), 1);
        assert_eq!(widget.state(), WidgetState::Validated);

        widget.send_files(&tickets, 3, 7).await.unwrap();
        let files = widget.files();
        assert!(files.iter().all(|f| f.done && f.upload_error.is_none()));
        assert_eq!(widget.upload_count(), 0);
        assert_eq!(widget.state(), WidgetState::Done);
    }

    #[tokio::test]
    async fn test_oversize_file_is_never_uploaded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tiketti/3/kommentti/7/liite"))
            .respond_with(success())
            .expect(1)
            .mount(&server)
            .await;

        let widget = widget();
        widget.select_files(vec![
            file("big.bin", LIMIT as usize + 1),
            SelectedFile::new("ok.txt", b"fine".to_vec()),
        ]);

        widget.send_files(&tickets(&server), 3, 7).await.unwrap();
        let files = widget.files();
        assert!(!files[0].done);
        assert!(files[1].done);
        assert_eq!(files[1].progress, Some(100));
    }

    #[tokio::test]
    async fn test_failed_removal_stays_queued() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tiketti/3/kommentti/7/liite/f1"))
            .respond_with(success())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/tiketti/3/kommentti/7/liite/f2"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/tiketti/3/kommentti/7/liite/f2"))
            .respond_with(success())
            .mount(&server)
            .await;

        let tickets = tickets(&server);
        let widget = widget();
        widget.mark_for_removal(sent("f1"));
        widget.mark_for_removal(sent("f2"));

        let err = widget.remove_sent_files(&tickets, 3).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Attachment { ref message, .. } if message == "Not all selected attachments could be removed."
        ));
        assert_eq!(widget.pending_removals(), vec![sent("f2")]);

        widget.remove_sent_files(&tickets, 3).await.unwrap();
        assert!(widget.pending_removals().is_empty());
    }
}
