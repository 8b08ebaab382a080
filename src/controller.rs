//! Upload/preview state: what the user picked, what the service sent back,
//! and what the UI should tell the user.

use std::sync::Arc;

use crate::cloud::{self, CloudError, SelectedFile, UploadResponse};
use crate::task::{OutcomeCell, OutcomeQueue};

pub type UploadOutcome = Result<UploadResponse, CloudError>;
pub type FetchOutcome = (String, Result<Vec<u8>, CloudError>);

/// Handle to a displayable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewReference {
    /// A file picked on this machine, shown before any network round trip.
    Local { name: String, bytes: Arc<[u8]> },
    /// An image hosted by the service.
    Remote(String),
}

/// What changed in a call, so the UI repaints only the affected preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    OriginalChanged,
    ProcessedChanged,
    ProcessedLoaded,
    Notified,
}

/// Starts the remote work on behalf of the controller. Implementations
/// deliver at most one result per call into the mailbox they are given.
///
/// Upload responses share a single slot, so the last one to land wins.
/// Fetches each keep their result; the controller picks the one matching
/// the current processed reference.
pub trait Backend {
    fn upload(&self, file: SelectedFile, done: OutcomeCell<UploadOutcome>);
    fn fetch(&self, url: String, done: OutcomeQueue<FetchOutcome>);
}

pub struct UploadController<B> {
    backend: B,
    original: Option<PreviewReference>,
    processed: Option<PreviewReference>,
    processed_bytes: Option<Arc<[u8]>>,
    notification: Option<String>,
    uploads: OutcomeCell<UploadOutcome>,
    fetches: OutcomeQueue<FetchOutcome>,
}

impl<B: Backend> UploadController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            original: None,
            processed: None,
            processed_bytes: None,
            notification: None,
            uploads: OutcomeCell::new(),
            fetches: OutcomeQueue::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// React to the file picker. `None` (nothing chosen) changes nothing.
    ///
    /// The local preview is replaced right away; the upload runs in the
    /// background and is not cancelled by a later selection.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Vec<PreviewEvent> {
        let Some(file) = file else {
            return Vec::new();
        };

        log::info!("Selected {} ({} bytes)", file.name, file.bytes.len());
        self.original = Some(PreviewReference::Local {
            name: file.name.clone(),
            bytes: Arc::from(file.bytes.as_slice()),
        });
        self.backend.upload(file, self.uploads.clone());
        vec![PreviewEvent::OriginalChanged]
    }

    /// Move finished background work into state.
    pub fn poll(&mut self) -> Vec<PreviewEvent> {
        let mut events = Vec::new();
        if let Some(outcome) = self.uploads.take() {
            events.extend(self.apply_upload_result(outcome));
        }
        for (url, outcome) in self.fetches.drain() {
            events.extend(self.apply_processed_fetch(&url, outcome));
        }
        events
    }

    pub fn apply_upload_result(&mut self, outcome: UploadOutcome) -> Vec<PreviewEvent> {
        match outcome {
            Ok(UploadResponse::Uploaded { public_id, format }) => {
                let url = cloud::processed_image_url(&public_id, &format);
                log::info!("Upload stored as {public_id}.{format}");
                self.processed = Some(PreviewReference::Remote(url.clone()));
                self.processed_bytes = None;
                self.backend.fetch(url, self.fetches.clone());
                vec![PreviewEvent::ProcessedChanged]
            }
            Ok(UploadResponse::Rejected { error }) => {
                log::warn!("Upload rejected: {}", error.message);
                self.notification = Some(error.message);
                vec![PreviewEvent::Notified]
            }
            Err(e) => {
                log::error!("Error uploading image: {e}");
                Vec::new()
            }
        }
    }

    /// Store the bytes of a processed image. Results for a URL that has
    /// since been replaced are dropped.
    pub fn apply_processed_fetch(
        &mut self,
        url: &str,
        outcome: Result<Vec<u8>, CloudError>,
    ) -> Vec<PreviewEvent> {
        if self.processed_url() != Some(url) {
            log::debug!("Dropping stale processed image {url}");
            return Vec::new();
        }
        match outcome {
            Ok(bytes) => {
                self.processed_bytes = Some(Arc::from(bytes));
                vec![PreviewEvent::ProcessedLoaded]
            }
            Err(e) => {
                log::error!("Error fetching processed image: {e}");
                Vec::new()
            }
        }
    }

    pub fn original(&self) -> Option<&PreviewReference> {
        self.original.as_ref()
    }

    /// File name of the picked image.
    pub fn original_name(&self) -> Option<&str> {
        match &self.original {
            Some(PreviewReference::Local { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn original_bytes(&self) -> Option<&[u8]> {
        match &self.original {
            Some(PreviewReference::Local { bytes, .. }) => Some(&bytes[..]),
            _ => None,
        }
    }

    pub fn processed(&self) -> Option<&PreviewReference> {
        self.processed.as_ref()
    }

    pub fn processed_url(&self) -> Option<&str> {
        match &self.processed {
            Some(PreviewReference::Remote(url)) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn processed_bytes(&self) -> Option<&[u8]> {
        self.processed_bytes.as_deref()
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::ServiceError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingBackend {
        uploads: RefCell<Vec<(SelectedFile, OutcomeCell<UploadOutcome>)>>,
        fetches: RefCell<Vec<(String, OutcomeQueue<FetchOutcome>)>>,
    }

    impl Backend for RecordingBackend {
        fn upload(&self, file: SelectedFile, done: OutcomeCell<UploadOutcome>) {
            self.uploads.borrow_mut().push((file, done));
        }

        fn fetch(&self, url: String, done: OutcomeQueue<FetchOutcome>) {
            self.fetches.borrow_mut().push((url, done));
        }
    }

    fn file(name: &str) -> SelectedFile {
        SelectedFile {
            name: name.to_owned(),
            bytes: name.as_bytes().to_vec(),
        }
    }

    fn uploaded(public_id: &str, format: &str) -> UploadOutcome {
        Ok(UploadResponse::Uploaded {
            public_id: public_id.to_owned(),
            format: format.to_owned(),
        })
    }

    fn controller() -> UploadController<RecordingBackend> {
        UploadController::new(RecordingBackend::default())
    }

    #[test]
    fn no_file_changes_nothing() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        ctl.apply_upload_result(uploaded("abc", "png"));
        let original = ctl.original().cloned();
        let processed = ctl.processed().cloned();

        assert!(ctl.select_file(None).is_empty());
        assert_eq!(ctl.original(), original.as_ref());
        assert_eq!(ctl.processed(), processed.as_ref());
        assert!(ctl.notification().is_none());
        assert_eq!(ctl.backend().uploads.borrow().len(), 1);
    }

    #[test]
    fn selecting_shows_original_and_starts_upload() {
        let mut ctl = controller();
        let events = ctl.select_file(Some(file("cat.png")));

        assert_eq!(events, vec![PreviewEvent::OriginalChanged]);
        assert_eq!(ctl.original_bytes(), Some(&b"cat.png"[..]));
        assert!(ctl.processed().is_none());

        let uploads = ctl.backend().uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0.name, "cat.png");
    }

    #[test]
    fn success_response_sets_processed_reference() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        let events = ctl.apply_upload_result(uploaded("abc", "png"));

        assert_eq!(events, vec![PreviewEvent::ProcessedChanged]);
        let expected =
            "https://res.cloudinary.com/daadydi5p/image/upload/e_bgremoval,c_scale/abc.png";
        assert_eq!(ctl.processed_url(), Some(expected));
        assert_eq!(ctl.backend().fetches.borrow()[0].0, expected);
    }

    #[test]
    fn error_response_notifies_with_exact_message() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        let events = ctl.apply_upload_result(Ok(UploadResponse::Rejected {
            error: ServiceError {
                message: "Upload preset must be whitelisted for unsigned uploads".into(),
            },
        }));

        assert_eq!(events, vec![PreviewEvent::Notified]);
        assert!(ctl.processed().is_none());
        assert!(ctl.original().is_some());
        assert_eq!(
            ctl.take_notification().as_deref(),
            Some("Upload preset must be whitelisted for unsigned uploads")
        );
        assert!(ctl.notification().is_none());
    }

    #[test]
    fn transport_failure_is_silent() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        let events = ctl.apply_upload_result(Err(CloudError::Network("connection reset".into())));

        assert!(events.is_empty());
        assert!(ctl.processed().is_none());
        assert!(ctl.notification().is_none());
        assert!(ctl.original().is_some());
    }

    #[test]
    fn poll_delivers_backend_results() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        assert!(ctl.poll().is_empty());

        let done = ctl.backend().uploads.borrow()[0].1.clone();
        done.put(uploaded("abc", "png"));
        assert_eq!(ctl.poll(), vec![PreviewEvent::ProcessedChanged]);

        let (url, done) = ctl.backend().fetches.borrow()[0].clone();
        done.push((url, Ok(vec![1, 2, 3])));
        assert_eq!(ctl.poll(), vec![PreviewEvent::ProcessedLoaded]);
        assert_eq!(ctl.processed_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn last_arriving_response_wins() {
        let mut ctl = controller();
        ctl.select_file(Some(file("first.png")));
        ctl.select_file(Some(file("second.png")));
        assert_eq!(ctl.original_bytes(), Some(&b"second.png"[..]));

        // Second upload answers first, the first one straggles in after.
        let uploads: Vec<_> = ctl
            .backend()
            .uploads
            .borrow()
            .iter()
            .map(|(_, cell)| cell.clone())
            .collect();
        uploads[1].put(uploaded("second", "png"));
        ctl.poll();
        uploads[0].put(uploaded("first", "png"));
        ctl.poll();

        assert_eq!(
            ctl.processed_url(),
            Some(cloud::processed_image_url("first", "png").as_str())
        );
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let mut ctl = controller();
        ctl.select_file(Some(file("cat.png")));
        ctl.apply_upload_result(uploaded("old", "png"));
        let old_url = cloud::processed_image_url("old", "png");
        ctl.apply_upload_result(uploaded("new", "png"));

        assert!(ctl.apply_processed_fetch(&old_url, Ok(vec![9])).is_empty());
        assert!(ctl.processed_bytes().is_none());
    }

    #[test]
    fn current_fetch_survives_a_stale_one_landing_after_it() {
        let mut ctl = controller();
        ctl.apply_upload_result(uploaded("a", "png"));
        ctl.apply_upload_result(uploaded("b", "png"));

        let fetches = ctl.backend().fetches.borrow().clone();
        let (url_a, mailbox_a) = &fetches[0];
        let (url_b, mailbox_b) = &fetches[1];
        mailbox_b.push((url_b.clone(), Ok(vec![2])));
        mailbox_a.push((url_a.clone(), Ok(vec![1])));

        assert_eq!(ctl.poll(), vec![PreviewEvent::ProcessedLoaded]);
        assert_eq!(ctl.processed_url(), Some(url_b.as_str()));
        assert_eq!(ctl.processed_bytes(), Some(&[2u8][..]));
        assert!(ctl.poll().is_empty());
    }

    #[test]
    fn original_name_follows_the_latest_pick() {
        let mut ctl = controller();
        assert!(ctl.original_name().is_none());
        ctl.select_file(Some(file("cat.png")));
        ctl.select_file(Some(file("dog.jpg")));
        assert_eq!(ctl.original_name(), Some("dog.jpg"));
    }

    #[test]
    fn new_processed_reference_clears_old_bytes() {
        let mut ctl = controller();
        ctl.apply_upload_result(uploaded("one", "png"));
        let url = cloud::processed_image_url("one", "png");
        ctl.apply_processed_fetch(&url, Ok(vec![1]));
        assert!(ctl.processed_bytes().is_some());

        ctl.apply_upload_result(uploaded("two", "png"));
        assert!(ctl.processed_bytes().is_none());
    }

    #[test]
    fn failed_fetch_keeps_reference_without_bytes() {
        let mut ctl = controller();
        ctl.apply_upload_result(uploaded("abc", "webp"));
        let url = cloud::processed_image_url("abc", "webp");
        let events =
            ctl.apply_processed_fetch(&url, Err(CloudError::Network("HTTP status: 404".into())));

        assert!(events.is_empty());
        assert_eq!(ctl.processed_url(), Some(url.as_str()));
        assert!(ctl.processed_bytes().is_none());
    }
}
