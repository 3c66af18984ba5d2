//! Batch runner
//!
//! Drives one template over every record, in source order: render, write the
//! artifact, then optionally email it. Each record yields a [`MergeResult`];
//! the run as a whole yields a [`BatchReport`].
//!
//! Failures are contained per record. The one exception is an authentication
//! failure from the transport, which would repeat for every remaining record,
//! so the run stops there and the report is marked aborted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mailmerge::batch::{DeliveryPlan, MergeBatch};
//! use mailmerge::email::{SmtpBackend, SmtpConfig};
//! use mailmerge::engine::MergeEngine;
//! use mailmerge::source::RecordSource;
//! use mailmerge::template::{Template, TextTemplate};
//!
//! # async fn example() -> mailmerge::error::Result<()> {
//! let records = RecordSource::load("data.json")?;
//! let template = Template::load("template.docx")?;
//! let sender = SmtpBackend::new(SmtpConfig::gmail("me@gmail.com", "app-password"));
//!
//! let plan = DeliveryPlan::new(
//!     "me@gmail.com",
//!     TextTemplate::new("Your letter, {{name}}"),
//!     TextTemplate::open("template.html")?,
//! );
//!
//! let report = MergeBatch::new(MergeEngine::new("output"), template)
//!     .deliver(plan, &sender)
//!     .run(&records)
//!     .await;
//!
//! println!("Total emails sent: {}", report.sent);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::email::{Attachment, Email, EmailError, EmailSender};
use crate::engine::{derive_name, resolve_recipient, MergeEngine, RecipientPolicy};
use crate::error::MergeError;
use crate::record::Record;
use crate::template::{Template, TextTemplate};

/// How the personalized body is sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyKind {
    /// `text/html`
    #[default]
    Html,
    /// `text/plain`
    Plain,
}

/// What, if anything, is attached to each email
#[derive(Debug, Clone, Default)]
pub enum AttachmentSource {
    /// No attachment
    None,
    /// The artifact written for the record, read back from disk
    #[default]
    Artifact,
    /// A file path personalized per record; a path without tokens is fixed
    Path(TextTemplate),
}

/// How each record is turned into an email
#[derive(Debug, Clone)]
pub struct DeliveryPlan {
    from: String,
    subject: TextTemplate,
    body: TextTemplate,
    body_kind: BodyKind,
    attachment: AttachmentSource,
    recipients: RecipientPolicy,
}

impl DeliveryPlan {
    /// HTML emails carrying the record's artifact, addressed via `email`/`Email`
    #[must_use]
    pub fn new<S: Into<String>>(from: S, subject: TextTemplate, body: TextTemplate) -> Self {
        Self {
            from: from.into(),
            subject,
            body,
            body_kind: BodyKind::default(),
            attachment: AttachmentSource::default(),
            recipients: RecipientPolicy::default(),
        }
    }

    /// Set the body kind
    #[must_use]
    pub const fn body_kind(mut self, kind: BodyKind) -> Self {
        self.body_kind = kind;
        self
    }

    /// Set the attachment source
    #[must_use]
    pub fn attachment(mut self, attachment: AttachmentSource) -> Self {
        self.attachment = attachment;
        self
    }

    /// Set the recipient policy
    #[must_use]
    pub const fn recipients(mut self, policy: RecipientPolicy) -> Self {
        self.recipients = policy;
        self
    }

    fn compose(&self, record: &Record, recipient: &str) -> Email {
        let subject = self.subject.substitute(record);
        let body = self.body.substitute(record);

        let email = Email::new().to(recipient).from(&self.from).subject(&subject);
        match self.body_kind {
            BodyKind::Html => email.html(&body),
            BodyKind::Plain => email.text(&body),
        }
    }
}

/// Outcome of one record
#[derive(Debug)]
pub enum MergeStatus {
    /// Artifact produced and, when delivering, email sent
    Success,
    /// Artifact produced but the record has no recipient address
    SkippedNoRecipient,
    /// The record failed at the stage named by the error
    Failed(MergeError),
}

/// Result of processing one record
#[derive(Debug)]
pub struct MergeResult {
    /// Position of the record in the source
    pub index: usize,
    /// Derived output identifier
    pub name: String,
    /// Path of the written artifact, if one was written
    pub path: Option<PathBuf>,
    /// Resolved recipient, if any
    pub recipient: Option<String>,
    /// Outcome
    pub status: MergeStatus,
}

impl MergeResult {
    fn new(record: &Record) -> Self {
        Self {
            index: record.index(),
            name: derive_name(record),
            path: None,
            recipient: None,
            status: MergeStatus::Success,
        }
    }

    fn failed(mut self, err: MergeError) -> Self {
        if err.is_fatal_to_batch() {
            error!(index = self.index, name = %self.name, error = %err, "Delivery aborted");
        } else {
            warn!(index = self.index, name = %self.name, error = %err, "Record failed");
        }
        self.status = MergeStatus::Failed(err);
        self
    }

    /// Whether the record completed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, MergeStatus::Success)
    }

    /// The error, if the record failed
    #[must_use]
    pub const fn error(&self) -> Option<&MergeError> {
        match &self.status {
            MergeStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Summary of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One result per processed record, in source order
    pub results: Vec<MergeResult>,
    /// Emails accepted by the transport
    pub sent: usize,
    /// Whether an authentication failure stopped the run early
    pub aborted: bool,
}

impl BatchReport {
    /// Records that completed
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Records skipped for lack of a recipient
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, MergeStatus::SkippedNoRecipient))
            .count()
    }

    /// Records that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }

    fn push(&mut self, result: MergeResult) {
        if result.error().is_some_and(MergeError::is_fatal_to_batch) {
            self.aborted = true;
        }
        self.results.push(result);
    }
}

struct Delivery<'a> {
    plan: DeliveryPlan,
    sender: &'a dyn EmailSender,
}

/// One template applied to a list of records
pub struct MergeBatch<'a> {
    engine: MergeEngine,
    template: Template,
    delivery: Option<Delivery<'a>>,
}

impl std::fmt::Debug for MergeBatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeBatch")
            .field("engine", &self.engine)
            .field("template", &self.template)
            .field("delivery", &self.delivery.as_ref().map(|d| &d.plan))
            .finish()
    }
}

impl<'a> MergeBatch<'a> {
    /// Produce artifacts only
    #[must_use]
    pub const fn new(engine: MergeEngine, template: Template) -> Self {
        Self {
            engine,
            template,
            delivery: None,
        }
    }

    /// Email each artifact according to `plan`
    #[must_use]
    pub fn deliver(mut self, plan: DeliveryPlan, sender: &'a dyn EmailSender) -> Self {
        self.delivery = Some(Delivery { plan, sender });
        self
    }

    /// The engine artifacts are rendered and written with
    #[must_use]
    pub const fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Process every record
    pub async fn run(&self, records: &[Record]) -> BatchReport {
        self.run_with(records, |_| {}).await
    }

    /// Process every record, calling `observe` after each one
    pub async fn run_with<F>(&self, records: &[Record], mut observe: F) -> BatchReport
    where
        F: FnMut(&MergeResult) + Send,
    {
        info!(
            records = records.len(),
            output = %self.engine.output_dir().display(),
            delivering = self.delivery.is_some(),
            "Starting merge"
        );

        let mut report = BatchReport::default();
        for record in records {
            let (result, sent) = self.process(record).await;
            observe(&result);
            report.sent += usize::from(sent);
            report.push(result);
            if report.aborted {
                break;
            }
        }

        info!(
            processed = report.results.len(),
            sent = report.sent,
            failed = report.failed(),
            aborted = report.aborted,
            "Merge finished"
        );
        report
    }

    /// Email every record without producing artifacts
    ///
    /// `AttachmentSource::Artifact` has nothing to attach here and behaves
    /// like `AttachmentSource::None`.
    pub async fn run_text_only(
        plan: &DeliveryPlan,
        sender: &dyn EmailSender,
        records: &[Record],
    ) -> BatchReport {
        info!(records = records.len(), "Starting bulk email");

        let mut report = BatchReport::default();
        for record in records {
            let (result, sent) = deliver(plan, sender, record, MergeResult::new(record)).await;
            report.sent += usize::from(sent);
            report.push(result);
            if report.aborted {
                break;
            }
        }

        info!(sent = report.sent, aborted = report.aborted, "Bulk email finished");
        report
    }

    async fn process(&self, record: &Record) -> (MergeResult, bool) {
        let mut result = MergeResult::new(record);

        let artifact = match self.engine.render(&self.template, record) {
            Ok(artifact) => artifact,
            Err(err) => return (result.failed(err), false),
        };

        match self.engine.write(&artifact) {
            Ok(path) => {
                debug!(index = result.index, path = %path.display(), "Document created");
                result.path = Some(path);
            }
            Err(err) => return (result.failed(err), false),
        }

        match &self.delivery {
            Some(delivery) => deliver(&delivery.plan, delivery.sender, record, result).await,
            None => {
                result.recipient = resolve_recipient(record, RecipientPolicy::default());
                (result, false)
            }
        }
    }
}

/// Send one record's email; the flag is whether the transport accepted it
async fn deliver(
    plan: &DeliveryPlan,
    sender: &dyn EmailSender,
    record: &Record,
    mut result: MergeResult,
) -> (MergeResult, bool) {
    let Some(recipient) = resolve_recipient(record, plan.recipients) else {
        warn!(index = result.index, name = %record.label(), "No email found, skipping");
        result.status = MergeStatus::SkippedNoRecipient;
        return (result, false);
    };
    result.recipient = Some(recipient.clone());

    let mut email = plan.compose(record, &recipient);

    let attachment_path = match &plan.attachment {
        AttachmentSource::None => None,
        AttachmentSource::Artifact => result.path.clone(),
        AttachmentSource::Path(template) => Some(PathBuf::from(template.substitute(record))),
    };
    if let Some(path) = attachment_path {
        match read_attachment(&path) {
            Ok(attachment) => email = email.attach(attachment),
            Err(err) => return (result.failed(err), false),
        }
    }

    match sender.send(email).await {
        Ok(()) => {
            info!(index = result.index, recipient = %recipient, "Email sent");
            (result, true)
        }
        Err(err) => {
            let err = match err {
                EmailError::Authentication(message) => MergeError::DeliveryAuth(message),
                other => MergeError::DeliveryTransport {
                    recipient,
                    message: other.to_string(),
                },
            };
            (result.failed(err), false)
        }
    }
}

fn read_attachment(path: &Path) -> Result<Attachment, MergeError> {
    let data = std::fs::read(path).map_err(|source| MergeError::AttachmentRead {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(Attachment::new(filename, data))
}
