//! mailmerge: personalize templates per record and deliver them by email
//!
//! A mail merge takes a list of records (JSON objects or CSV rows), applies
//! one template to each, writes one artifact per record, and optionally
//! emails every artifact to the address found in its record.
//!
//! # Design Principles
//!
//! 1. **Per-record isolation**: a record that fails to render, write, or send
//!    never stops the others; only rejected credentials end a run early
//! 2. **Explicit outcomes**: every record yields a [`batch::MergeResult`] and
//!    every run a [`batch::BatchReport`]
//! 3. **Deterministic naming**: artifacts are named `{id}_{name}` from the
//!    record
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mailmerge::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let records = RecordSource::load("data.json")?;
//!     let template = Template::load("template.docx")?;
//!
//!     let report = MergeBatch::new(MergeEngine::new("output"), template)
//!         .run(&records)
//!         .await;
//!
//!     println!("{} documents created", report.succeeded());
//!     Ok(())
//! }
//! ```
//!
//! # Templates
//!
//! `.docx` templates use `{{ field }}` placeholders and fail on fields the
//! record lacks. Text and HTML templates use literal `{{field}}` tokens and
//! leave unknown tokens untouched. See [`template`].

pub mod batch;
pub mod config;
pub mod email;
pub mod engine;
pub mod error;
pub mod observability;
pub mod record;
pub mod source;
pub mod template;
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use mailmerge::prelude::*;
    //! ```

    pub use crate::batch::{
        AttachmentSource, BatchReport, BodyKind, DeliveryPlan, MergeBatch, MergeResult, MergeStatus,
    };
    pub use crate::config::MailMergeConfig;
    pub use crate::email::{
        Attachment, ConsoleBackend, Email, EmailError, EmailSender, SmtpBackend, SmtpConfig,
    };
    pub use crate::engine::{derive_name, resolve_recipient, Artifact, MergeEngine, RecipientPolicy};
    pub use crate::error::{MergeError, Result};
    pub use crate::record::{FieldValue, Record};
    pub use crate::source::{RecordSource, SourceFormat};
    pub use crate::template::{DocxTemplate, Template, TextTemplate};
}
