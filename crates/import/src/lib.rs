pub mod extract;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod source;

pub use extract::Extractor;
pub use pipeline::{BatchSummary, ImportPipeline, PipelineError};
pub use report::{FileRejectionLog, MemoryRejectionLog, Rejection, RejectionEntry, RejectionReporter};
pub use rules::{ExtractionRule, FieldStrategy, PartyCapture, PartyRole, RuleError, RuleTable};
pub use source::{load_file, parse_document, RawMessage, SourceError};
