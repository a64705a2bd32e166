pub mod apply;
pub mod backup;
pub mod error;
pub mod extract;
pub mod plan;
pub mod sheet;
pub mod source;
pub mod store;
pub mod tag_table;

pub use apply::{ApplyExecutor, ApplyOptions, ImportRunResult};
pub use backup::{write_backup, BackupOutcome, BackupRecord};
pub use error::{ImportError, ImportErrorKind, Result};
pub use extract::{ExtractReport, Extraction, Extractor};
pub use plan::{ImportPlan, Planner, PLAN_VERSION};
pub use sheet::Sheet;
pub use source::{open_source, CsvDirSource, CsvFileSource, JsonWorkbookSource, SheetSource};
pub use store::{ContactStore, NewContact, TagAssignment};
pub use tag_table::TagTable;
