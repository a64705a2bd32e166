pub mod cell;
pub mod contact;
pub mod ids;
pub mod import;
pub mod name;
pub mod phone;
pub mod schema;
pub mod tag;

pub use cell::CellValue;
pub use contact::{CallStatus, Contact};
pub use ids::{ContactId, TagId};
pub use import::{
    ExistingMatch, ExistingRecord, ImportAction, ImportDecision, NormalizedCandidate,
    RawImportRow,
};
pub use name::{is_real_name, names_equivalent, normalize_name_for_match, split_full_name};
pub use phone::{normalize_phone, PhoneNormalizer};
pub use schema::{ColumnRef, SchemaOrigin, SheetAlias, SheetAliases, SheetSchema};
pub use tag::{normalize_tag_name, Tag, TagName};
