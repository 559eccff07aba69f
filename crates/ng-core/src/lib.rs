pub mod export;
pub mod id;
pub mod model;
pub mod remap;
pub mod transform;
pub mod validate;

pub use export::{ExportDocument, FORMAT_VERSION, export_filename, iso_timestamp};
pub use id::NodeId;
pub use model::*;
pub use remap::{Clipboard, MergeResult, PASTE_GAP, PasteContext, PasteError, merge_clipboard};
pub use transform::{IDENTITY_TRANSFORM, MAX_SCALE, MIN_SCALE, ViewTransform};
pub use validate::{
    ImportError, ImportLimits, MAX_REPORTED, Sample, check_limits, normalize_workspace,
    parse_import, validate_import,
};
