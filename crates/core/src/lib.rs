mod allocator;
mod config;
mod engine;
mod error;
mod exif_reader;
mod ledger;
mod metadata;
mod report;
mod selector;
mod template;

pub use allocator::allocate;
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    DirectoryPolicy, NameFolding, RenamerConfig, RunOptions, DEFAULT_DST_MASK, DEFAULT_EXT_MASK,
    DEFAULT_REF_FILE, DEFAULT_SRC_MASK,
};
pub use engine::RenameEngine;
pub use error::RenameError;
pub use exif_reader::{ExifTimestampReader, TimestampReader};
pub use ledger::{NameLedger, NameRecord};
pub use metadata::{apply_delta, TimestampTag};
pub use report::{Change, CollectingReporter, LogReporter, Notice, OperationReport, Reporter};
pub use template::{render_mask, validate_extension, validate_mask, MaskError};
