//! Validation modules

pub mod attribute_key;
pub mod import;
pub mod password;
pub mod request;

pub use attribute_key::{derive_key, qualify_item_type};
pub use import::{parse_import_rows, template_csv, ImportOutcome, ImportRow};
pub use password::validate_password;
pub use request::not_blank;
