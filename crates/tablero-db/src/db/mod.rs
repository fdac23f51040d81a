pub mod attribute;
pub mod blog;
pub mod company;
pub mod identity;
pub mod item;
pub mod media;
pub mod preference;
