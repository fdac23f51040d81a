//! Domain models shared across the workspace.

pub mod attribute;
pub mod blog;
pub mod company;
pub mod item;
pub mod media;
pub mod preference;
pub mod user;

pub use attribute::{
    AttributeDataType, AttributeDefinition, AttributeValue, AttributeValueRow, ItemAttribute,
    NewAttributeDefinition,
};
pub use blog::BlogPost;
pub use company::{Company, CompanyMember, MemberRole};
pub use item::{Item, PublishStatus};
pub use media::{ItemMedia, MediaFileType};
pub use preference::FilterPreference;
pub use user::UserIdentity;
