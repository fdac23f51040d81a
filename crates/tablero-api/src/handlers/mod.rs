pub mod attribute_definitions;
pub mod attribute_values;
pub mod auth_login;
pub mod blog;
pub mod companies;
pub mod health;
pub mod items;
pub mod media_delete;
pub mod media_upload;
pub mod members;
pub mod preferences;
pub mod users;
