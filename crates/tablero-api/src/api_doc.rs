//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use tablero_core::models;
use tablero_core::validation;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tablero API",
        version = "0.1.0",
        description = "Multi-tenant admin panel API (v0): companies, members, \
            items with typed custom attributes, item media and blog posts. All \
            endpoints are versioned under /api/v0/."
    ),
    paths(
        // Auth
        handlers::auth_login::login,
        // Companies
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        // Members
        handlers::members::create_member,
        handlers::members::list_members,
        handlers::members::change_member_role,
        // Users
        handlers::users::create_user,
        handlers::users::invite_user,
        handlers::users::list_users,
        // Attribute definitions
        handlers::attribute_definitions::create_definitions,
        handlers::attribute_definitions::list_definitions,
        handlers::attribute_definitions::update_definition,
        handlers::attribute_definitions::import_definitions,
        handlers::attribute_definitions::definition_template,
        // Items
        handlers::items::create_item,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        // Attribute values
        handlers::attribute_values::upsert_value,
        handlers::attribute_values::list_item_attributes,
        // Media
        handlers::media_upload::upload_media,
        handlers::media_upload::list_item_media,
        handlers::media_delete::delete_media,
        // Blog
        handlers::blog::create_post,
        handlers::blog::list_posts,
        handlers::blog::update_post,
        handlers::blog::delete_post,
        // Filter preferences
        handlers::preferences::get_preference,
        handlers::preferences::save_preference,
        // Health
        handlers::health::health,
    ),
    components(schemas(
        error::ErrorResponse,
        models::Company,
        models::CompanyMember,
        models::MemberRole,
        models::UserIdentity,
        models::Item,
        models::PublishStatus,
        models::AttributeDefinition,
        models::NewAttributeDefinition,
        models::AttributeDataType,
        models::AttributeValue,
        models::ItemAttribute,
        models::ItemMedia,
        models::MediaFileType,
        models::BlogPost,
        models::FilterPreference,
        validation::ImportRow,
        handlers::auth_login::LoginRequest,
        handlers::auth_login::LoginResponse,
        handlers::companies::CreateCompanyRequest,
        handlers::companies::UpdateCompanyRequest,
        handlers::members::CreateMemberRequest,
        handlers::members::ChangeRoleRequest,
        handlers::users::CreateUserRequest,
        handlers::users::InviteUserRequest,
        handlers::users::CreatedUserResponse,
        handlers::attribute_definitions::CreateDefinitionsRequest,
        handlers::attribute_definitions::UpdateDefinitionRequest,
        handlers::attribute_definitions::ImportDefinitionsRequest,
        handlers::attribute_definitions::ImportDefinitionsResponse,
        handlers::items::CreateItemRequest,
        handlers::items::UpdateItemRequest,
        handlers::items::ItemListResponse,
        handlers::attribute_values::UpsertValueRequest,
        handlers::attribute_values::UpsertValueResponse,
        handlers::media_upload::UploadMediaForm,
        handlers::media_delete::DeleteMediaResponse,
        handlers::blog::CreatePostRequest,
        handlers::blog::UpdatePostRequest,
        handlers::preferences::SavePreferenceRequest,
        handlers::preferences::PreferenceResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "companies", description = "Company management"),
        (name = "members", description = "Company membership and roles"),
        (name = "users", description = "User identities"),
        (name = "attributes", description = "Custom attribute schema and values"),
        (name = "items", description = "Item CRUD and listing"),
        (name = "media", description = "Item media"),
        (name = "blog", description = "Company blog"),
        (name = "preferences", description = "Per-user filter preferences"),
        (name = "health", description = "Health check")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
