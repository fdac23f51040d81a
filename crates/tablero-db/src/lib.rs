//! Database layer: one repository per table family, all tenant-scoped by
//! `company_id` where applicable.

pub mod db;

pub use db::attribute::{
    coerce_value, AttributeDefinitionRepository, AttributeValueRepository, ItemValue,
};
pub use db::blog::BlogRepository;
pub use db::company::{CompanyRepository, MemberRepository};
pub use db::identity::IdentityRepository;
pub use db::item::{ItemListFilter, ItemPage, ItemRepository, SortDirection};
pub use db::media::ItemMediaRepository;
pub use db::preference::FilterPreferenceRepository;
