//! `SeaORM` entity definitions.

// Entity modules follow the shape `sea-orm-cli generate` emits;
// per-column docs live on the domain types, not here.
#[allow(missing_docs)]
pub mod posts;
#[allow(missing_docs)]
pub mod users;
