//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - Where the API patches rows, an update DTO with `Option` fields

pub mod comment;
pub mod media;
pub mod notification;
pub mod project;
pub mod review_link;
pub mod track;
pub mod user;
