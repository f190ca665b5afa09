//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod activity_repo;
pub mod comment_repo;
pub mod invitation_repo;
pub mod media_repo;
pub mod notification_preference_repo;
pub mod project_repo;
pub mod review_link_repo;
pub mod track_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use comment_repo::CommentRepo;
pub use invitation_repo::InvitationRepo;
pub use media_repo::MediaRepo;
pub use notification_preference_repo::NotificationPreferenceRepo;
pub use project_repo::ProjectRepo;
pub use review_link_repo::ReviewLinkRepo;
pub use track_repo::TrackRepo;
pub use user_repo::UserRepo;
