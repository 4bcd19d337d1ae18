//! Repositories: one per entity, each a thin async wrapper over sea-orm queries.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostRepository, PostScope};
pub use user::UserRepository;
