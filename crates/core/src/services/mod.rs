//! Business logic services.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentService, CommentWithAuthor};
pub use follow::FollowService;
pub use group::GroupService;
pub use post::{PostEntry, PostService};
pub use user::{ProfileStats, UserService};
