/// Data models for users, links and feed queries
pub mod feed;
pub mod link;
pub mod user;

pub use feed::{FeedQuery, LinkOrder, LinkOrderField, SortDirection};
pub use link::{Link, LinkChanges, NewLink, Vote};
pub use user::{NewUser, User};
