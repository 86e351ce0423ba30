//! Database layer: pool, migrations and one repository module per aggregate.

mod bookmarks;
mod comments;
mod pool;
mod posts;
mod profiles;
mod taxonomy;
mod tokens;
mod users;

pub use bookmarks::*;
pub use comments::*;
pub use pool::{create_pool, run_migrations, DbPool};
pub use posts::*;
pub use profiles::*;
pub use taxonomy::*;
pub use tokens::*;
pub use users::*;
