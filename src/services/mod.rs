//! Business logic: ownership checks, transactions and response assembly.

pub mod bookmark;
pub mod comment;
pub mod master_data;
pub mod profile;
pub mod recruiting;
pub mod token;
pub mod upload;
pub mod user;

pub use bookmark::BookmarkService;
pub use comment::CommentService;
pub use master_data::MasterDataService;
pub use profile::ProfileService;
pub use recruiting::RecruitingService;
pub use token::{TokenPair, TokenService};
pub use upload::UploadService;
pub use user::UserService;
