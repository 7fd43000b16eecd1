pub mod prelude;

pub mod files;
pub mod folders;
pub mod orphan_blobs;
pub mod users;
