pub use super::files::Entity as Files;
pub use super::folders::Entity as Folders;
pub use super::orphan_blobs::Entity as OrphanBlobs;
pub use super::users::Entity as Users;
