pub mod access;
pub mod files;
pub mod users;

pub use access::SqlxAccessRepository;
pub use files::SqlxFileRepository;
pub use users::SqlxUserRepository;
