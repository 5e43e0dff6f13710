pub mod codec;
pub mod fs;
pub mod store;

pub use codec::{Codec, JsonCodec};
pub use fs::{Filesystem, FsError, FsResult, LocalFs};
pub use store::{Store, TopicScope};
