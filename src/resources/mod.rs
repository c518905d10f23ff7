/*!
 * Resources
 * Concrete external resources managed by lifecycle guards
 */

pub mod file;
pub mod peer;

pub use file::{FileConfig, FileGuard, FileLock, FileResource, LockConfig, LockedFile, LockedFileGuard};
pub use peer::{LocalRuntime, PeerConfig, PeerGuard, PeerResource, PeerRuntime};
