use std::sync::Arc;

use parking_lot::Mutex;

use super::FileManager;

/// Cloneable handle that serializes access to one [`FileManager`].
///
/// The lock is held for the whole closure, so a mutation together with its
/// notifications, or a full traversal, is never interleaved with another
/// caller. Observers run under that lock and must not call back into the
/// same handle.
#[derive(Clone, Default)]
pub struct SharedFileManager {
    inner: Arc<Mutex<FileManager>>,
}

impl SharedFileManager {
    pub fn new(manager: FileManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FileManager) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl From<FileManager> for SharedFileManager {
    fn from(manager: FileManager) -> Self {
        Self::new(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FileType;
    use crate::observer::{ChangeEvent, NodeObserver};
    use snafu::Whatever;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn concurrent_adds_keep_tree_consistent() {
        let shared = SharedFileManager::default();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let observer: Arc<dyn NodeObserver> =
            Arc::new(move |_: &ChangeEvent| -> Result<(), Whatever> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        shared.with(|manager| manager.register(observer, manager.root()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for n in 0..25 {
                        shared.with(|manager| {
                            let file = manager
                                .new_text_file_node(
                                    FileType::Text,
                                    format!("w{worker}-{n}.txt"),
                                    1,
                                    "utf-8",
                                    1,
                                )
                                .unwrap();
                            let root = manager.root();
                            manager.add(root, file).unwrap();
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (files, listed) = shared.with(|manager| {
            let root = manager.root();
            (
                manager.file_amount(root).unwrap(),
                manager.list(root).unwrap().len(),
            )
        });
        assert_eq!(files, 200);
        assert_eq!(listed, 200);
        assert_eq!(notified.load(Ordering::SeqCst), 200);
    }
}
