#[cfg(test)]
pub mod test {
    use parking_lot::Mutex;

    use crate::error::{Error, Result};
    use crate::memory::MemoryStore;
    use crate::path::Path;
    use crate::pubsub::MessageReceiver;
    use crate::scope::Scope;
    use crate::storage::{Getter, Setter};
    use crate::value::Value;

    /// Parse a fully qualified path or panic.
    pub fn path(fq: &str) -> Path {
        Path::parse(fq).unwrap()
    }

    pub fn noop(_: &Path, _: &Value) -> Result<()> {
        Ok(())
    }

    /// A receiver that forwards every notification into a channel.
    pub fn recorder() -> (impl MessageReceiver, flume::Receiver<(Path, Value)>) {
        let (tx, rx) = flume::unbounded();
        let receiver = move |p: &Path, v: &Value| -> Result<()> {
            let _ = tx.send((p.clone(), v.clone()));
            Ok(())
        };
        (receiver, rx)
    }

    // -- Backends ----------------------------------------------------------------

    /// Fails with a backend error at `fail_at`, or everywhere when it is `None`.
    #[derive(Debug, Default)]
    pub struct FailingStore {
        inner: MemoryStore,
        fail_at: Option<Path>,
    }

    impl FailingStore {
        pub fn at(inner: MemoryStore, fq: &str) -> Self {
            FailingStore {
                inner,
                fail_at: Some(path(fq)),
            }
        }
    }

    impl Getter for FailingStore {
        fn get(&self, p: &Path) -> Result<Value> {
            match &self.fail_at {
                Some(target) if target != p => self.inner.get(p),
                _ => Err(Error::backend(p, "connection reset by peer")),
            }
        }
    }

    impl Setter for FailingStore {
        fn set(&self, p: &Path, value: Value) -> Result<()> {
            self.inner.set(p, value)
        }
    }

    /// Panics when asked for anything at store scope.
    pub struct StorePanics(pub MemoryStore);

    impl Getter for StorePanics {
        fn get(&self, p: &Path) -> Result<Value> {
            assert_ne!(p.scope(), Scope::Store, "store scope queried: {p}");
            self.0.get(p)
        }
    }

    /// Records every path it is asked for.
    pub struct CountingStore {
        inner: MemoryStore,
        queried: Mutex<Vec<String>>,
    }

    impl CountingStore {
        pub fn new(inner: MemoryStore) -> Self {
            CountingStore {
                inner,
                queried: Mutex::new(Vec::new()),
            }
        }

        pub fn queried(&self) -> Vec<String> {
            self.queried.lock().clone()
        }
    }

    impl Getter for CountingStore {
        fn get(&self, p: &Path) -> Result<Value> {
            self.queried.lock().push(p.to_string());
            self.inner.get(p)
        }
    }

    impl Setter for CountingStore {
        fn set(&self, p: &Path, value: Value) -> Result<()> {
            self.inner.set(p, value)
        }
    }

    #[test]
    fn failing_store_only_fails_at_target() {
        let inner = MemoryStore::with_values([("default/0/a/b/c", Value::Integer(1))]).unwrap();
        let store = FailingStore::at(inner, "stores/1/a/b/c");
        assert_eq!(store.get(&path("default/0/a/b/c")).unwrap(), Value::Integer(1));
        assert!(!store.get(&path("stores/1/a/b/c")).unwrap_err().is_not_found());
    }
}
