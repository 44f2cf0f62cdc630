/// Key-value persistence seam, the shape of a browser local-storage or a
/// store plugin. Records are serialized JSON strings with no schema
/// versioning; readers treat missing or unparseable values as absent.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
