use super::{HeaderName, HeaderValue};

/// Insertion ordered multimap of HTTP headers.
#[derive(Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderMap {
    /// Create new empty [`HeaderMap`].
    #[inline]
    pub const fn new() -> HeaderMap {
        HeaderMap { entries: Vec::new() }
    }

    /// Create new empty [`HeaderMap`] with given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> HeaderMap {
        HeaderMap { entries: Vec::with_capacity(capacity) }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a header with the given name exists.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Returns the first value for the given name.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns all values for the given name in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> GetAll<'a> {
        GetAll { inner: self.entries.iter(), name }
    }

    /// Insert a header, replacing all existing values for the name.
    ///
    /// Returns the first replaced value, if any.
    pub fn insert(
        &mut self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        let name = name.into();
        let mut old = None;
        self.entries.retain_mut(|(n, v)| {
            if *n == *name.as_str() {
                if old.is_none() {
                    old = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        self.entries.push((name, value.into()));
        old
    }

    /// Append a header without touching existing values.
    pub fn append(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove all values for the given name, returning the first.
    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        let mut old = None;
        self.entries.retain_mut(|(n, v)| {
            if *n == *name {
                if old.is_none() {
                    old = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        old
    }

    /// Remove all entries.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over all entries in insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter { inner: self.entries.iter() }
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator returned by [`HeaderMap::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (HeaderName, HeaderValue)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HeaderName, &'a HeaderValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(n, v)| (n, v))
    }
}

/// Iterator returned by [`HeaderMap::get_all`].
#[derive(Debug)]
pub struct GetAll<'a> {
    inner: std::slice::Iter<'a, (HeaderName, HeaderValue)>,
    name: &'a str,
}

impl<'a> Iterator for GetAll<'a> {
    type Item = &'a HeaderValue;

    fn next(&mut self) -> Option<Self::Item> {
        for (n, v) in self.inner.by_ref() {
            if n == self.name {
                return Some(v);
            }
        }
        None
    }
}
