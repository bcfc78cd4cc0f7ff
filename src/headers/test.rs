use super::*;

#[test]
fn insert_and_get() {
    let mut map = HeaderMap::new();
    map.insert("content-type", "text/html");
    assert_eq!(map.get("content-type").unwrap(), "text/html");
    assert!(map.contains_key("content-type"));
    assert_eq!(map.len(), 1);
}

#[test]
fn lookup_is_case_insensitive() {
    let mut map = HeaderMap::new();
    map.insert("Content-Type", "text/plain");
    assert_eq!(map.get("content-type").unwrap(), "text/plain");
    assert_eq!(map.get("CONTENT-TYPE").unwrap(), "text/plain");
}

#[test]
fn insert_replaces_all() {
    let mut map = HeaderMap::new();
    map.append("set-cookie", "a=1");
    map.append("set-cookie", "b=2");
    let old = map.insert("set-cookie", "c=3");
    assert_eq!(old.unwrap(), "a=1");
    assert_eq!(map.get_all("set-cookie").count(), 1);
    assert_eq!(map.get("set-cookie").unwrap(), "c=3");
}

#[test]
fn append_keeps_all() {
    let mut map = HeaderMap::new();
    map.append("set-cookie", "a=1");
    map.append("set-cookie", "b=2");
    let values = map.get_all("set-cookie").collect::<Vec<_>>();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], &"a=1");
    assert_eq!(values[1], &"b=2");
}

#[test]
fn remove_returns_first() {
    let mut map = HeaderMap::new();
    map.append("x-tag", "one");
    map.append("x-tag", "two");
    assert_eq!(map.remove("x-tag").unwrap(), "one");
    assert!(map.get("x-tag").is_none());
    assert!(map.is_empty());
}

#[test]
fn iter_preserves_insertion_order() {
    let mut map = HeaderMap::new();
    map.insert("host", "example.com");
    map.insert("date", "now");
    map.append("set-cookie", "a=1");
    let names = map.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["host", "date", "set-cookie"]);
}

#[test]
fn name_from_string_lowercases() {
    let name = HeaderName::from_string("X-Custom-Header");
    assert_eq!(name.as_str(), "x-custom-header");
}
