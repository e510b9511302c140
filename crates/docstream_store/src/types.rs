//! Core type definitions shared by stores and cursors.

use docstream_codec::Value;
use std::fmt;

/// Opaque identifier of a store-issued session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from its store representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pre-built read predicate.
///
/// The predicate is a CBOR document interpreted by the store. A filter is
/// immutable once built; cursors only forward it to the store.
///
/// # Example
///
/// ```
/// use docstream_store::Filter;
///
/// let active = Filter::field_eq("status", "active");
/// assert!(!active.is_match_all());
/// assert!(Filter::all().is_match_all());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    predicate: Value,
}

impl Filter {
    /// Wraps a pre-built predicate document.
    pub fn new(predicate: Value) -> Self {
        Self { predicate }
    }

    /// A filter that matches every document.
    pub fn all() -> Self {
        Self::new(Value::Map(Vec::new()))
    }

    /// A filter matching documents whose `field` equals `value`.
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(Value::Map(vec![(
            Value::Text(field.into()),
            value.into(),
        )]))
    }

    /// Returns the predicate document.
    pub fn predicate(&self) -> &Value {
        &self.predicate
    }

    /// Returns true if this filter places no constraint on documents.
    pub fn is_match_all(&self) -> bool {
        match &self.predicate {
            Value::Null => true,
            Value::Map(pairs) => pairs.is_empty(),
            _ => false,
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

/// Tag identifying the Rust record type a cursor decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordType {
    name: &'static str,
}

impl RecordType {
    /// Returns the tag for `R`.
    pub fn of<R: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<R>(),
        }
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The collection a cursor reads from, bound to the record type it yields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionIdentity {
    name: String,
    record_type: RecordType,
}

impl CollectionIdentity {
    /// Creates an identity with an explicit collection name.
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
        }
    }

    /// Resolves the collection for record type `R`.
    ///
    /// Uses `name_override` when given; otherwise the name is derived from
    /// the type name in snake_case (`UserProfile` becomes `user_profile`).
    pub fn resolve<R: ?Sized>(name_override: Option<&str>) -> Self {
        let record_type = RecordType::of::<R>();
        let name = match name_override {
            Some(name) => name.to_string(),
            None => to_snake_case(record_type.short_name()),
        };
        Self { name, record_type }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the record type tag.
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }
}

impl fmt::Display for CollectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.record_type.short_name())
    }
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parameters for opening a raw cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenCursorRequest {
    /// Read predicate.
    pub filter: Filter,
    /// Target collection.
    pub collection: CollectionIdentity,
    /// How many documents the store should fetch per round trip.
    pub batch_size_hint: u32,
    /// Disables the server-side idle timeout for this cursor.
    pub no_cursor_timeout: bool,
}

impl OpenCursorRequest {
    /// Creates a request with the server-side timeout disabled.
    pub fn new(filter: Filter, collection: CollectionIdentity, batch_size_hint: u32) -> Self {
        Self {
            filter,
            collection,
            batch_size_hint,
            no_cursor_timeout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserProfile;
    struct HTTPLog;

    #[test]
    fn record_type_short_name() {
        let tag = RecordType::of::<UserProfile>();
        assert!(tag.name().ends_with("::UserProfile"));
        assert_eq!(tag.short_name(), "UserProfile");

        let generic = RecordType::of::<Vec<UserProfile>>();
        assert_eq!(generic.short_name(), "Vec");
    }

    #[test]
    fn collection_default_is_snake_case() {
        let identity = CollectionIdentity::resolve::<UserProfile>(None);
        assert_eq!(identity.name(), "user_profile");
        assert_eq!(identity.record_type(), RecordType::of::<UserProfile>());

        assert_eq!(CollectionIdentity::resolve::<HTTPLog>(None).name(), "http_log");
    }

    #[test]
    fn collection_override_wins() {
        let identity = CollectionIdentity::resolve::<UserProfile>(Some("profiles_v2"));
        assert_eq!(identity.name(), "profiles_v2");
        assert_eq!(identity.record_type().short_name(), "UserProfile");
    }

    #[test]
    fn snake_case_edge_cases() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("user"), "user");
        assert_eq!(to_snake_case("Order2Line"), "order2_line");
        assert_eq!(to_snake_case("ABC"), "abc");
    }

    #[test]
    fn filter_constructors() {
        assert!(Filter::all().is_match_all());
        assert!(Filter::new(Value::Null).is_match_all());
        assert!(Filter::default().is_match_all());

        let f = Filter::field_eq("age", 30);
        assert!(!f.is_match_all());
        let pairs = f.predicate().as_map().unwrap();
        assert_eq!(pairs[0].0, Value::Text("age".into()));
    }

    #[test]
    fn open_request_disables_timeout() {
        let request = OpenCursorRequest::new(
            Filter::all(),
            CollectionIdentity::resolve::<UserProfile>(None),
            1000,
        );
        assert!(request.no_cursor_timeout);
        assert_eq!(request.batch_size_hint, 1000);
    }
}
