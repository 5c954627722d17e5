//! The persons API: create, read and info.
//!
//! Each operation is an ordinary async function. The `*_handler`
//! constructors declare the argument names the dispatcher binds by.

use std::collections::HashMap;
use std::sync::Arc;

use hermes_core::{BoundArgs, Handler, IncomingRequest, Reply};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for creating a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonCreate {
    /// Display name.
    pub name: String,
}

/// A stored person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonInfo {
    /// Identifier assigned on creation.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// `create` accepts one person or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item.
    One(T),
    /// A list of items.
    Many(Vec<T>),
}

/// The person was not in storage.
#[derive(Debug, thiserror::Error)]
#[error("Person with id={0} not found!")]
pub struct PersonNotFound(pub Uuid);

/// In-memory person storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    persons: RwLock<HashMap<Uuid, PersonInfo>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a person, replacing any with the same id.
    pub fn insert(&self, person: PersonInfo) {
        self.persons.write().insert(person.id, person);
    }

    /// Looks a person up.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<PersonInfo> {
        self.persons.read().get(id).cloned()
    }

    /// Returns the number of stored persons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.persons.read().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.read().is_empty()
    }
}

/// Creates one or several persons with fresh ids.
///
/// The output has the same shape as the input: one in, one out.
pub fn create(data: OneOrMany<PersonCreate>, storage: &MemoryStorage) -> OneOrMany<PersonInfo> {
    let mut store = |person: PersonCreate| {
        let info = PersonInfo {
            id: Uuid::new_v4(),
            name: person.name,
        };
        storage.insert(info.clone());
        info
    };

    match data {
        OneOrMany::One(person) => OneOrMany::One(store(person)),
        OneOrMany::Many(persons) => OneOrMany::Many(persons.into_iter().map(store).collect()),
    }
}

/// Reads a stored person.
pub fn read(storage: &MemoryStorage, id: Uuid) -> Result<PersonInfo, PersonNotFound> {
    storage.get(&id).ok_or(PersonNotFound(id))
}

/// Describes the request that asked for `info_id`.
pub fn info(info_id: i64, request: &IncomingRequest) -> String {
    format!("info_id={info_id} and request={request}")
}

/// `create(data, storage)`.
pub fn create_handler() -> Handler {
    Handler::builder("create")
        .arg::<OneOrMany<PersonCreate>>("data")
        .arg::<MemoryStorage>("storage")
        .build(|args: BoundArgs| async move {
            let data = args.value::<OneOrMany<PersonCreate>>("data")?;
            let storage: Arc<MemoryStorage> = args.shared("storage")?;
            Ok(Reply::new(create(data, &storage)))
        })
}

/// `read(storage, req, data)`.
///
/// The request argument is declared but unused, to show that any name can
/// carry the request.
pub fn read_handler() -> Handler {
    Handler::builder("read")
        .arg::<MemoryStorage>("storage")
        .request("req")
        .arg::<Uuid>("data")
        .build(|args: BoundArgs| async move {
            let storage: Arc<MemoryStorage> = args.shared("storage")?;
            let id = args.value::<Uuid>("data")?;
            Ok(Reply::new(read(&storage, id)?))
        })
}

/// `info(info_id, request)`.
pub fn info_handler() -> Handler {
    Handler::builder("info")
        .arg::<i64>("info_id")
        .request("request")
        .build(|args: BoundArgs| async move {
            let info_id = args.value::<i64>("info_id")?;
            let request = args.request("request")?;
            Ok(Reply::new(info(info_id, &request)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ivan() -> PersonCreate {
        PersonCreate {
            name: "Ivan".to_string(),
        }
    }

    #[test]
    fn test_create_one_keeps_shape() {
        let storage = MemoryStorage::new();
        let OneOrMany::One(person) = create(OneOrMany::One(ivan()), &storage) else {
            panic!("expected one person");
        };
        assert_eq!(person.name, "Ivan");
        assert_eq!(storage.get(&person.id), Some(person));
    }

    #[test]
    fn test_create_many_keeps_shape() {
        let storage = MemoryStorage::new();
        let created = create(OneOrMany::Many(vec![ivan(), ivan()]), &storage);
        let OneOrMany::Many(persons) = created else {
            panic!("expected a list");
        };
        assert_eq!(persons.len(), 2);
        assert_ne!(persons[0].id, persons[1].id);
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_read() {
        let storage = MemoryStorage::new();
        let OneOrMany::One(created) = create(OneOrMany::One(ivan()), &storage) else {
            panic!("expected one person");
        };
        assert_eq!(read(&storage, created.id).unwrap(), created);

        let missing = Uuid::new_v4();
        let err = read(&storage, missing).unwrap_err();
        assert_eq!(err.to_string(), format!("Person with id={missing} not found!"));
    }

    #[test]
    fn test_input_shapes() {
        let one: OneOrMany<PersonCreate> = serde_json::from_str(r#"{"name":"Ivan"}"#).unwrap();
        assert_eq!(one, OneOrMany::One(ivan()));

        let many: OneOrMany<PersonCreate> = serde_json::from_str(r#"[{"name":"Ivan"}]"#).unwrap();
        assert_eq!(many, OneOrMany::Many(vec![ivan()]));

        assert!(serde_json::from_str::<OneOrMany<PersonCreate>>(r#"{"wrong_arg_name":"foo"}"#).is_err());
        assert!(serde_json::from_str::<OneOrMany<PersonCreate>>(r#"{"name":1111111}"#).is_err());
        assert!(serde_json::from_str::<OneOrMany<PersonCreate>>(r#"[{"name":1},{"name":2}]"#).is_err());
    }

    #[test]
    fn test_info() {
        let request = IncomingRequest::builder()
            .method(http::Method::GET)
            .uri("/info/5")
            .build();
        assert_eq!(info(5, &request), "info_id=5 and request=<Request GET /info/5 >");
    }

    #[test]
    fn test_handler_declarations() {
        let names = |h: &Handler| h.args().iter().map(|a| a.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(&create_handler()), ["data", "storage"]);
        assert_eq!(names(&read_handler()), ["storage", "req", "data"]);
        assert_eq!(names(&info_handler()), ["info_id", "request"]);
        assert!(read_handler().args()[1].is_request());
    }
}
