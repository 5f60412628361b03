use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// One document collection keyed by id. This is the whole persistence
/// contract the engine relies on: find / find_one / insert / update /
/// remove / aggregate_sum. A real document database slots in behind the
/// same surface.
pub struct Collection<D: Clone> {
    docs: DashMap<Ulid, D>,
}

impl<D: Clone> Default for Collection<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone> Collection<D> {
    pub fn new() -> Self {
        Self { docs: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, id: &Ulid) -> bool {
        self.docs.contains_key(id)
    }

    pub fn get(&self, id: &Ulid) -> Option<D> {
        self.docs.get(id).map(|e| e.value().clone())
    }

    pub fn find(&self, pred: impl Fn(&D) -> bool) -> Vec<D> {
        self.docs
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn find_one(&self, pred: impl Fn(&D) -> bool) -> Option<D> {
        self.docs
            .iter()
            .find(|e| pred(e.value()))
            .map(|e| e.value().clone())
    }

    pub fn insert(&self, id: Ulid, doc: D) {
        self.docs.insert(id, doc);
    }

    /// Upsert; same operation as insert at this layer, kept separate so
    /// call sites read as what they mean.
    pub fn update(&self, id: Ulid, doc: D) {
        self.docs.insert(id, doc);
    }

    pub fn remove(&self, id: &Ulid) -> Option<D> {
        self.docs.remove(id).map(|(_, d)| d)
    }

    /// Remove every document matching the filter, returning how many went.
    pub fn remove_where(&self, pred: impl Fn(&D) -> bool) -> usize {
        let doomed: Vec<Ulid> = self
            .docs
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| *e.key())
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.docs.remove(&id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Sum a numeric field over the matching documents. An empty match
    /// set is a legitimate state and sums to 0, not an error.
    pub fn aggregate_sum(&self, pred: impl Fn(&D) -> bool, field: impl Fn(&D) -> i64) -> i64 {
        self.docs
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| field(e.value()))
            .sum()
    }

    pub fn ids(&self) -> Vec<Ulid> {
        self.docs.iter().map(|e| *e.key()).collect()
    }
}

/// The four collections the tracker keeps.
#[derive(Default)]
pub struct Store {
    pub items: Collection<ItemDoc>,
    pub reservations: Collection<ReservationDoc>,
    pub users: Collection<UserDoc>,
    pub activities: Collection<ActivityDoc>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, count: i64) -> ItemDoc {
        ItemDoc {
            id: Ulid::new(),
            name: name.into(),
            count,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn insert_get_remove() {
        let coll: Collection<ItemDoc> = Collection::new();
        let doc = item("bearing", 40);
        coll.insert(doc.id, doc.clone());
        assert!(coll.contains(&doc.id));
        assert_eq!(coll.get(&doc.id), Some(doc.clone()));
        assert_eq!(coll.remove(&doc.id), Some(doc.clone()));
        assert!(coll.get(&doc.id).is_none());
    }

    #[test]
    fn find_filters() {
        let coll: Collection<ItemDoc> = Collection::new();
        for (name, count) in [("bolt", 100), ("nut", 100), ("gear", 3)] {
            let doc = item(name, count);
            coll.insert(doc.id, doc);
        }
        assert_eq!(coll.find(|d| d.count == 100).len(), 2);
        assert!(coll.find_one(|d| d.name == "gear").is_some());
        assert!(coll.find_one(|d| d.name == "sprocket").is_none());
    }

    #[test]
    fn aggregate_sum_empty_is_zero() {
        let coll: Collection<ItemDoc> = Collection::new();
        assert_eq!(coll.aggregate_sum(|_| true, |d| d.count), 0);
    }

    #[test]
    fn aggregate_sum_matches_filter() {
        let coll: Collection<ItemDoc> = Collection::new();
        for count in [5, 7, 11] {
            let doc = item("x", count);
            coll.insert(doc.id, doc);
        }
        assert_eq!(coll.aggregate_sum(|_| true, |d| d.count), 23);
        assert_eq!(coll.aggregate_sum(|d| d.count > 5, |d| d.count), 18);
    }

    #[test]
    fn remove_where_counts() {
        let coll: Collection<ItemDoc> = Collection::new();
        for count in [1, 2, 3, 4] {
            let doc = item("x", count);
            coll.insert(doc.id, doc);
        }
        assert_eq!(coll.remove_where(|d| d.count % 2 == 0), 2);
        assert_eq!(coll.len(), 2);
        assert_eq!(coll.remove_where(|d| d.count == 99), 0);
    }
}
