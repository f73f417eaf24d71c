use indexmap::IndexMap;
use std::hash::Hash;

/// Disjoint sets of arbitrary hashable items.
///
/// Sets live in an arena and every item stores the index of its set, so no
/// set ever points at another. A union moves the members of the smaller set
/// into the larger one and leaves an empty slot behind; there is no path
/// compression because lookups are already a single hop.
///
/// ```
/// use synteny::libs::grouper::Grouper;
///
/// let mut g = Grouper::new();
/// g.join("a", "b");
/// g.join("b", "c");
/// g.join("d", "e");
/// assert_eq!(g.len(), 2);
/// assert!(g.joined(&"a", &"c"));
/// assert!(!g.joined(&"a", &"d"));
/// assert!(!g.contains(&"f"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Grouper<T: Hash + Eq + Clone> {
    mapping: IndexMap<T, usize>,
    sets: Vec<Vec<T>>,
}

impl<T: Hash + Eq + Clone> Grouper<T> {
    pub fn new() -> Self {
        Self {
            mapping: IndexMap::new(),
            sets: Vec::new(),
        }
    }

    /// Adds `item` as a singleton if it is not known yet. Returns its set index.
    pub fn add(&mut self, item: T) -> usize {
        if let Some(&idx) = self.mapping.get(&item) {
            return idx;
        }
        let idx = self.sets.len();
        self.sets.push(vec![item.clone()]);
        self.mapping.insert(item, idx);
        idx
    }

    pub fn join(&mut self, a: T, b: T) {
        let mut ia = self.add(a);
        let mut ib = self.add(b);
        if ia == ib {
            return;
        }

        // attach the smaller set to the larger one
        if self.sets[ia].len() < self.sets[ib].len() {
            std::mem::swap(&mut ia, &mut ib);
        }
        let moved = std::mem::take(&mut self.sets[ib]);
        for item in &moved {
            self.mapping.insert(item.clone(), ia);
        }
        self.sets[ia].extend(moved);
    }

    pub fn joined(&self, a: &T, b: &T) -> bool {
        match (self.mapping.get(a), self.mapping.get(b)) {
            (Some(ia), Some(ib)) => ia == ib,
            _ => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.mapping.contains_key(item)
    }

    /// Members of the set holding `item`, in the order they joined.
    pub fn group(&self, item: &T) -> Option<&[T]> {
        self.mapping.get(item).map(|&idx| self.sets[idx].as_slice())
    }

    /// Number of disjoint sets, singletons included.
    pub fn len(&self) -> usize {
        self.sets.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// All sets, in the order their surviving slot was created.
    pub fn groups(&self) -> impl Iterator<Item = &Vec<T>> {
        self.sets.iter().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_smaller_into_larger() {
        let mut g = Grouper::new();
        g.join(1, 2);
        g.join(2, 3);
        g.add(4);
        // {4} is smaller, so it moves into the slot of {1, 2, 3}
        g.join(4, 1);

        assert_eq!(g.len(), 1);
        assert_eq!(g.group(&4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(g.groups().count(), 1);
    }

    #[test]
    fn test_singletons() {
        let mut g = Grouper::new();
        g.add("x");
        g.add("x");
        g.add("y");
        g.join("y", "y");

        assert_eq!(g.len(), 2);
        assert!(g.joined(&"x", &"x"));
        assert!(!g.joined(&"x", &"y"));
        assert!(!g.joined(&"x", &"z"));
        assert_eq!(g.group(&"y").unwrap(), &["y"]);
        assert!(g.group(&"z").is_none());
    }

    #[test]
    fn test_rejoin_is_noop() {
        let mut g = Grouper::new();
        g.join('a', 'b');
        g.join('b', 'a');
        g.join('a', 'b');
        assert_eq!(g.len(), 1);
        assert_eq!(g.group(&'a').unwrap().len(), 2);
    }
}
