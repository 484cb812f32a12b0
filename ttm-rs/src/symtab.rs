//! Chained symbol table.
//!
//! One table type backs the function dictionary, the character-class table
//! and the property store.  Names hash into a fixed array of chains; the
//! chain is picked by the low bits of the name's first byte and entries in a
//! chain are compared by their cached hash before their name.
//!
//! [`SymbolTable::locate`] returns a [`Location`] that can be handed back to
//! [`SymbolTable::insert_at`] or [`SymbolTable::remove_at`], so a lookup
//! followed by an insert or removal walks the chain only once.

/// Number of chains.  Must be a power of two.
pub const BUCKETS: usize = 64;

#[derive(Debug, Clone)]
struct Slot<T> {
    hash: u32,
    name: String,
    value: T,
}

/// Where a name lives, or would live, in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Found { bucket: usize, pos: usize },
    Vacant { bucket: usize, hash: u32 },
}

impl Location {
    pub fn is_found(&self) -> bool {
        matches!(self, Location::Found { .. })
    }
}

/// Weighted byte sum of `name`.  Never zero.
pub fn hash_name(name: &str) -> u32 {
    let hash = name
        .bytes()
        .enumerate()
        .fold(0u32, |acc, (i, b)| {
            acc.wrapping_add(u32::from(b).wrapping_mul(i as u32 + 1))
        });
    if hash == 0 { 1 } else { hash }
}

fn bucket_of(name: &str) -> usize {
    name.bytes().next().map_or(0, |b| usize::from(b) & (BUCKETS - 1))
}

#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    chains: Vec<Vec<Slot<T>>>,
    len: usize,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self {
            chains: (0..BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn locate(&self, name: &str) -> Location {
        let bucket = bucket_of(name);
        let hash = hash_name(name);
        match self.chains[bucket]
            .iter()
            .position(|s| s.hash == hash && s.name == name)
        {
            Some(pos) => Location::Found { bucket, pos },
            None => Location::Vacant { bucket, hash },
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        match self.locate(name) {
            Location::Found { bucket, pos } => Some(&self.chains[bucket][pos].value),
            Location::Vacant { .. } => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.locate(name) {
            Location::Found { bucket, pos } => Some(&mut self.chains[bucket][pos].value),
            Location::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locate(name).is_found()
    }

    /// Insert or replace.  Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        let loc = self.locate(&name);
        self.insert_at(loc, name, value)
    }

    /// Insert at a location obtained from [`locate`](Self::locate) for the
    /// same `name`, with no mutation in between.
    pub fn insert_at(&mut self, loc: Location, name: String, value: T) -> Option<T> {
        match loc {
            Location::Found { bucket, pos } => {
                Some(std::mem::replace(&mut self.chains[bucket][pos].value, value))
            }
            Location::Vacant { bucket, hash } => {
                self.chains[bucket].push(Slot { hash, name, value });
                self.len += 1;
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let loc = self.locate(name);
        self.remove_at(loc)
    }

    pub fn remove_at(&mut self, loc: Location) -> Option<T> {
        match loc {
            Location::Found { bucket, pos } => {
                self.len -= 1;
                Some(self.chains[bucket].swap_remove(pos).value)
            }
            Location::Vacant { .. } => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.chains
            .iter()
            .flatten()
            .map(|s| (s.name.as_str(), &s.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.chains
            .iter_mut()
            .flatten()
            .map(|s| (s.name.as_str(), &mut s.value))
    }

    /// Names for which `keep` holds, sorted bytewise.
    pub fn sorted_names(&self, mut keep: impl FnMut(&T) -> bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .iter()
            .filter(|(_, v)| keep(v))
            .map(|(n, _)| n.to_owned())
            .collect();
        names.sort_unstable();
        names
    }

    /// Drop every entry for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &T) -> bool) {
        for chain in &mut self.chains {
            chain.retain(|s| keep(&s.name, &s.value));
        }
        self.len = self.chains.iter().map(Vec::len).sum();
    }

    pub fn clear(&mut self) {
        for chain in &mut self.chains {
            chain.clear();
        }
        self.len = 0;
    }
}
