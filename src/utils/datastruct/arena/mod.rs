/// Generational slot arena.
/// Freed slots are recycled through a free list; a stale `Slot` handle
/// never resolves to the value that reused its index.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    pool: Vec<Entry<T>>,
    free_list: Vec<usize>,
    live: usize,
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Vacant {
        before_gen_id: u32,
    },
    Occupied {
        value: T,
        gen_id: u32,
    },
}

/// Handle into an `Arena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    idx: usize,
    gen_id: u32,
}

impl Slot {
    fn new(idx: usize, gen_id: u32) -> Self {
        Self { idx, gen_id }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.idx
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            pool: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    pub fn alloc(&mut self, value: T) -> Slot {
        self.live += 1;
        if let Some(free_idx) = self.free_list.pop() {
            let entry = &mut self.pool[free_idx];
            let gen_id = match entry {
                Entry::Vacant { before_gen_id } => before_gen_id.wrapping_add(1),
                // free list only ever holds vacant indices
                Entry::Occupied { gen_id, .. } => gen_id.wrapping_add(1),
            };
            *entry = Entry::Occupied { value, gen_id };
            Slot::new(free_idx, gen_id)
        } else {
            self.pool.push(Entry::Occupied { value, gen_id: 0 });
            Slot::new(self.pool.len() - 1, 0)
        }
    }

    /// Free a slot and hand back its value.
    /// Stale or already freed slots are ignored.
    pub fn dealloc(&mut self, slot: Slot) -> Option<T> {
        let entry = self.pool.get_mut(slot.index())?;
        match entry {
            Entry::Occupied { gen_id, .. } if *gen_id == slot.gen_id => {
                let before_gen_id = *gen_id;
                let old = std::mem::replace(entry, Entry::Vacant { before_gen_id });
                self.free_list.push(slot.index());
                self.live -= 1;
                match old {
                    Entry::Occupied { value, .. } => Some(value),
                    Entry::Vacant { .. } => None,
                }
            }
            _ => None,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        match self.pool.get(slot.index())? {
            Entry::Occupied { value, gen_id } if *gen_id == slot.gen_id => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        match self.pool.get_mut(slot.index())? {
            Entry::Occupied { value, gen_id } if *gen_id == slot.gen_id => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// number of live values
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
