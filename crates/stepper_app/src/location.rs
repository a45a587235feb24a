use url::Url;

/// The address bar: the one external, shared copy of the wizard state.
pub trait Location {
    fn current(&self) -> &Url;
    /// Swaps the current entry in place: no new history entry, no reload.
    fn replace(&mut self, url: Url);
    /// A user navigation (typed URL, followed link) that adds an entry.
    fn push(&mut self, url: Url);
    /// Steps back one entry; `false` when already at the first one.
    fn back(&mut self) -> bool;
    fn forward(&mut self) -> bool;
    fn history_len(&self) -> usize;
}

/// In-memory session history.
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    entries: Vec<Url>,
    index: usize,
}

impl MemoryLocation {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}

impl Location for MemoryLocation {
    fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    fn replace(&mut self, url: Url) {
        self.entries[self.index] = url;
    }

    fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    fn history_len(&self) -> usize {
        self.entries.len()
    }
}
