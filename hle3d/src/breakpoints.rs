/// Program counter values the host CPU loop must trap on.
///
/// Only a handful of addresses are ever armed, so lookups are a linear scan.
#[derive(Default, Debug, Clone)]
pub struct Breakpoints(Vec<u32>);

impl Breakpoints {
    /// Arms `address`. Arming an address twice keeps a single entry.
    pub fn add(&mut self, address: u32) {
        if !self.contains(address) {
            self.0.push(address);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn contains(&self, address: u32) -> bool {
        self.0.contains(&address)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
