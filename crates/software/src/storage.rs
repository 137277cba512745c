/// A byte-addressed, EEPROM-like persistent store.
///
/// Writes may be buffered by the implementation; [`commit`](Self::commit) is called once a complete image has been
/// written and must make it durable before returning.
pub trait Storage {
    /// Reads the byte at `addr`.
    fn read_byte(&self, addr: usize) -> u8;

    /// Writes `value` at `addr`.
    fn write_byte(&mut self, addr: usize, value: u8);

    /// Makes every preceding write durable. Stores which write through immediately needn't override this.
    fn commit(&mut self) {}
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn read_byte(&self, addr: usize) -> u8 {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        (**self).write_byte(addr, value)
    }

    fn commit(&mut self) {
        (**self).commit()
    }
}

/// RAM-backed [`Storage`] of `N` bytes.
///
/// Reads past the end return `0xFF` (the erased state of flash and EEPROM) and writes past the end are dropped. Also
/// serves as the write-back mirror for flash-backed stores, which need to erase a whole sector before rewriting it.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
    commits: usize,
}

impl<const N: usize> MemoryStorage<N> {
    /// Constructs a [`MemoryStorage`] in the erased state.
    pub const fn new() -> Self {
        Self {
            bytes: [0xFF; N],
            commits: 0,
        }
    }

    /// Constructs a [`MemoryStorage`] holding a copy of `image`; any remaining bytes are erased.
    pub fn from_image(image: &[u8]) -> Self {
        let mut storage = Self::new();
        let len = image.len().min(N);
        storage.bytes[..len].copy_from_slice(&image[..len]);
        storage
    }

    /// The raw contents of the store.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Mutable access to the raw contents, for loading an image read from elsewhere.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }

    /// Number of times [`Storage::commit`] has been called.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Storage for MemoryStorage<N> {
    fn read_byte(&self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(0xFF)
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        if let Some(byte) = self.bytes.get_mut(addr) {
            *byte = value;
        }
    }

    fn commit(&mut self) {
        self.commits += 1;
    }
}
