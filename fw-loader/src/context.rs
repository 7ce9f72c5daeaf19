// SPDX-License-Identifier: GPL-3.0-or-later

/// Bookkeeping for one application load.
///
/// Created zero-valued at start and only mutated while a load is in
/// progress. Once control is transferred to the staged image the
/// context is meaningless, since the staging RAM is about to be
/// executed.
#[derive(Debug, Clone)]
pub struct Context {
    /// Bytes still to stage.
    pub left: u32,
    /// Digest of the fully staged image.
    pub digest: [u8; 32],
    /// Write position within the staging window. Advances
    /// monotonically, never retreats.
    pub load_cursor: usize,
    /// Accepted application size.
    pub app_size: u32,
}

impl Context {
    pub const fn new() -> Self {
        Self {
            left: 0,
            digest: [0; 32],
            load_cursor: 0,
            app_size: 0,
        }
    }

    /// Arm the context for a freshly accepted application size.
    pub(crate) fn begin_load(&mut self, size: u32) {
        self.app_size = size;
        self.left = size;
        self.load_cursor = 0;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
