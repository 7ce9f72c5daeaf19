// SPDX-License-Identifier: GPL-3.0-or-later

use blake2::{Blake2s256, Digest};

/// Digest primitive over the staged image.
///
/// The digest is reported to the host as evidence of exactly what
/// will execute. The primitive cannot fail under correct usage.
pub trait ImageDigest {
    fn digest(&self, image: &[u8]) -> [u8; 32];
}

/// BLAKE2s-256.
pub struct Blake2s;

impl ImageDigest for Blake2s {
    fn digest(&self, image: &[u8]) -> [u8; 32] {
        Blake2s256::digest(image).into()
    }
}
