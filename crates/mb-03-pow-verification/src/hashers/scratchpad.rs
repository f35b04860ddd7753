//! Memory-hard header hash built from SHA-256.
//!
//! A scratchpad is filled by chaining SHA-256 from the header digest. The
//! state then walks the scratchpad at data-dependent offsets, XORing each
//! visited line into itself and rehashing.

use shared_crypto::sha256;
use shared_types::Hash;

use super::HeaderHasher;

const LINE: usize = 32;

/// Scratchpad hash with configurable memory and iteration count.
#[derive(Debug, Clone)]
pub struct ScratchpadHasher {
    memory_bytes: usize,
    iterations: u32,
}

impl ScratchpadHasher {
    /// Create a hasher using `memory_kib` KiB and `iterations` mixing rounds.
    pub fn new(memory_kib: usize, iterations: u32) -> Self {
        Self {
            memory_bytes: memory_kib.max(1) * 1024,
            iterations,
        }
    }

    fn lines(&self) -> usize {
        self.memory_bytes / LINE
    }
}

impl Default for ScratchpadHasher {
    fn default() -> Self {
        Self::new(512, 1024)
    }
}

impl HeaderHasher for ScratchpadHasher {
    fn hash(&self, header: &[u8]) -> Hash {
        let lines = self.lines();
        let mut pad = vec![0u8; lines * LINE];

        let mut state = sha256(header);
        for line in pad.chunks_exact_mut(LINE) {
            state = sha256(&state);
            line.copy_from_slice(&state);
        }

        for _ in 0..self.iterations {
            let index = u32::from_le_bytes([state[0], state[1], state[2], state[3]]) as usize % lines;
            let line = &pad[index * LINE..(index + 1) * LINE];
            for (s, p) in state.iter_mut().zip(line) {
                *s ^= p;
            }
            state = sha256(&state);
        }

        state
    }

    fn name(&self) -> &'static str {
        "scratchpad-sha256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let hasher = ScratchpadHasher::new(4, 16);
        assert_eq!(hasher.hash(b"header"), hasher.hash(b"header"));
    }

    #[test]
    fn test_parameters_change_output() {
        let a = ScratchpadHasher::new(4, 16).hash(b"header");
        let b = ScratchpadHasher::new(4, 17).hash(b"header");
        let c = ScratchpadHasher::new(8, 16).hash(b"header");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_input_changes_output() {
        let hasher = ScratchpadHasher::new(4, 16);
        assert_ne!(hasher.hash(b"header-1"), hasher.hash(b"header-2"));
    }
}
