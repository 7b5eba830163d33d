//! The phrase dictionary shared in shape, but never in state, by encoder and decoder.
use crate::{Code, LzwError, Result, FIRST_DYNAMIC, MAX_ENTRIES, MAX_PHRASE, SENTINEL};

/// A table of up to 4096 phrases, addressed by their code.
///
/// Codes `0..256` always hold the single byte phrases of their own value. Learned phrases are
/// appended at the cursor. Every learned phrase is some existing phrase extended by one byte, so
/// each entry is stored as a link to its prefix code. Lookup of an extension goes through a
/// successor tree keyed by `(prefix, byte)`.
///
/// When the slot of the last code has been handed out the dictionary drops all learned phrases
/// and the cursor returns to `256`. That last slot is the sentinel code, so the sentinel is never
/// observable as a live entry.
pub struct Dictionary {
    /// The link of every allocated code.
    links: Vec<Link>,
    /// Successors of every allocated code.
    tree: Tree,
    /// The number of resets since initialization.
    generation: u64,
}

#[derive(Clone, Copy)]
struct Link {
    prefix: Code,
    byte: u8,
    first: u8,
    depth: u8,
}

/// One tree node for each code.
/// To avoid using too much memory we keep nodes with few successors in optimized form. This form
/// doesn't offer lookup by indexing but instead does a linear search.
#[derive(Default)]
struct Tree {
    simples: Vec<Simple>,
    complex: Vec<Full>,
    keys: Vec<Successors>,
}

#[derive(Clone, Copy)]
enum Successors {
    Leaf,
    Simple(u16),
    Full(u16),
}

const SHORT: usize = 16;

#[derive(Clone, Copy)]
struct Simple {
    codes: [Code; SHORT],
    bytes: [u8; SHORT],
    count: u8,
}

/// Dense successors, the sentinel marks a missing continuation.
#[derive(Clone, Copy)]
struct Full {
    continuation: [Code; 256],
}

impl Dictionary {
    /// Create a dictionary holding only the literal codes.
    pub fn new() -> Self {
        let mut links = Vec::with_capacity(MAX_ENTRIES);
        links.extend((0..=255u8).map(Link::literal));
        let mut tree = Tree::default();
        tree.reset();
        Dictionary {
            links,
            tree,
            generation: 0,
        }
    }

    /// The code the next learned phrase will be assigned to.
    pub fn cursor(&self) -> Code {
        self.links.len() as Code
    }

    /// How many times the learned phrases have been discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if `code` currently refers to a phrase.
    pub fn contains(&self, code: Code) -> bool {
        usize::from(code) < self.links.len()
    }

    /// Find the code whose phrase is exactly `sequence`.
    pub fn find(&self, sequence: &[u8]) -> Option<Code> {
        let (&first, rest) = sequence.split_first()?;
        rest.iter()
            .try_fold(Code::from(first), |code, &byte| self.tree.get(code, byte))
    }

    /// Find the code of the phrase of `prefix` extended by `byte`.
    pub fn find_extension(&self, prefix: Code, byte: u8) -> Option<Code> {
        self.tree.get(prefix, byte)
    }

    /// Learn the phrase of `prefix` extended by `byte`, returning its new code.
    ///
    /// The phrase must not be longer than `MAX_PHRASE` and must not be present already. On error
    /// the dictionary is left untouched. If this insertion hands out the last slot, all learned
    /// phrases are discarded before returning.
    pub fn insert(&mut self, prefix: Code, byte: u8) -> Result<Code> {
        let cursor = self.cursor();
        let link = match self.links.get(usize::from(prefix)) {
            Some(link) => *link,
            None => return Err(LzwError::CorruptStream { code: prefix, cursor }),
        };

        let len = usize::from(link.depth) + 1;
        if len > MAX_PHRASE {
            return Err(LzwError::PhraseTooLong { len });
        }

        if let Some(code) = self.tree.get(prefix, byte) {
            return Err(LzwError::CorruptStream { code, cursor });
        }

        self.links.push(Link {
            prefix,
            byte,
            first: link.first,
            depth: len as u8,
        });
        self.tree.append(prefix, byte, cursor);

        if self.links.len() >= MAX_ENTRIES {
            self.reset();
        }

        Ok(cursor)
    }

    /// Learn a complete phrase whose prefix is already known.
    ///
    /// This is the sequence based form of [`insert`](#method.insert). An empty phrase or one
    /// with an unknown prefix is reported as corrupt at the cursor.
    pub fn insert_phrase(&mut self, sequence: &[u8]) -> Result<Code> {
        if sequence.len() > MAX_PHRASE {
            return Err(LzwError::PhraseTooLong {
                len: sequence.len(),
            });
        }

        let cursor = self.cursor();
        let (&byte, head) = match sequence.split_last() {
            Some(split) => split,
            None => return Err(LzwError::CorruptStream { code: cursor, cursor }),
        };

        match self.find(head) {
            Some(prefix) => self.insert(prefix, byte),
            None => Err(LzwError::CorruptStream { code: cursor, cursor }),
        }
    }

    /// The length of the phrase of `code`, if it is present.
    pub fn phrase_len(&self, code: Code) -> Option<usize> {
        self.links
            .get(usize::from(code))
            .map(|link| usize::from(link.depth))
    }

    /// The first byte of the phrase of `code`, if it is present.
    pub fn first_byte(&self, code: Code) -> Option<u8> {
        self.links.get(usize::from(code)).map(|link| link.first)
    }

    /// Write the phrase of `code` to the start of `out` and return its length.
    ///
    /// Returns `None` if the code is not present or `out` is too short.
    pub fn reconstruct(&self, code: Code, out: &mut [u8]) -> Option<usize> {
        let len = self.phrase_len(code)?;
        let out = out.get_mut(..len)?;
        let mut code = code;
        for slot in out.iter_mut().rev() {
            let link = self.links[usize::from(code)];
            *slot = link.byte;
            code = link.prefix;
        }
        Some(len)
    }

    /// The phrase of `code` as an owned vector.
    pub fn phrase(&self, code: Code) -> Option<Vec<u8>> {
        let mut buffer = [0; MAX_PHRASE];
        let len = self.reconstruct(code, &mut buffer)?;
        Some(buffer[..len].to_vec())
    }

    /// Discard every learned phrase.
    pub fn reset(&mut self) {
        self.links.truncate(usize::from(FIRST_DYNAMIC));
        self.tree.reset();
        self.generation += 1;
        log::debug!("dictionary reset, generation {}", self.generation);
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Dictionary::new()
    }
}

impl Link {
    fn literal(byte: u8) -> Self {
        Link {
            prefix: Code::from(byte),
            byte,
            first: byte,
            depth: 1,
        }
    }
}

impl Tree {
    fn reset(&mut self) {
        self.simples.clear();
        self.complex.clear();
        self.keys.clear();
        self.keys
            .resize(usize::from(FIRST_DYNAMIC), Successors::Leaf);
    }

    fn get(&self, code: Code, byte: u8) -> Option<Code> {
        match *self.keys.get(usize::from(code))? {
            Successors::Leaf => None,
            Successors::Simple(idx) => {
                let nexts = &self.simples[usize::from(idx)];
                nexts.bytes[..usize::from(nexts.count)]
                    .iter()
                    .position(|&b| b == byte)
                    .map(|pos| nexts.codes[pos])
            }
            Successors::Full(idx) => {
                let next = self.complex[usize::from(idx)].continuation[usize::from(byte)];
                if next == SENTINEL {
                    None
                } else {
                    Some(next)
                }
            }
        }
    }

    fn append(&mut self, code: Code, byte: u8, next: Code) {
        debug_assert_eq!(usize::from(next), self.keys.len());
        let key = self.keys[usize::from(code)];
        match key {
            Successors::Leaf => {
                let mut simple = Simple::default();
                simple.codes[0] = next;
                simple.bytes[0] = byte;
                simple.count = 1;
                self.keys[usize::from(code)] = Successors::Simple(self.simples.len() as u16);
                self.simples.push(simple);
            }
            Successors::Simple(idx) if usize::from(self.simples[usize::from(idx)].count) < SHORT => {
                let nexts = &mut self.simples[usize::from(idx)];
                let nidx = usize::from(nexts.count);
                nexts.bytes[nidx] = byte;
                nexts.codes[nidx] = next;
                nexts.count += 1;
            }
            Successors::Simple(idx) => {
                let simple = &self.simples[usize::from(idx)];
                let mut full = Full {
                    continuation: [SENTINEL; 256],
                };
                for (&pch, &pcont) in simple.bytes.iter().zip(simple.codes.iter()) {
                    full.continuation[usize::from(pch)] = pcont;
                }
                full.continuation[usize::from(byte)] = next;
                self.keys[usize::from(code)] = Successors::Full(self.complex.len() as u16);
                self.complex.push(full);
            }
            Successors::Full(idx) => {
                self.complex[usize::from(idx)].continuation[usize::from(byte)] = next;
            }
        }
        self.keys.push(Successors::Leaf);
    }
}

impl Default for Simple {
    fn default() -> Self {
        Simple {
            codes: [0; SHORT],
            bytes: [0; SHORT],
            count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dictionary;
    use crate::{LzwError, FIRST_DYNAMIC, MAX_PHRASE, SENTINEL};

    #[test]
    fn literals_are_initialized() {
        let dict = Dictionary::new();
        assert_eq!(dict.cursor(), FIRST_DYNAMIC);
        for byte in 0..=255u8 {
            assert_eq!(dict.find(&[byte]), Some(u16::from(byte)));
            assert_eq!(dict.phrase(u16::from(byte)).unwrap(), [byte]);
        }
        assert_eq!(dict.find(&[]), None);
        assert_eq!(dict.find(b"AB"), None);
        assert!(!dict.contains(FIRST_DYNAMIC));
    }

    #[test]
    fn learned_phrases_are_found() {
        let mut dict = Dictionary::new();
        let ab = dict.insert(u16::from(b'A'), b'B').unwrap();
        assert_eq!(ab, 256);
        let abc = dict.insert_phrase(b"ABC").unwrap();
        assert_eq!(abc, 257);
        assert_eq!(dict.cursor(), 258);

        assert_eq!(dict.find(b"AB"), Some(ab));
        assert_eq!(dict.find(b"ABC"), Some(abc));
        assert_eq!(dict.find(b"ABD"), None);
        assert_eq!(dict.find_extension(ab, b'C'), Some(abc));
        assert_eq!(dict.phrase(abc).unwrap(), b"ABC");
        assert_eq!(dict.phrase_len(abc), Some(3));
        assert_eq!(dict.first_byte(abc), Some(b'A'));
    }

    #[test]
    fn many_successors_stay_reachable() {
        let mut dict = Dictionary::new();
        for byte in 0..=255u8 {
            dict.insert(u16::from(b'x'), byte).unwrap();
        }
        for byte in 0..=255u8 {
            let code = dict.find(&[b'x', byte]).unwrap();
            assert_eq!(code, 256 + u16::from(byte));
        }
    }

    #[test]
    fn overlong_phrase_rejected() {
        let mut dict = Dictionary::new();
        let mut code = u16::from(b'a');
        for _ in 1..MAX_PHRASE {
            code = dict.insert(code, b'a').unwrap();
        }
        assert_eq!(dict.phrase_len(code), Some(MAX_PHRASE));

        let cursor = dict.cursor();
        match dict.insert(code, b'a') {
            Err(LzwError::PhraseTooLong { len }) => assert_eq!(len, MAX_PHRASE + 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(dict.cursor(), cursor);

        let long = vec![b'z'; MAX_PHRASE + 1];
        assert!(matches!(
            dict.insert_phrase(&long),
            Err(LzwError::PhraseTooLong { .. })
        ));
    }

    #[test]
    fn duplicates_and_unknown_prefixes_rejected() {
        let mut dict = Dictionary::new();
        dict.insert_phrase(b"ab").unwrap();
        assert!(matches!(
            dict.insert_phrase(b"ab"),
            Err(LzwError::CorruptStream { code: 256, .. })
        ));
        assert!(matches!(
            dict.insert_phrase(b"xyz"),
            Err(LzwError::CorruptStream { code: 257, cursor: 257 })
        ));
        assert!(matches!(
            dict.insert_phrase(b""),
            Err(LzwError::CorruptStream { code: 257, cursor: 257 })
        ));
        assert!(dict.insert(300, b'a').is_err());
        assert_eq!(dict.cursor(), 257);
    }

    #[test]
    fn last_slot_resets() {
        let mut dict = Dictionary::new();
        let mut last = 0;
        for i in 0..(SENTINEL - FIRST_DYNAMIC + 1) {
            last = dict.insert(i / 256, (i % 256) as u8).unwrap();
            if last < SENTINEL {
                assert_eq!(dict.cursor(), last + 1);
                assert_eq!(dict.generation(), 0);
            }
        }

        assert_eq!(last, SENTINEL);
        assert_eq!(dict.cursor(), FIRST_DYNAMIC);
        assert_eq!(dict.generation(), 1);
        assert!(!dict.contains(SENTINEL));
        assert_eq!(dict.find(&[0, 0]), None);
        assert_eq!(dict.find(&[200]), Some(200));
        assert_eq!(dict.insert(0, 0).unwrap(), FIRST_DYNAMIC);
    }
}
