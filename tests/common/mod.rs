#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

/// Builds GMAD archives in memory for tests
pub struct GmaBuilder {
    name: Vec<u8>,
    description: Vec<u8>,
    author: Vec<u8>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    truncate_by: usize,
}

impl GmaBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            description: b"A test addon".to_vec(),
            author: b"tester".to_vec(),
            entries: Vec::new(),
            truncate_by: 0,
        }
    }

    /// Name given as raw Windows-1252 bytes
    pub fn raw_name(mut self, name: &[u8]) -> Self {
        self.name = name.to_vec();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.as_bytes().to_vec();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.as_bytes().to_vec();
        self
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.entries
            .push((path.as_bytes().to_vec(), content.to_vec()));
        self
    }

    /// Drop this many bytes from the end of the finished archive
    pub fn truncate_by(mut self, bytes: usize) -> Self {
        self.truncate_by = bytes;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GMAD");
        out.write_u8(3).unwrap(); // format version
        out.write_u64::<LittleEndian>(76561197960287930).unwrap(); // author id
        out.write_u64::<LittleEndian>(1_700_000_000).unwrap(); // timestamp
        out.write_u8(0).unwrap(); // empty required-content list

        for s in [&self.name, &self.description, &self.author] {
            out.extend_from_slice(s);
            out.write_u8(0).unwrap();
        }
        out.write_i32::<LittleEndian>(1).unwrap(); // addon version

        for (i, (path, content)) in self.entries.iter().enumerate() {
            out.write_u32::<LittleEndian>(i as u32 + 1).unwrap();
            out.extend_from_slice(path);
            out.write_u8(0).unwrap();
            out.write_u32::<LittleEndian>(content.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap(); // high half of the 64-bit size
            out.write_u32::<LittleEndian>(0xDEADBEEF).unwrap(); // crc
        }
        out.write_u32::<LittleEndian>(0).unwrap();

        for (_, content) in &self.entries {
            out.extend_from_slice(content);
        }

        out.truncate(out.len() - self.truncate_by.min(out.len()));
        out
    }
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(0x6d61_6421);
    (0..len).map(|_| rng.u8(..)).collect()
}
