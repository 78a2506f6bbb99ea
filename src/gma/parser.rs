//! Header and file table parsing.
//!
//! ## Parsing Strategy
//!
//! GMAD archives are read front to back in one pass:
//! 1. Check the `GMAD` signature and skip the fixed reserved region
//! 2. Read the addon name, description and author strings
//! 3. Read file table records until the zero index terminator
//!
//! After the table the cursor sits on the first byte of the first entry's
//! content, which is where [`GmaExtractor`](super::GmaExtractor) picks up.

use log::debug;

use crate::error::{GmaError, Result};
use crate::io::ByteSource;

use super::cursor::ArchiveCursor;
use super::structures::*;

/// Validate the signature and read the addon metadata.
///
/// # Errors
///
/// Returns [`GmaError::InvalidFormat`] when the first four bytes are not
/// `GMAD` (including streams shorter than that), without reading further.
pub async fn parse_header<S: ByteSource>(cursor: &mut ArchiveCursor<S>) -> Result<AddonMetadata> {
    let mut sig = [0u8; 4];
    let mut filled = 0;
    while filled < sig.len() {
        let n = cursor.read(&mut sig[filled..]).await?;
        if n == 0 {
            return Err(GmaError::InvalidFormat(
                "file is too short to hold a signature".to_string(),
            ));
        }
        filled += n;
    }

    if &sig != SIGNATURE {
        return Err(GmaError::InvalidFormat(format!(
            "bad signature {:02X?}, expected \"GMAD\"",
            sig
        )));
    }

    cursor.skip(HEADER_RESERVED_LEN, "header").await?;

    let name = cursor.read_cstring("addon name").await?;
    let description = cursor.read_cstring("addon description").await?;
    let author = cursor.read_cstring("addon author").await?;

    cursor.skip(ADDON_VERSION_LEN, "addon version").await?;

    debug!("GMAD header: name={name:?} author={author:?}");

    Ok(AddonMetadata {
        name,
        description,
        author,
    })
}

/// Read file table records up to and including the terminator.
///
/// # Errors
///
/// Returns [`GmaError::EmptyTable`] when the terminator comes first.
pub async fn read_file_table<S: ByteSource>(
    cursor: &mut ArchiveCursor<S>,
) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    loop {
        let index = cursor.read_u32_le("file index").await?;
        if index == 0 {
            break;
        }

        let path = cursor.read_cstring("file path").await?;

        let mut trailer = [0u8; EntryTrailer::SIZE];
        cursor.read_exact(&mut trailer, "file table entry").await?;
        let trailer = EntryTrailer::from_bytes(&trailer)?;

        entries.push(FileEntry {
            index,
            path,
            size: trailer.size,
        });
    }

    if entries.is_empty() {
        return Err(GmaError::EmptyTable);
    }

    debug!(
        "File table: {} entries, content starts at offset {}",
        entries.len(),
        cursor.position()
    );

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;

    fn header(name: &[u8], desc: &[u8], author: &[u8]) -> Vec<u8> {
        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&[0u8; HEADER_RESERVED_LEN as usize]);
        for s in [name, desc, author] {
            data.extend_from_slice(s);
            data.push(0);
        }
        data.extend_from_slice(&1u32.to_le_bytes());
        data
    }

    fn push_entry(data: &mut Vec<u8>, index: u32, path: &str, size: u32) {
        data.extend_from_slice(&index.to_le_bytes());
        data.extend_from_slice(path.as_bytes());
        data.push(0);
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
    }

    #[tokio::test]
    async fn parses_header_and_table() {
        let mut data = header(b"My Addon", b"Some text", b"someone");
        push_entry(&mut data, 1, "lua/autorun/init.lua", 10);
        push_entry(&mut data, 2, "materials/a.vmt", 3);
        data.extend_from_slice(&0u32.to_le_bytes());
        let table_end = data.len() as u64;
        data.extend_from_slice(b"0123456789abc");

        let mut cursor = ArchiveCursor::new(MemorySource::new(data));
        let meta = parse_header(&mut cursor).await.unwrap();
        assert_eq!(meta.name, "My Addon");
        assert_eq!(meta.description, "Some text");
        assert_eq!(meta.author, "someone");

        let entries = read_file_table(&mut cursor).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "lua/autorun/init.lua");
        assert_eq!(entries[0].size, 10);
        assert_eq!(entries[1].index, 2);
        assert_eq!(cursor.position(), table_end);
    }

    #[tokio::test]
    async fn file_index_is_not_validated() {
        let mut data = header(b"a", b"", b"");
        push_entry(&mut data, 9, "x", 0);
        push_entry(&mut data, 9, "y", 0);
        data.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor = ArchiveCursor::new(MemorySource::new(data));
        parse_header(&mut cursor).await.unwrap();
        let entries = read_file_table(&mut cursor).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn rejects_bad_signature() {
        let mut data = header(b"a", b"", b"");
        data[0] = b'P';
        let mut cursor = ArchiveCursor::new(MemorySource::new(data));
        let err = parse_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, GmaError::InvalidFormat(_)));
        assert_eq!(cursor.position(), 4);
    }

    #[tokio::test]
    async fn short_file_is_invalid_format() {
        let mut cursor = ArchiveCursor::new(MemorySource::new(b"GM".to_vec()));
        let err = parse_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, GmaError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn truncated_header_is_truncated() {
        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&[0u8; 10]);
        let mut cursor = ArchiveCursor::new(MemorySource::new(data));
        let err = parse_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, GmaError::Truncated(_)));
    }

    #[tokio::test]
    async fn empty_table() {
        let mut data = header(b"a", b"", b"");
        data.extend_from_slice(&0u32.to_le_bytes());
        let mut cursor = ArchiveCursor::new(MemorySource::new(data));
        parse_header(&mut cursor).await.unwrap();
        let err = read_file_table(&mut cursor).await.unwrap_err();
        assert!(matches!(err, GmaError::EmptyTable));
    }
}
