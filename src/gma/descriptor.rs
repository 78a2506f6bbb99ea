use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

use super::structures::{AddonMetadata, DESCRIPTOR_FILE_NAME};

/// Render the `addon.txt` descriptor.
///
/// Values are substituted verbatim; a quote inside a value yields a
/// descriptor the game cannot parse.
pub fn render_descriptor(metadata: &AddonMetadata) -> String {
    format!(
        "\"AddonInfo\"\r\n{{\r\n\
         \t\"name\" \"{}\"\r\n\
         \t\"author_name\" \"{}\"\r\n\
         \t\"info\" \"{}\"\r\n}}",
        metadata.name, metadata.author, metadata.description
    )
}

/// Write the descriptor into `addon_dir`, replacing any existing one
pub async fn write_descriptor(addon_dir: &Path, metadata: &AddonMetadata) -> Result<PathBuf> {
    let path = addon_dir.join(DESCRIPTOR_FILE_NAME);

    let mut file = fs::File::create(&path).await?;
    file.write_all(render_descriptor(metadata).as_bytes()).await?;
    file.flush().await?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_template() {
        let meta = AddonMetadata {
            name: "Test".to_string(),
            description: "Desc".to_string(),
            author: "Me".to_string(),
        };
        assert_eq!(
            render_descriptor(&meta),
            "\"AddonInfo\"\r\n{\r\n\t\"name\" \"Test\"\r\n\t\"author_name\" \"Me\"\r\n\t\"info\" \"Desc\"\r\n}"
        );
    }

    #[test]
    fn quotes_are_not_escaped() {
        let meta = AddonMetadata {
            name: "a \"quoted\" name".to_string(),
            ..Default::default()
        };
        assert!(render_descriptor(&meta).contains("\"name\" \"a \"quoted\" name\""));
    }
}
