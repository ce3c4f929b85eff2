//! Sample markdown notes written into the notes directory at startup.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

const MCP_BASICS: &str = "# MCP Basics

Model Context Protocol (MCP) is a standard for connecting AI assistants to external data sources.

## Key Concepts:
- **Tools**: Functions that AI can call to perform actions
- **Resources**: Data sources that AI can read from
- **Prompts**: Templates for AI interactions

## Benefits:
- Standardized interface
- Secure connections
- Real-time data access
";

const LEARNING_GOALS: &str = "# Learning Goals

## Today's Goals:
1. Understand MCP architecture
2. Create tools for task management
3. Implement resource reading
4. Build custom prompts

## Next Steps:
- Connect to external APIs
- Add file system operations
- Implement database connections
";

/// File name and content of each sample note.
pub const SAMPLE_NOTES: [(&str, &str); 2] = [
    ("mcp_basics.md", MCP_BASICS),
    ("learning_goals.md", LEARNING_GOALS),
];

/// Creates `dir` if needed and writes any sample note that is missing.
///
/// Existing files are left untouched. Returns how many notes were written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a note cannot
/// be written.
pub fn seed_sample_notes(dir: &Path) -> io::Result<usize> {
    std::fs::create_dir_all(dir)?;

    let mut written = 0;
    for (file_name, content) in SAMPLE_NOTES {
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                written += 1;
                tracing::debug!(path = %path.display(), "Sample note written");
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_into_new_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("notes");

        assert_eq!(seed_sample_notes(&dir).unwrap(), 2);
        let basics = std::fs::read_to_string(dir.join("mcp_basics.md")).unwrap();
        assert!(basics.starts_with("# MCP Basics"));
    }

    #[test]
    fn never_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("mcp_basics.md"), "my own notes").unwrap();

        assert_eq!(seed_sample_notes(temp.path()).unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("mcp_basics.md")).unwrap(),
            "my own notes"
        );
        assert_eq!(seed_sample_notes(temp.path()).unwrap(), 0);
    }
}
