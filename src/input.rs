//! Block map reader.
//!
//! A map is plain text: runs of non-space characters are blocks, spaces are
//! void. A block's size is the length of its run.

use std::fs;
use std::path::Path;

use crate::error::InputError;
use crate::types::Block;

/// Character separating blocks on a map line.
pub const MAP_VOID_CHAR: char = ' ';

/// Read and parse the block map at `path`.
pub fn read_blocks(path: &Path) -> Result<Vec<Block>, InputError> {
    let text = fs::read_to_string(path).map_err(|err| InputError::from_io(path, err))?;
    Ok(parse_blocks(&text))
}

/// Split every line on runs of [`MAP_VOID_CHAR`]; empty runs are skipped.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    text.lines()
        .flat_map(|line| line.split(MAP_VOID_CHAR))
        .filter(|segment| !segment.is_empty())
        .map(|segment| Block::new(segment.chars().count() as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sizes(blocks: &[Block]) -> Vec<u64> {
        blocks.iter().map(Block::units).collect()
    }

    #[test]
    fn parses_runs_per_line() {
        let blocks = parse_blocks("xx xxx\nx    xxxx\n");
        assert_eq!(sizes(&blocks), vec![2, 3, 1, 4]);
    }

    #[test]
    fn skips_leading_spaces_and_blank_lines() {
        let blocks = parse_blocks("   xx\n\n  \nxxx  ");
        assert_eq!(sizes(&blocks), vec![2, 3]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let blocks = parse_blocks("xx x\r\nxxx\r\n");
        assert_eq!(sizes(&blocks), vec![2, 1, 3]);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "xxxx x").expect("write map");
        let blocks = read_blocks(file.path()).expect("read map");
        assert_eq!(sizes(&blocks), vec![4, 1]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = read_blocks(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, InputError::NotFound { .. }));
    }
}
