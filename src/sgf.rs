//! Loading and saving games.
//!
//! Every loader parses, keeps the source text on the game and runs
//! post-processing. Input is decoded as UTF-8; invalid sequences are replaced
//! rather than rejected.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::game::Game;
use crate::parser::parse;

/// Parse and post-process SGF text.
pub fn from_str(text: &str) -> Result<Game> {
    let mut game = parse(text)?;
    game.set_original_sgf(text);
    game.post_process();
    Ok(game)
}

/// Read a game from a file.
pub fn from_path(path: impl AsRef<Path>) -> Result<Game> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "reading game");
    from_str(&decode(&bytes, &path.display().to_string()))
}

/// Read a game from any byte stream.
pub fn from_reader(mut reader: impl Read) -> Result<Game> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    from_str(&decode(&bytes, "stream"))
}

fn decode(bytes: &[u8], source: &str) -> String {
    let text = String::from_utf8_lossy(bytes);
    if let std::borrow::Cow::Owned(_) = text {
        warn!(source, "input is not valid UTF-8; invalid bytes were replaced");
    }
    text.into_owned()
}

/// Write the game's generated SGF to `path`, replacing it atomically.
pub fn write_to_path(game: &Game, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = game.generated_sgf();
    let tmp_path = temp_path(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    debug!(path = %path.display(), bytes = text.len(), "wrote game");
    Ok(())
}

/// Like [`write_to_path`], first copying an existing file at `path` to
/// `<path>.orig.<unix millis>`. Returns the backup path if one was made.
pub fn write_to_path_with_backup(game: &Game, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    let backup = if path.exists() {
        let backup = backup_path(path, Utc::now().timestamp_millis());
        fs::copy(path, &backup)?;
        debug!(from = %path.display(), to = %backup.display(), "kept original");
        Some(backup)
    } else {
        None
    };
    write_to_path(game, path)?;
    Ok(backup)
}

fn backup_path(path: &Path, millis: i64) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".orig.{millis}"));
    PathBuf::from(name)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".tmp{:08x}", fastrand::u32(..)));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_post_processes() {
        let game = from_str("(;GM[1]FF[4];B[pd];W[dp];B[pc])").unwrap();
        assert_eq!(game.move_count(), 3);
        assert_eq!(game.original_sgf(), Some("(;GM[1]FF[4];B[pd];W[dp];B[pc])"));
    }

    #[test]
    fn test_from_reader() {
        let game = from_reader("(;GM[1];B[aa])".as_bytes()).unwrap();
        assert_eq!(game.move_count(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let bytes = b"(;GM[1]PB[\xff\xfe];B[aa])";
        let game = from_reader(&bytes[..]).unwrap();
        assert_eq!(game.property("PB").as_deref(), Some("\u{fffd}\u{fffd}"));
    }

    #[test]
    fn test_backup_path_format() {
        let backup = backup_path(Path::new("/tmp/game.sgf"), 1_700_000_000_123);
        assert_eq!(backup, PathBuf::from("/tmp/game.sgf.orig.1700000000123"));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("dir/game.sgf"));
        assert_eq!(tmp.parent(), Some(Path::new("dir")));
        assert!(tmp.to_string_lossy().starts_with("dir/game.sgf.tmp"));
    }
}
