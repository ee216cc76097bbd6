//! Thumbnail filename conventions.
//!
//! Published previews are named `actNN_shotNN[_anything].{png,jpg,jpeg}`.
//! The extension match is case-insensitive and the act/shot segments are
//! lowercased on parse.

use crate::db::acts::is_valid_act_code;
use crate::db::shots::is_valid_shot_code;

/// A filename that matched the thumbnail convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailFile {
    pub act_code: String,
    pub shot_code: String,
    /// The original filename, case preserved.
    pub filename: String,
}

pub fn parse_thumbnail_filename(name: &str, extensions: &[String]) -> Option<ThumbnailFile> {
    let (stem, ext) = name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    if !extensions.iter().any(|e| e.to_lowercase() == ext) {
        return None;
    }

    let mut segments = stem.splitn(3, '_');
    let act_code = segments.next()?.to_lowercase();
    let shot_code = segments.next()?.to_lowercase();
    if !is_valid_act_code(&act_code) || !is_valid_shot_code(&shot_code) {
        return None;
    }

    Some(ThumbnailFile {
        act_code,
        shot_code,
        filename: name.to_string(),
    })
}

/// Display name derived from an act code's numeric suffix: `act03` -> "Act 3".
pub fn act_display_name(code: &str) -> String {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(n) => format!("Act {n}"),
        Err(_) => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
    }

    #[test]
    fn test_parses_conventional_names() {
        let parsed = parse_thumbnail_filename("act01_shot02_0040.png", &exts()).unwrap();
        assert_eq!(parsed.act_code, "act01");
        assert_eq!(parsed.shot_code, "shot02");
        assert_eq!(parsed.filename, "act01_shot02_0040.png");

        // The trailing segment is optional.
        assert!(parse_thumbnail_filename("act01_shot02.jpg", &exts()).is_some());
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(parse_thumbnail_filename("act01_shot02.PNG", &exts()).is_some());
        assert!(parse_thumbnail_filename("act01_shot02.Jpeg", &exts()).is_some());
        assert!(parse_thumbnail_filename("act01_shot02.tiff", &exts()).is_none());
    }

    #[test]
    fn test_segments_are_lowercased() {
        let parsed = parse_thumbnail_filename("ACT01_Shot02_v3.png", &exts()).unwrap();
        assert_eq!(parsed.act_code, "act01");
        assert_eq!(parsed.shot_code, "shot02");
        assert_eq!(parsed.filename, "ACT01_Shot02_v3.png");
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(parse_thumbnail_filename("act1_shot02.png", &exts()).is_none());
        assert!(parse_thumbnail_filename("act01_sh02.png", &exts()).is_none());
        assert!(parse_thumbnail_filename("act01.png", &exts()).is_none());
        assert!(parse_thumbnail_filename("act01_shot02", &exts()).is_none());
        assert!(parse_thumbnail_filename("notes.txt", &exts()).is_none());
    }

    #[test]
    fn test_act_display_name_strips_leading_zeros() {
        assert_eq!(act_display_name("act03"), "Act 3");
        assert_eq!(act_display_name("act10"), "Act 10");
        assert_eq!(act_display_name("act00"), "Act 0");
    }
}
