use crate::core::Platform;

pub fn sanitize_filename(filename: &str) -> String {
    // Remove or replace characters that are invalid in filenames
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Name for a downloaded file as it lands in the user's browser.
pub fn attachment_filename(platform: Platform, video_id: &str, variant: &str) -> String {
    format!(
        "{}_{}_{}.mp4",
        platform.as_str(),
        sanitize_filename(video_id),
        sanitize_filename(variant)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("hello/world"), "hello-world");
        assert_eq!(sanitize_filename("test<>file"), "test__file");
        assert_eq!(sanitize_filename("normal_file.mp4"), "normal_file.mp4");
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename(Platform::Tiktok, "7123456", "no_watermark"),
            "tiktok_7123456_no_watermark.mp4"
        );
        assert_eq!(
            attachment_filename(Platform::Facebook, "98/76", "hd"),
            "facebook_98-76_hd.mp4"
        );
    }
}
