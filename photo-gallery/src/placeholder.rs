//! Generated stand-in images for collections without photos

use crate::models::ImageSource;
use base64::Engine;

pub const PLACEHOLDER_WIDTH: u32 = 1200;
pub const PLACEHOLDER_HEIGHT: u32 = 800;

const BACKGROUNDS: [&str; 5] = ["#e6ebe9", "#f6e7e1", "#eef6fb", "#f3eefc", "#fff4e6"];

/// SVG card reading "Photo N", encoded as a base64 `data:` URL
pub fn placeholder_data_url(index: usize, width: u32, height: u32) -> String {
    let background = BACKGROUNDS[index % BACKGROUNDS.len()];
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="{bg}" rx="24" ry="24"/><text x="50%" y="50%" font-size="48" font-family="Poppins, Arial, sans-serif" fill="#333" dominant-baseline="middle" text-anchor="middle">Photo {n}</text></svg>"##,
        w = width,
        h = height,
        bg = background,
        n = index + 1
    );
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

/// `count` placeholder sources of the default size
pub fn placeholder_sources(count: usize) -> Vec<ImageSource> {
    (0..count)
        .map(|i| ImageSource::new(placeholder_data_url(i, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{decode_data_url, decode_dimensions};

    #[test]
    fn test_placeholder_decodes_with_its_size() {
        let url = placeholder_data_url(2, 640, 480);
        let svg = decode_data_url(&url).unwrap();
        assert_eq!(decode_dimensions(&svg).unwrap(), (640, 480));

        let text = String::from_utf8(svg).unwrap();
        assert!(text.contains("Photo 3"));
        assert!(text.contains("#eef6fb"));
    }

    #[test]
    fn test_placeholder_sources() {
        let sources = placeholder_sources(5);
        assert_eq!(sources.len(), 5);
        assert!(sources.iter().all(|s| s.is_data_url()));
        assert_ne!(sources[0], sources[1]);
    }
}
