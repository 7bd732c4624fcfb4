//! Generated stand-in images.
//!
//! While an image waits for its turn, and after it fails, the element shows a
//! small inline SVG sized like the real thing. The SVG is built with maud and
//! shipped as a `data:` URI so it never costs a request.

use maud::html;

const LOADING_FILL: &str = "#f0f0f0";
const ERROR_FILL: &str = "#f6e8e8";
const ERROR_TEXT: &str = "#a05050";

/// Flat filler shown until the real image loads.
pub fn loading_placeholder(width: u32, height: u32) -> String {
    let svg = html! {
        svg xmlns="http://www.w3.org/2000/svg"
            width=(width) height=(height)
            viewBox={ "0 0 " (width) " " (height) } {
            rect width="100%" height="100%" fill=(LOADING_FILL) {}
        }
    };
    data_uri(&svg.into_string())
}

/// Stand-in shown after an image failed to load.
pub fn error_placeholder(width: u32, height: u32) -> String {
    let font_size = (width.min(height) / 12).max(10);
    let svg = html! {
        svg xmlns="http://www.w3.org/2000/svg"
            width=(width) height=(height)
            viewBox={ "0 0 " (width) " " (height) } {
            rect width="100%" height="100%" fill=(ERROR_FILL) {}
            text x="50%" y="50%" text-anchor="middle" dominant-baseline="middle"
                font-family="sans-serif" font-size=(font_size) fill=(ERROR_TEXT) {
                "Image unavailable"
            }
        }
    };
    data_uri(&svg.into_string())
}

fn data_uri(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len() + 32);
    out.push_str("data:image/svg+xml,");
    for ch in svg.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '"' => out.push_str("%22"),
            ' ' => out.push_str("%20"),
            '\n' | '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_placeholder_is_svg_data_uri() {
        let uri = loading_placeholder(400, 300);
        assert!(uri.starts_with("data:image/svg+xml,%3Csvg"));
        assert!(uri.contains("width=%22400%22"));
        assert!(uri.contains("height=%22300%22"));
    }

    #[test]
    fn data_uri_escapes_reserved_characters() {
        let uri = loading_placeholder(10, 10);
        let body = uri.trim_start_matches("data:image/svg+xml,");
        assert!(!body.contains('<'));
        assert!(!body.contains('#'));
        assert!(!body.contains('"'));
        assert!(!body.contains(' '));
    }

    #[test]
    fn error_placeholder_has_message() {
        let uri = error_placeholder(200, 100);
        assert!(uri.contains("Image%20unavailable"));
    }

    #[test]
    fn error_font_size_has_floor() {
        let uri = error_placeholder(20, 20);
        assert!(uri.contains("font-size=%2210%22"));
    }
}
