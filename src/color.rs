// Color tokens are opaque strings in the config; renderers only need RGB
// when they rasterize. Supports #rgb, #rrggbb and a handful of names.

use image::Rgb;

pub fn parse_color(token: &str) -> Option<Rgb<u8>> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix('#') {
        return parse_hex(hex);
    }
    let rgb = match token.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "orange" => [255, 165, 0],
        "gold" => [255, 215, 0],
        "yellow" => [255, 255, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "blue" => [0, 0, 255],
        "purple" => [128, 0, 128],
        "magenta" | "fuchsia" => [255, 0, 255],
        "pink" => [255, 192, 203],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17; // 0xF -> 0xFF
            }
            Some(Rgb(out))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
        }
        _ => None,
    }
}

/// Pack as 0x00RRGGBB (the window's pixel format).
#[inline]
pub fn pack(rgb: Rgb<u8>) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}
