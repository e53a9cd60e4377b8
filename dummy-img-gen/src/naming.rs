use placeholder_render::ImageFormat;

/// `{prefix}{number}.{ext}`, with `number` zero-padded to `pad_width`
/// digits (0 keeps it plain).
pub fn file_name(prefix: &str, number: u64, pad_width: usize, format: ImageFormat) -> String {
    format!("{prefix}{number:0pad_width$}.{}", format.extension())
}

/// Text drawn on the image for `number`.
pub fn label(number: u64) -> String {
    number.to_string()
}
