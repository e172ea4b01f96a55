// src/utils/html.rs

use std::collections::HashSet;
use std::sync::LazyLock;

/// Whitelist cleaner for the inline SVG visuals that arrive with upstream
/// questions. Everything outside the listed elements/attributes is
/// stripped, so a compromised content feed cannot smuggle script into the
/// client. Text content of stripped elements is preserved.
static SVG_CLEANER: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let tags: HashSet<&str> = HashSet::from([
        "svg", "g", "defs", "title", "desc", "path", "rect", "circle", "ellipse", "line",
        "polyline", "polygon", "text", "tspan",
    ]);
    let attributes: HashSet<&str> = HashSet::from([
        "d", "x", "y", "x1", "y1", "x2", "y2", "cx", "cy", "r", "rx", "ry", "width", "height",
        "viewbox", "points", "transform", "fill", "stroke", "stroke-width", "stroke-dasharray",
        "font-size", "font-family", "text-anchor", "opacity", "xmlns",
    ]);

    let mut builder = ammonia::Builder::default();
    builder.tags(tags).generic_attributes(attributes);
    builder
});

pub fn clean_svg(input: &str) -> String {
    SVG_CLEANER.clean(input).to_string()
}
