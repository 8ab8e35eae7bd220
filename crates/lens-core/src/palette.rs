//! Display colours handed to the rendering collaborator.

/// Series palette; indexes wrap when there are more series than entries.
pub const PALETTE: [&str; 6] = [
    "rgba(54, 162, 235, 1)",
    "rgba(255, 99, 132, 1)",
    "rgba(75, 192, 192, 1)",
    "rgba(255, 206, 86, 1)",
    "rgba(153, 102, 255, 1)",
    "rgba(255, 159, 64, 1)",
];

/// Fixed colour of the aggregated long-tail leaf.
pub const NEUTRAL_COLOR: &str = "rgba(201, 203, 207, 1)";

/// Palette entry for `index`, cycling.
pub fn color_at(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Palette entry for the `index`-th leaf of a breakdown graph.
///
/// Leaves cycle over the palette without its first entry, which belongs to
/// the root node.
pub fn leaf_color_at(index: usize) -> &'static str {
    let leaves = &PALETTE[1..];
    leaves[index % leaves.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_at_cycles() {
        assert_eq!(color_at(0), PALETTE[0]);
        assert_eq!(color_at(6), PALETTE[0]);
        assert_eq!(color_at(7), PALETTE[1]);
    }

    #[test]
    fn test_leaf_color_skips_root_entry() {
        assert_eq!(leaf_color_at(0), PALETTE[1]);
        assert_eq!(leaf_color_at(4), PALETTE[5]);
        assert_eq!(leaf_color_at(5), PALETTE[1]);
    }

    #[test]
    fn test_neutral_not_in_palette() {
        assert!(!PALETTE.contains(&NEUTRAL_COLOR));
    }
}
