use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lithology classification of a well-log layer.
///
/// Declaration order is the display priority: the first material of a layer's
/// set (in this order) decides the layer color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialType {
    Topsoil,
    Sand,
    Gravel,
    Clay,
    Silt,
    Loam,
    Hardpan,
    Boulders,
    Cobbles,
    Sandstone,
    Shale,
    Limestone,
    Granite,
    Basalt,
    Bedrock,
    Volcanic,
    /// No data, or a code outside the enumeration.
    Na,
}

pub type MaterialSet = BTreeSet<MaterialType>;

impl MaterialType {
    pub const ALL: [MaterialType; 17] = [
        MaterialType::Topsoil,
        MaterialType::Sand,
        MaterialType::Gravel,
        MaterialType::Clay,
        MaterialType::Silt,
        MaterialType::Loam,
        MaterialType::Hardpan,
        MaterialType::Boulders,
        MaterialType::Cobbles,
        MaterialType::Sandstone,
        MaterialType::Shale,
        MaterialType::Limestone,
        MaterialType::Granite,
        MaterialType::Basalt,
        MaterialType::Bedrock,
        MaterialType::Volcanic,
        MaterialType::Na,
    ];

    /// Canonical upper-case code.
    pub fn code(self) -> &'static str {
        match self {
            MaterialType::Topsoil => "TOPSOIL",
            MaterialType::Sand => "SAND",
            MaterialType::Gravel => "GRAVEL",
            MaterialType::Clay => "CLAY",
            MaterialType::Silt => "SILT",
            MaterialType::Loam => "LOAM",
            MaterialType::Hardpan => "HARDPAN",
            MaterialType::Boulders => "BOULDERS",
            MaterialType::Cobbles => "COBBLES",
            MaterialType::Sandstone => "SANDSTONE",
            MaterialType::Shale => "SHALE",
            MaterialType::Limestone => "LIMESTONE",
            MaterialType::Granite => "GRANITE",
            MaterialType::Basalt => "BASALT",
            MaterialType::Bedrock => "BEDROCK",
            MaterialType::Volcanic => "VOLCANIC",
            MaterialType::Na => "NA",
        }
    }

    /// Match a single code token. The token is trimmed and upper-cased first.
    ///
    /// Returns `None` for codes outside the enumeration; callers degrade those
    /// to [`MaterialType::Na`].
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        let m = match code.as_str() {
            "ROCK" => MaterialType::Bedrock,
            "SOIL" => MaterialType::Topsoil,
            "COBBLE" => MaterialType::Cobbles,
            "BOULDER" => MaterialType::Boulders,
            other => return Self::ALL.iter().copied().find(|m| m.code() == other),
        };
        Some(m)
    }

    pub fn color(self) -> Rgb {
        match self {
            MaterialType::Topsoil => Rgb([0x5c, 0x40, 0x33]),
            MaterialType::Sand => Rgb([0xed, 0xc9, 0xaf]),
            MaterialType::Gravel => Rgb([0x8c, 0x8c, 0x8c]),
            MaterialType::Clay => Rgb([0xb6, 0x6a, 0x50]),
            MaterialType::Silt => Rgb([0xc2, 0xb2, 0x80]),
            MaterialType::Loam => Rgb([0x7b, 0x5b, 0x3a]),
            MaterialType::Hardpan => Rgb([0x9e, 0x7b, 0x56]),
            MaterialType::Boulders => Rgb([0x6e, 0x6e, 0x6e]),
            MaterialType::Cobbles => Rgb([0xa0, 0xa0, 0x90]),
            MaterialType::Sandstone => Rgb([0xd2, 0xa6, 0x79]),
            MaterialType::Shale => Rgb([0x4a, 0x55, 0x68]),
            MaterialType::Limestone => Rgb([0xe3, 0xdc, 0xc2]),
            MaterialType::Granite => Rgb([0xb5, 0x8b, 0x8b]),
            MaterialType::Basalt => Rgb([0x3b, 0x3b, 0x3b]),
            MaterialType::Bedrock => Rgb([0x55, 0x4e, 0x44]),
            MaterialType::Volcanic => Rgb([0x8b, 0x3a, 0x3a]),
            MaterialType::Na => Rgb([0xff, 0xff, 0xff]),
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 8-bit sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn is_code_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | ',' | ';' | '&' | '+')
}

/// Result of parsing a raw material field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMaterials {
    pub materials: MaterialSet,
    /// Tokens that matched nothing (already upper-cased).
    pub unmapped: Vec<String>,
}

/// Parse a material field that may list several codes (`"SAND/CLAY"`).
///
/// An empty field, or one where no token matched, yields `{NA}`.
pub fn parse_material_field(field: &str) -> ParsedMaterials {
    let mut materials = MaterialSet::new();
    let mut unmapped = Vec::new();
    for token in field.split(is_code_separator).filter(|t| !t.is_empty()) {
        match MaterialType::from_code(token) {
            Some(m) => {
                materials.insert(m);
            }
            None => unmapped.push(token.to_ascii_uppercase()),
        }
    }
    if materials.is_empty() {
        materials.insert(MaterialType::Na);
    }
    ParsedMaterials {
        materials,
        unmapped,
    }
}

/// Display color of a material set.
pub fn color_for(materials: &MaterialSet) -> Rgb {
    materials
        .iter()
        .next()
        .copied()
        .unwrap_or(MaterialType::Na)
        .color()
}

#[cfg(test)]
mod tests {
    use super::{MaterialType, color_for, parse_material_field};

    #[test]
    fn codes_are_trimmed_and_case_insensitive() {
        assert_eq!(MaterialType::from_code("  sand "), Some(MaterialType::Sand));
        assert_eq!(MaterialType::from_code("Rock"), Some(MaterialType::Bedrock));
        assert_eq!(MaterialType::from_code("MUD"), None);
    }

    #[test]
    fn every_code_round_trips() {
        for m in MaterialType::ALL {
            assert_eq!(MaterialType::from_code(m.code()), Some(m));
        }
    }

    #[test]
    fn multi_code_fields_build_a_set() {
        let parsed = parse_material_field("clay / Sand, mud");
        assert_eq!(
            parsed.materials.iter().copied().collect::<Vec<_>>(),
            vec![MaterialType::Sand, MaterialType::Clay]
        );
        assert_eq!(parsed.unmapped, vec!["MUD".to_string()]);
        assert_eq!(color_for(&parsed.materials), MaterialType::Sand.color());
    }

    #[test]
    fn unmatched_fields_degrade_to_na() {
        let parsed = parse_material_field("XYZ");
        assert!(parsed.materials.contains(&MaterialType::Na));
        assert_eq!(parsed.materials.len(), 1);
        assert!(parse_material_field("   ").materials.contains(&MaterialType::Na));
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(MaterialType::Na.color().hex(), "#ffffff");
    }
}
