use serde::{Deserialize, Serialize};

/// Small enough to be sent by value, no blob involved.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MaterialEntry {
    pub name: String,
    pub color: [f32; 4],
    pub emission: f32,
    pub specular: f32,
    pub shininess: f32,
    pub reflectance: f32,
    pub texture: Option<String>,
    pub texrepeat: [f32; 2],
}

impl MaterialEntry {
    /// Stand-in for geometry that only carries a color.
    /// Channels are stored at 8 bits, the same precision the name carries.
    pub fn from_color(rgba: [f32; 4]) -> Self {
        Self {
            name: Self::color_name(rgba),
            color: quantize(rgba).map(|channel| f32::from(channel) / 255.0),
            emission: 0.5,
            specular: 0.5,
            shininess: 0.5,
            reflectance: 0.0,
            texture: None,
            texrepeat: [1.0, 1.0],
        }
    }

    /// `color_rrggbbaa`, so equal colors end up as one material.
    pub fn color_name(rgba: [f32; 4]) -> String {
        let [r, g, b, a] = quantize(rgba);
        format!("color_{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

fn quantize(rgba: [f32; 4]) -> [u8; 4] {
    rgba.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}
