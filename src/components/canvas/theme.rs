//! Colours and sizes used when drawing the topology.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	/// Opaque colour.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Colour with alpha in `0.0..=1.0`.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// CSS colour string, hex when opaque.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Canvas colours, sizes and fonts.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	pub link: Color,
	pub link_dimmed: Color,
	/// Interface names drawn next to each link end.
	pub interface_label: Color,
	pub node_label: Color,
	/// Dashed line shown while shift-dragging a new link.
	pub preview: Color,
	pub hover_ring: Color,
	pub node_radius: f64,
	pub hit_radius: f64,
	pub label_font: &'static str,
	pub interface_font: &'static str,
	/// Node fill per kind, picked by a stable hash of the kind name.
	pub palette: Vec<Color>,
}

impl Theme {
	/// Palette entry for `kind`, stable across sessions.
	pub fn kind_color(&self, kind: &str) -> Color {
		if self.palette.is_empty() {
			return Color::rgb(128, 128, 128);
		}
		let hash = kind.bytes().fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
		self.palette[hash % self.palette.len()]
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			link: Color::rgba(140, 160, 180, 0.7),
			link_dimmed: Color::rgba(140, 160, 180, 0.25),
			interface_label: Color::rgba(200, 210, 220, 0.85),
			node_label: Color::rgba(255, 255, 255, 0.9),
			preview: Color::rgba(120, 200, 160, 0.9),
			hover_ring: Color::rgba(255, 255, 255, 0.8),
			node_radius: 18.0,
			hit_radius: 22.0,
			label_font: "12px sans-serif",
			interface_font: "10px monospace",
			palette: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(100, 148, 160),
				Color::rgb(180, 136, 100),
				Color::rgb(130, 120, 150),
				Color::rgb(119, 158, 165),
				Color::rgb(170, 130, 95),
				Color::rgb(108, 142, 173),
				Color::rgb(125, 145, 140),
			],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_drops_alpha_when_opaque() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}

	#[test]
	fn kind_color_is_stable() {
		let theme = Theme::default();
		assert_eq!(theme.kind_color("ceos"), theme.kind_color("ceos"));
		let empty = Theme {
			palette: Vec::new(),
			..Theme::default()
		};
		assert_eq!(empty.kind_color("ceos"), Color::rgb(128, 128, 128));
	}
}
