/// Page size and fixed bands, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Band above the bottom margin kept free for the footer.
    pub footer_reserve: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 20.0,
        footer_reserve: 10.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y any content primitive may reach.
    pub fn bottom_bound(&self) -> f32 {
        self.height - self.margin - self.footer_reserve
    }

    /// Vertical room on a fresh page.
    pub fn capacity(&self) -> f32 {
        self.bottom_bound() - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub geometry: PageGeometry,
    /// Max `(width, height)` of the header logo, mm.
    pub logo_box: (f32, f32),
    /// Max `(width, height)` of the agency signature, mm.
    pub signature_box: (f32, f32),
    /// Deflate content streams.
    pub compress: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            logo_box: (40.0, 20.0),
            signature_box: (50.0, 25.0),
            compress: true,
        }
    }
}
