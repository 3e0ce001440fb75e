use crate::sink::Rgb;

pub(crate) const DOC_TITLE_SIZE: f32 = 15.0;
pub(crate) const SECTION_TITLE_SIZE: f32 = 10.5;
pub(crate) const BODY_SIZE: f32 = 9.0;
pub(crate) const SMALL_SIZE: f32 = 8.0;
pub(crate) const FOOTER_SIZE: f32 = 7.0;

pub(crate) const ACCENT: Rgb = Rgb(38, 58, 84);
pub(crate) const TABLE_HEAD_TEXT: Rgb = Rgb(255, 255, 255);
pub(crate) const MUTED: Rgb = Rgb(110, 110, 110);
pub(crate) const RULE_GREY: Rgb = Rgb(200, 200, 200);
pub(crate) const BAND_GREY: Rgb = Rgb(236, 239, 243);
